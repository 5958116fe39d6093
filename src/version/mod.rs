//! Three-part version identifiers
//!
//! A version is an ordered `(major, minor, patch)` triple with the canonical
//! text form `MAJOR.MINOR.PATCH`. Nothing else parses: no prefixes, no
//! whitespace, no pre-release tags, no leading zeros.
//!
//! Ordering is lexicographic over the three components, so `BTreeMap<Version, _>`
//! iterates oldest first and `.rev()` gives the "newest first" presentation
//! used by the changelog.

mod errors;

pub use errors::{VersionError, VersionResult};

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)$")
            .expect("version pattern is a valid regex")
    })
}

/// A `major.minor.patch` version identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the canonical `MAJOR.MINOR.PATCH` form.
    pub fn parse(s: &str) -> VersionResult<Self> {
        let malformed = || VersionError::MalformedVersion(s.to_string());

        let caps = version_pattern().captures(s).ok_or_else(malformed)?;
        let component = |i: usize| -> VersionResult<u64> {
            caps[i].parse::<u64>().map_err(|_| malformed())
        };

        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }

    /// Return the next version for the given bump kind.
    ///
    /// Major zeroes minor and patch, minor zeroes patch. Fails with
    /// `Overflow` when the advanced component is already at its maximum.
    pub fn increment(&self, kind: BumpKind) -> VersionResult<Self> {
        let overflow = || VersionError::Overflow {
            version: self.to_string(),
            kind: kind.to_string(),
        };

        let next = match kind {
            BumpKind::Major => Self::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            BumpKind::Minor => Self::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0),
            BumpKind::Patch => Self::new(self.major, self.minor, self.patch.checked_add(1).ok_or_else(overflow)?),
        };
        Ok(next)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

/// Which component a bump advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl BumpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(BumpKind::Major),
            "minor" => Ok(BumpKind::Minor),
            "patch" => Ok(BumpKind::Patch),
            other => Err(VersionError::InvalidBumpKind(other.to_string())),
        }
    }
}
