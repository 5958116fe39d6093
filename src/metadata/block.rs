//! Typed in-memory metadata block
//!
//! A block is an ordered list of segments. Recognized fields are typed,
//! everything else is kept as opaque source text. Every segment remembers
//! the exact lines it was parsed from; a segment is rendered from those
//! lines until it is modified, after which it is rendered canonically.

use chrono::NaiveDate;

use crate::version::Version;

/// Date format used for every date inside a block
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One versioned record in a document's change history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub version: Version,
    pub date: NaiveDate,
    pub changes: Vec<String>,
}

impl ChangeEntry {
    pub fn new(version: Version, date: NaiveDate, changes: Vec<String>) -> Self {
        Self {
            version,
            date,
            changes,
        }
    }
}

/// A scalar field and the source line it came from, terminator included.
///
/// `raw` is cleared when the value changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Field<T> {
    pub value: T,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct HistoryEntry {
    pub entry: ChangeEntry,
    pub raw: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct History {
    /// Source `changelog:` line; `None` renders the canonical header.
    pub header: Option<String>,
    /// Blank or comment lines between the header and the first entry
    pub preamble: Vec<String>,
    pub entries: Vec<HistoryEntry>,
    /// Column of the `-` that opens each entry
    pub indent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Segment {
    Version(Field<Version>),
    LastUpdated(Field<NaiveDate>),
    History(History),
    Opaque(String),
}

/// The metadata block at the top of a tracked document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    pub(super) segments: Vec<Segment>,
}

impl MetadataBlock {
    /// The document's own version.
    pub fn version(&self) -> Version {
        self.segments
            .iter()
            .find_map(|s| match s {
                Segment::Version(f) => Some(f.value),
                _ => None,
            })
            // The parser refuses blocks without a version field.
            .unwrap_or(Version::new(0, 0, 0))
    }

    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.segments.iter().find_map(|s| match s {
            Segment::LastUpdated(f) => Some(f.value),
            _ => None,
        })
    }

    /// Change history in stored order (newest first by convention).
    pub fn history(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::History(h) => Some(h.entries.iter().map(|e| &e.entry)),
                _ => None,
            })
            .flatten()
    }

    pub fn set_version(&mut self, version: Version) {
        for segment in &mut self.segments {
            if let Segment::Version(f) = segment {
                if f.value != version || f.raw.is_none() {
                    f.value = version;
                    f.raw = None;
                }
                return;
            }
        }
        self.segments.insert(
            0,
            Segment::Version(Field {
                value: version,
                raw: None,
            }),
        );
    }

    /// Set the last-updated date, inserting the field after `version` if absent.
    pub fn set_last_updated(&mut self, date: NaiveDate) {
        for segment in &mut self.segments {
            if let Segment::LastUpdated(f) = segment {
                if f.value != date {
                    f.value = date;
                    f.raw = None;
                }
                return;
            }
        }

        let at = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Version(_)))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.segments.insert(
            at,
            Segment::LastUpdated(Field {
                value: date,
                raw: None,
            }),
        );
    }

    /// Insert an entry at the head of the history, creating the history if needed.
    pub fn prepend_entry(&mut self, entry: ChangeEntry) {
        let new = HistoryEntry { entry, raw: None };

        for segment in &mut self.segments {
            if let Segment::History(h) = segment {
                if h.entries.is_empty() {
                    // `changelog: []` cannot carry entries below it.
                    h.header = None;
                }
                h.entries.insert(0, new);
                return;
            }
        }

        self.segments.push(Segment::History(History {
            header: None,
            preamble: Vec::new(),
            entries: vec![new],
            indent: 2,
        }));
    }

    /// Update version and date and record the change entry.
    pub fn apply_bump(&mut self, version: Version, changes: Vec<String>, date: NaiveDate) {
        self.set_version(version);
        self.set_last_updated(date);
        self.prepend_entry(ChangeEntry::new(version, date, changes));
    }
}
