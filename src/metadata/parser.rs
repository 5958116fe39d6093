//! Metadata block parser
//!
//! Grammar (line oriented, a small YAML subset):
//!
//! ```text
//! document  := "---" NL block-line* "---" (NL | EOF) body
//! field     := KEY ":" [SP value]              (column 0)
//! history   := "changelog:" ["[]"] NL entry*
//! entry     := INDENT "- " KEY ":" value NL (INDENT+ KEY ":" value NL | list-item)*
//! list-item := INDENT+ "- " value NL           (only under an empty `changes:`)
//! ```
//!
//! `INDENT` may be empty: entries can start at column 0. Blank lines and
//! `#` comments at any column are allowed anywhere inside the history and
//! are carried along with the entry they follow.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::block::{ChangeEntry, Field, History, HistoryEntry, MetadataBlock, Segment, DATE_FORMAT};
use super::errors::{MetadataError, MetadataResult};
use crate::version::Version;

const DELIMITER: &str = "---";

/// Line number of the first line inside the block (the opening delimiter is line 1)
const FIRST_BLOCK_LINE: usize = 2;

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*):(?:[ \t]+(.*?))?[ \t]*$")
            .expect("key pattern is a valid regex")
    })
}

/// A document split around its metadata block, borrowing from the source text.
///
/// Block lines keep their own terminators.
#[derive(Debug)]
pub(super) struct RawDocument<'a> {
    pub opening: &'a str,
    pub lines: Vec<&'a str>,
    pub closing: &'a str,
    pub body: &'a str,
    /// Terminator of the opening delimiter, used for rendered lines
    pub line_ending: &'static str,
}

/// Locate the delimited block at the top of `text`.
///
/// Returns `None` when the document has no opening delimiter or the block is
/// never closed.
pub(super) fn split_document(text: &str) -> Option<RawDocument<'_>> {
    let opening_len = first_line_len(text);
    if strip_eol(&text[..opening_len]) != DELIMITER || !text[..opening_len].ends_with('\n') {
        return None;
    }

    let rest = &text[opening_len..];
    let mut lines = Vec::new();
    let mut offset = 0;

    while offset < rest.len() {
        let len = first_line_len(&rest[offset..]);
        let line = &rest[offset..offset + len];

        if strip_eol(line) == DELIMITER {
            let opening = &text[..opening_len];
            return Some(RawDocument {
                opening,
                lines,
                closing: line,
                body: &rest[offset + len..],
                line_ending: if opening.ends_with("\r\n") { "\r\n" } else { "\n" },
            });
        }

        lines.push(line);
        offset += len;
    }

    None
}

/// Length of the first line including its `\n`, if any.
fn first_line_len(s: &str) -> usize {
    s.find('\n').map(|i| i + 1).unwrap_or(s.len())
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

/// Split `key: value` into its parts.
fn key_value(content: &str) -> Option<(&str, &str)> {
    let caps = key_pattern().captures(content)?;
    let key = caps.get(1)?.as_str();
    let value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    Some((key, value))
}

/// Read a scalar value: double-quoted (JSON escapes), single-quoted or bare.
fn scalar(value: &str) -> Option<String> {
    let v = value.trim();
    if v.starts_with('"') {
        serde_json::from_str::<String>(v).ok()
    } else if let Some(inner) = v.strip_prefix('\'') {
        inner.strip_suffix('\'').map(|s| s.replace("''", "'"))
    } else {
        let bare = v.split(" #").next().unwrap_or("").trim();
        Some(bare.to_string())
    }
}

fn parse_version(line: usize, value: &str) -> MetadataResult<Version> {
    let text = scalar(value)
        .ok_or_else(|| MetadataError::malformed(line, "unreadable 'version' value"))?;
    Version::parse(&text).map_err(|e| MetadataError::malformed(line, e.to_string()))
}

fn parse_date(line: usize, key: &str, value: &str) -> MetadataResult<NaiveDate> {
    let text = scalar(value)
        .ok_or_else(|| MetadataError::malformed(line, format!("unreadable '{}' value", key)))?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|_| {
        MetadataError::malformed(line, format!("'{}' is not a YYYY-MM-DD date: '{}'", key, text))
    })
}

fn is_top_level(content: &str) -> bool {
    content
        .chars()
        .next()
        .map_or(false, |c| !c.is_whitespace())
}

/// Parse the lines between the delimiters.
pub(super) fn parse_block(lines: &[&str]) -> MetadataResult<MetadataBlock> {
    let line_no = |i: usize| FIRST_BLOCK_LINE + i;
    let mut segments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        let content = strip_eol(raw);
        let field = if is_top_level(content) && !content.starts_with('#') {
            key_value(content)
        } else {
            None
        };

        match field {
            Some(("version", value)) => {
                if segments.iter().any(|s| matches!(s, Segment::Version(_))) {
                    return Err(MetadataError::malformed(line_no(i), "duplicate 'version' field"));
                }
                segments.push(Segment::Version(Field {
                    value: parse_version(line_no(i), value)?,
                    raw: Some(raw.to_string()),
                }));
                i += 1;
            }
            Some(("last_updated", value)) => {
                if segments.iter().any(|s| matches!(s, Segment::LastUpdated(_))) {
                    return Err(MetadataError::malformed(
                        line_no(i),
                        "duplicate 'last_updated' field",
                    ));
                }
                segments.push(Segment::LastUpdated(Field {
                    value: parse_date(line_no(i), "last_updated", value)?,
                    raw: Some(raw.to_string()),
                }));
                i += 1;
            }
            Some(("changelog", value)) => {
                if segments.iter().any(|s| matches!(s, Segment::History(_))) {
                    return Err(MetadataError::malformed(line_no(i), "duplicate 'changelog' field"));
                }
                let (history, consumed) = parse_history(lines, i, value)?;
                segments.push(Segment::History(history));
                i += consumed;
            }
            _ => {
                segments.push(Segment::Opaque(raw.to_string()));
                i += 1;
            }
        }
    }

    if !segments.iter().any(|s| matches!(s, Segment::Version(_))) {
        return Err(MetadataError::malformed(1, "missing 'version' field"));
    }

    Ok(MetadataBlock { segments })
}

/// Parse the history starting at the `changelog:` line `start`.
///
/// Returns the history and the number of lines consumed, header included.
fn parse_history(lines: &[&str], start: usize, header_value: &str) -> MetadataResult<(History, usize)> {
    let line_no = |i: usize| FIRST_BLOCK_LINE + i;

    let inline = header_value.trim();
    let inline_empty = inline == "[]";
    if !inline.is_empty() && !inline_empty {
        return Err(MetadataError::malformed(
            line_no(start),
            "'changelog' must be a block list or []",
        ));
    }

    let mut preamble = Vec::new();
    let mut entries = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut indent: Option<usize> = None;
    let mut j = start + 1;

    while j < lines.len() {
        let raw = lines[j];
        let content = strip_eol(raw);
        let trimmed = content.trim_start();

        // Column-0 `- ` items (compact sequences) and `#` comments stay in the
        // history; any other top-level line ends it.
        if is_top_level(content) && list_item(trimmed).is_none() && !trimmed.starts_with('#') {
            break;
        }

        let leading = &content[..content.len() - trimmed.len()];
        if leading.contains('\t') {
            return Err(MetadataError::malformed(line_no(j), "tab used for indentation"));
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            match current.as_mut() {
                Some(entry) => entry.raw.push(raw.to_string()),
                None => preamble.push(raw.to_string()),
            }
            j += 1;
            continue;
        }

        if inline_empty {
            return Err(MetadataError::malformed(
                line_no(j),
                "entries below an inline empty 'changelog'",
            ));
        }

        let col = leading.len();
        let item = list_item(trimmed);

        current = match (current.take(), item) {
            (None, Some(rest)) => {
                indent = Some(col);
                Some(EntryBuilder::start(line_no(j), col, raw, rest)?)
            }
            (None, None) => {
                return Err(MetadataError::malformed(
                    line_no(j),
                    "expected a '- version: ...' history entry",
                ))
            }
            (Some(entry), Some(rest)) if col == entry.indent => {
                entries.push(entry.finish()?);
                Some(EntryBuilder::start(line_no(j), col, raw, rest)?)
            }
            (Some(mut entry), Some(rest)) if col > entry.indent => {
                entry.push_list_item(line_no(j), rest)?;
                entry.raw.push(raw.to_string());
                Some(entry)
            }
            (Some(mut entry), None) if col > entry.indent => {
                let (key, value) = key_value(trimmed).ok_or_else(|| {
                    MetadataError::malformed(line_no(j), "expected 'key: value' in history entry")
                })?;
                entry.push_key(line_no(j), key, value)?;
                entry.raw.push(raw.to_string());
                Some(entry)
            }
            (Some(_), _) => {
                return Err(MetadataError::malformed(
                    line_no(j),
                    "inconsistent indentation in history",
                ))
            }
        };

        j += 1;
    }

    if let Some(entry) = current {
        entries.push(entry.finish()?);
    }

    Ok((
        History {
            header: Some(lines[start].to_string()),
            preamble,
            entries,
            indent: indent.unwrap_or(2),
        },
        j - start,
    ))
}

/// `- rest` or a lone `-`
fn list_item(trimmed: &str) -> Option<&str> {
    if trimmed == "-" {
        Some("")
    } else {
        trimmed.strip_prefix("- ")
    }
}

struct EntryBuilder {
    line: usize,
    indent: usize,
    raw: Vec<String>,
    seen: Vec<String>,
    open_list: Option<String>,
    version: Option<Version>,
    date: Option<NaiveDate>,
    changes: Option<Vec<String>>,
}

impl EntryBuilder {
    fn start(line: usize, indent: usize, raw: &str, rest: &str) -> MetadataResult<Self> {
        let mut entry = Self {
            line,
            indent,
            raw: vec![raw.to_string()],
            seen: Vec::new(),
            open_list: None,
            version: None,
            date: None,
            changes: None,
        };

        let (key, value) = key_value(rest.trim()).ok_or_else(|| {
            MetadataError::malformed(line, "expected 'key: value' after '-'")
        })?;
        entry.push_key(line, key, value)?;
        Ok(entry)
    }

    fn push_key(&mut self, line: usize, key: &str, value: &str) -> MetadataResult<()> {
        if self.seen.iter().any(|k| k == key) {
            return Err(MetadataError::malformed(
                line,
                format!("duplicate '{}' in history entry", key),
            ));
        }
        self.seen.push(key.to_string());
        self.open_list = None;

        let value = value.trim();
        match key {
            "version" => self.version = Some(parse_version(line, value)?),
            "date" => self.date = Some(parse_date(line, "date", value)?),
            "changes" if value.is_empty() => {
                self.changes = Some(Vec::new());
                self.open_list = Some(key.to_string());
            }
            "changes" => {
                if !value.starts_with('[') {
                    return Err(MetadataError::malformed(line, "'changes' must be a list"));
                }
                let list: Vec<String> = serde_json::from_str(value).map_err(|e| {
                    MetadataError::malformed(line, format!("'changes' is not a list of strings: {}", e))
                })?;
                self.changes = Some(list);
            }
            // Unknown keys are kept in the source lines and otherwise ignored.
            _ if value.is_empty() => self.open_list = Some(key.to_string()),
            _ => {}
        }

        Ok(())
    }

    fn push_list_item(&mut self, line: usize, rest: &str) -> MetadataResult<()> {
        match self.open_list.as_deref() {
            Some("changes") => {
                let item = scalar(rest)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| MetadataError::malformed(line, "empty or unreadable change item"))?;
                if let Some(changes) = self.changes.as_mut() {
                    changes.push(item);
                }
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(MetadataError::malformed(line, "unexpected list item in history entry")),
        }
    }

    fn finish(self) -> MetadataResult<HistoryEntry> {
        let missing = |key: &str| {
            MetadataError::malformed(self.line, format!("history entry missing '{}'", key))
        };

        let version = self.version.ok_or_else(|| missing("version"))?;
        let date = self.date.ok_or_else(|| missing("date"))?;
        let changes = self.changes.clone().ok_or_else(|| missing("changes"))?;

        Ok(HistoryEntry {
            entry: ChangeEntry::new(version, date, changes),
            raw: Some(self.raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> MetadataResult<MetadataBlock> {
        let doc = split_document(text).expect("document has a block");
        parse_block(&doc.lines)
    }

    #[test]
    fn test_split_requires_opening_delimiter() {
        assert!(split_document("# Title\n---\nversion: 1.0.0\n---\n").is_none());
        assert!(split_document("").is_none());
        assert!(split_document("---").is_none());
    }

    #[test]
    fn test_split_requires_closing_delimiter() {
        assert!(split_document("---\nversion: 1.0.0\n# Title\n").is_none());
    }

    #[test]
    fn test_split_parts() {
        let text = "---\na: 1\nb: 2\n---\n# Body\n";
        let doc = split_document(text).unwrap();
        assert_eq!(doc.opening, "---\n");
        assert_eq!(doc.lines, vec!["a: 1\n", "b: 2\n"]);
        assert_eq!(doc.closing, "---\n");
        assert_eq!(doc.body, "# Body\n");
        assert_eq!(doc.line_ending, "\n");
    }

    #[test]
    fn test_split_closing_at_eof() {
        let doc = split_document("---\na: 1\n---").unwrap();
        assert_eq!(doc.closing, "---");
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_scalar_forms() {
        assert_eq!(scalar("\"1.0.0\"").as_deref(), Some("1.0.0"));
        assert_eq!(scalar("'1.0.0'").as_deref(), Some("1.0.0"));
        assert_eq!(scalar("1.0.0").as_deref(), Some("1.0.0"));
        assert_eq!(scalar("1.0.0 # current").as_deref(), Some("1.0.0"));
        assert_eq!(scalar("'it''s'").as_deref(), Some("it's"));
        assert_eq!(scalar("\"unterminated"), None);
    }

    #[test]
    fn test_parse_full_history() {
        let block = parse(
            "---\n\
             title: Architecture\n\
             version: \"1.1.0\"\n\
             last_updated: \"2024-02-01\"\n\
             changelog:\n  \
               - version: \"1.1.0\"\n    \
                 date: \"2024-02-01\"\n    \
                 changes: [\"add cache\", \"fix typo\"]\n  \
               - version: \"1.0.0\"\n    \
                 date: \"2024-01-15\"\n    \
                 changes:\n      \
                   - Initial release\n\
             ---\n",
        )
        .unwrap();

        assert_eq!(block.version(), Version::new(1, 1, 0));
        let history: Vec<_> = block.history().collect();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].changes, vec!["add cache", "fix typo"]);
        assert_eq!(history[1].version, Version::new(1, 0, 0));
        assert_eq!(history[1].changes, vec!["Initial release"]);
    }

    #[test]
    fn test_parse_inline_empty_history() {
        let block = parse("---\nversion: 1.0.0\nchangelog: []\n---\n").unwrap();
        assert_eq!(block.history().count(), 0);
    }

    #[test]
    fn test_unknown_entry_keys_are_ignored() {
        let block = parse(
            "---\nversion: 1.0.0\nchangelog:\n  - version: 1.0.0\n    author: ann\n    date: 2024-01-15\n    changes: []\n---\n",
        )
        .unwrap();
        assert_eq!(block.history().count(), 1);
    }

    #[test]
    fn test_missing_version_is_malformed() {
        let err = parse("---\ntitle: x\n---\n").unwrap_err();
        assert_eq!(err, MetadataError::malformed(1, "missing 'version' field"));
    }

    #[test]
    fn test_bad_version_reports_line() {
        let err = parse("---\ntitle: x\nversion: 1.0\n---\n").unwrap_err();
        assert!(matches!(err, MetadataError::MalformedBlock { line: 3, .. }));
    }

    #[test]
    fn test_corrupt_changes_list() {
        let err = parse(
            "---\nversion: 1.0.0\nchangelog:\n  - version: 1.0.0\n    date: 2024-01-15\n    changes: [\"open\n---\n",
        )
        .unwrap_err();
        assert!(matches!(err, MetadataError::MalformedBlock { line: 6, .. }));
    }

    #[test]
    fn test_entry_missing_date() {
        let err = parse(
            "---\nversion: 1.0.0\nchangelog:\n  - version: 1.0.0\n    changes: []\n---\n",
        )
        .unwrap_err();
        assert_eq!(err, MetadataError::malformed(4, "history entry missing 'date'"));
    }

    #[test]
    fn test_history_must_start_with_entry() {
        let err = parse("---\nversion: 1.0.0\nchangelog:\n    date: 2024-01-15\n---\n").unwrap_err();
        assert!(matches!(err, MetadataError::MalformedBlock { line: 4, .. }));
    }

    #[test]
    fn test_history_inconsistent_indentation() {
        let err = parse(
            "---\nversion: 1.0.0\nchangelog:\n    - version: 1.0.0\n      date: 2024-01-15\n      changes: []\n  - version: 0.9.0\n---\n",
        )
        .unwrap_err();
        assert!(matches!(err, MetadataError::MalformedBlock { line: 7, .. }));
    }

    #[test]
    fn test_history_ends_at_next_top_level_field() {
        let block = parse(
            "---\nversion: 1.0.0\nchangelog:\n  - version: 1.0.0\n    date: 2024-01-15\n    changes: []\nstatus: active\n---\n",
        )
        .unwrap();
        assert_eq!(block.history().count(), 1);
        assert!(matches!(block.segments.last(), Some(Segment::Opaque(s)) if s == "status: active\n"));
    }

    #[test]
    fn test_bad_date() {
        let err = parse("---\nversion: 1.0.0\nlast_updated: yesterday\n---\n").unwrap_err();
        assert!(matches!(err, MetadataError::MalformedBlock { line: 3, .. }));
    }

    #[test]
    fn test_split_detects_crlf() {
        let doc = split_document("---\r\na: 1\r\n---\r\n").unwrap();
        assert_eq!(doc.line_ending, "\r\n");
        assert_eq!(doc.lines, vec!["a: 1\r\n"]);
    }

    #[test]
    fn test_history_entries_at_column_zero() {
        let block = parse(
            "---\nversion: 1.1.0\nchangelog:\n- version: 1.1.0\n  date: 2024-02-01\n  changes:\n  - add cache\n- version: 1.0.0\n  date: 2024-01-15\n  changes: [\"Initial\"]\nstatus: active\n---\n",
        )
        .unwrap();

        let history: Vec<_> = block.history().collect();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].changes, vec!["add cache"]);
        assert_eq!(history[1].version, Version::new(1, 0, 0));
        assert!(matches!(block.segments.last(), Some(Segment::Opaque(s)) if s == "status: active\n"));
    }

    #[test]
    fn test_column_zero_comment_stays_in_history() {
        let block = parse(
            "---\nversion: 1.1.0\nchangelog:\n  - version: 1.1.0\n    date: 2024-02-01\n    changes: []\n# older releases\n  - version: 1.0.0\n    date: 2024-01-15\n    changes: []\n---\n",
        )
        .unwrap();
        assert_eq!(block.history().count(), 2);
    }

    #[test]
    fn test_column_zero_item_below_indented_history_is_malformed() {
        let err = parse(
            "---\nversion: 1.1.0\nchangelog:\n  - version: 1.1.0\n    date: 2024-02-01\n    changes: []\n- version: 1.0.0\n  date: 2024-01-15\n  changes: []\n---\n",
        )
        .unwrap_err();
        assert!(matches!(err, MetadataError::MalformedBlock { line: 7, .. }));
    }
}
