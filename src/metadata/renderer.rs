//! Metadata block renderer
//!
//! Segments that still carry their source lines are emitted verbatim,
//! terminators included. Modified or new segments are emitted in canonical
//! form, ending with the document's line ending:
//!
//! ```text
//! version: "1.1.0"
//! last_updated: "2026-10-18"
//! changelog:
//!   - version: "1.1.0"
//!     date: "2026-10-18"
//!     changes: ["add caching layer"]
//! ```

use serde_json::Value;

use super::block::{ChangeEntry, MetadataBlock, Segment, DATE_FORMAT};

/// Render the lines between the delimiters, each with its terminator.
pub(super) fn render_lines(block: &MetadataBlock, eol: &str) -> Vec<String> {
    let mut out = Vec::new();

    for segment in &block.segments {
        match segment {
            Segment::Version(f) => out.push(
                f.raw
                    .clone()
                    .unwrap_or_else(|| format!("version: \"{}\"{}", f.value, eol)),
            ),
            Segment::LastUpdated(f) => out.push(
                f.raw
                    .clone()
                    .unwrap_or_else(|| format!("last_updated: \"{}\"{}", f.value.format(DATE_FORMAT), eol)),
            ),
            Segment::History(h) => {
                out.push(h.header.clone().unwrap_or_else(|| format!("changelog:{}", eol)));
                out.extend(h.preamble.iter().cloned());
                for item in &h.entries {
                    match &item.raw {
                        Some(raw) => out.extend(raw.iter().cloned()),
                        None => out.extend(canonical_entry(&item.entry, h.indent, eol)),
                    }
                }
            }
            Segment::Opaque(line) => out.push(line.clone()),
        }
    }

    out
}

fn canonical_entry(entry: &ChangeEntry, indent: usize, eol: &str) -> Vec<String> {
    let pad = " ".repeat(indent);
    let changes = Value::from(entry.changes.clone());

    vec![
        format!("{}- version: \"{}\"{}", pad, entry.version, eol),
        format!("{}  date: \"{}\"{}", pad, entry.date.format(DATE_FORMAT), eol),
        format!("{}  changes: {}{}", pad, changes, eol),
    ]
}
