//! Metadata block codec
//!
//! Every tracked document starts with a delimited metadata block:
//!
//! ```text
//! ---
//! title: Architecture
//! version: "1.0.0"
//! last_updated: "2024-01-15"
//! changelog:
//!   - version: "1.0.0"
//!     date: "2024-01-15"
//!     changes: ["Initial release"]
//! ---
//! # Architecture
//! ...
//! ```
//!
//! The codec parses the block into a typed [`MetadataBlock`] and renders it
//! back. Only fields that were changed are re-rendered; unrecognized fields,
//! prior history entries and everything below the block come out exactly as
//! they went in.
//!
//! A document without a block is [`MetadataError::NotFound`]: callers treat
//! it as untracked. A block that exists but has the wrong shape is
//! [`MetadataError::MalformedBlock`], and the document text is never touched.

mod block;
mod errors;
mod parser;
mod renderer;

pub use block::{ChangeEntry, MetadataBlock, DATE_FORMAT};
pub use errors::{MetadataError, MetadataResult};

use chrono::NaiveDate;

use crate::version::Version;

/// A document split into its metadata block and the untouched remainder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatterDocument {
    opening: String,
    block: MetadataBlock,
    closing: String,
    body: String,
    line_ending: &'static str,
}

impl FrontMatterDocument {
    /// Parse a document.
    ///
    /// Returns `Ok(None)` when the document carries no block.
    pub fn parse(text: &str) -> MetadataResult<Option<Self>> {
        let raw = match parser::split_document(text) {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let block = parser::parse_block(&raw.lines)?;

        Ok(Some(Self {
            opening: raw.opening.to_string(),
            block,
            closing: raw.closing.to_string(),
            body: raw.body.to_string(),
            line_ending: raw.line_ending,
        }))
    }

    pub fn block(&self) -> &MetadataBlock {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut MetadataBlock {
        &mut self.block
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Serialize the document back to text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(&self.opening);
        for line in renderer::render_lines(&self.block, self.line_ending) {
            out.push_str(&line);
        }
        out.push_str(&self.closing);
        out.push_str(&self.body);
        out
    }
}

/// Read the metadata block of a document, `Ok(None)` if it has none.
pub fn read(text: &str) -> MetadataResult<Option<MetadataBlock>> {
    Ok(FrontMatterDocument::parse(text)?.map(|doc| doc.block))
}

/// Rewrite a document for a version bump.
///
/// Sets the block's version and last-updated date and prepends a new history
/// entry. Fails with `NotFound` or `MalformedBlock` without producing output.
pub fn apply_version_bump(
    text: &str,
    new_version: Version,
    changes: &[String],
    date: NaiveDate,
) -> MetadataResult<String> {
    let mut doc = FrontMatterDocument::parse(text)?.ok_or(MetadataError::NotFound)?;
    doc.block_mut().apply_bump(new_version, changes.to_vec(), date);
    Ok(doc.render())
}
