//! Observability for docver
//!
//! Structured JSON-lines logging to stderr. Every skipped or failed unit of
//! work (a document, an archive source) produces exactly one log event in
//! addition to the human-readable command output.
//!
//! # Usage
//!
//! ```ignore
//! use docver::observability::Logger;
//!
//! Logger::warn("DOC_SKIPPED", &[("doc", "features"), ("reason", "no metadata block")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
