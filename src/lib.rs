//! docver - documentation version and changelog manager
//!
//! Keeps the version embedded in every tracked document's front-matter block
//! in step with the project version held by the registry, merges per-document
//! change histories into one changelog and produces immutable archives of the
//! documentation tree.

pub mod archive;
pub mod changelog;
pub mod cli;
pub mod durable;
pub mod metadata;
pub mod observability;
pub mod recorder;
pub mod registry;
pub mod version;
