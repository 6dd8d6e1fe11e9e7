//! Deduplicating, content-addressed archive for mobile phone communication backups.
//!
//! This crate implements the import core only: streaming XML ingestion, attachment
//! extraction, contact resolution, per-year partitioning, rejection handling and
//! manifest generation. Command-line parsing, progress UI and logging configuration
//! are the caller's responsibility; see `bin/mobilecombackup.rs` for a minimal harness.

pub mod attachments;
pub mod blob_store;
pub mod coalescer;
pub mod config;
pub mod contacts;
pub mod entities;
pub mod error;
pub mod hash;
pub mod importer;
pub mod orchestrator;
pub mod phone;
pub mod rejection;
pub mod repository;
pub mod summary;
pub mod utils;
pub mod validator;
pub mod xml;

pub mod prelude {
    pub use anyhow::{Context, Result};

    pub use crate::config::{ImportOptions, NullProgressSink, ProgressSink};
    pub use crate::entities::*;
    pub use crate::error::ImportErrorKind;
    pub use crate::orchestrator::Orchestrator;
    pub use crate::summary::ImportSummary;
}

#[cfg(test)]
pub mod test_utils;
