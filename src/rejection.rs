//! Rejection sink (§4.9): lazily materializes `rejected/`, `rejected/calls/`,
//! `rejected/sms/` on the first rejection of an import process, then writes
//! one re-importable XML document per source file that had any rejections.

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::Result;
use chrono::Local;

use crate::entities::{Call, Message};
use crate::hash::Hash;
use crate::xml::{calls, sms};

/// Guards directory creation so concurrent first-rejection callers (a future
/// parallelized revision, §5) create the layout exactly once.
pub struct RejectionWriter {
    root: PathBuf,
    init: Once,
}

impl RejectionWriter {
    pub fn new(repo_root: impl AsRef<Path>) -> Self {
        RejectionWriter { root: repo_root.as_ref().join("rejected"), init: Once::new() }
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        let mut result = Ok(());
        self.init.call_once(|| {
            result = (|| {
                std::fs::create_dir_all(self.root.join("calls"))?;
                std::fs::create_dir_all(self.root.join("sms"))?;
                Ok(())
            })();
        });
        result
    }

    /// `<stem>-<hash8>-<timestamp>.xml` naming (§4.9): `hash8` is the first
    /// eight hex characters of `source_file_hash`, `timestamp` is local
    /// `YYYYMMDD-HHMMSS`.
    fn rejection_file_name(source_stem: &str, source_file_hash: &Hash) -> String {
        let hash8 = &source_file_hash.as_hex()[..8];
        let timestamp = Local::now().format("%Y%m%d-%H%M%S");
        format!("{source_stem}-{hash8}-{timestamp}.xml")
    }

    /// Writes the rejected calls for one source file, returning the path
    /// written. No-op (returns `Ok(None)`) if `rejected` is empty.
    pub fn write_calls(&self, source_stem: &str, source_file_hash: &Hash, rejected: &[Call]) -> Result<Option<PathBuf>> {
        if rejected.is_empty() {
            return Ok(None);
        }
        self.ensure_dirs()?;
        let name = Self::rejection_file_name(source_stem, source_file_hash);
        let path = self.root.join("calls").join(name);
        calls::write_calls_file(&path, rejected)?;
        Ok(Some(path))
    }

    /// Writes the rejected messages for one source file, returning the path
    /// written. No-op (returns `Ok(None)`) if `rejected` is empty.
    pub fn write_messages(&self, source_stem: &str, source_file_hash: &Hash, rejected: &[Message]) -> Result<Option<PathBuf>> {
        if rejected.is_empty() {
            return Ok(None);
        }
        self.ensure_dirs()?;
        let name = Self::rejection_file_name(source_stem, source_file_hash);
        let path = self.root.join("sms").join(name);
        sms::write_messages_file(&path, rejected)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
#[path = "rejection_tests.rs"]
mod tests;
