//! The error taxonomy from the design doc, kept as a matchable enum and carried as
//! `anyhow::Error` context so call sites keep using `?` the way the rest of the
//! crate does (see `crate::prelude::Result`).

use std::fmt;
use std::path::PathBuf;

/// The six error kinds the import core distinguishes. Not every `anyhow::Error`
/// produced by this crate carries one of these -- only the ones a caller might
/// reasonably want to match on (e.g. to pick an exit code) do.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportErrorKind {
    /// A record violates a structural rule from the validator (§4.5).
    #[error("validation failed for {operation} ({identifier}): {detail}")]
    Validation {
        operation: &'static str,
        identifier: String,
        detail: String,
    },

    /// XML malformed, or a size limit was exceeded before EOF.
    #[error("parse error in {path:?} at {context}: {detail}")]
    Parsing {
        path: PathBuf,
        context: String,
        detail: String,
    },

    /// Attachment base64 decode or blob store write failed.
    #[error("processing error for {operation} ({identifier}): {detail}")]
    Processing {
        operation: &'static str,
        identifier: String,
        detail: String,
    },

    /// Non-recoverable I/O on a write path.
    #[error("filesystem error during {operation} on {path:?}: {detail}")]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        detail: String,
    },

    /// Bad options or a nonexistent source path, caught before any work starts.
    #[error("configuration error: {detail}")]
    Configuration { detail: String },

    /// A stored blob's content hash did not match its filename on `verify`.
    #[error("integrity violation: {path:?} hashes to {actual_hash}, expected {expected_hash}")]
    Integrity {
        path: PathBuf,
        expected_hash: String,
        actual_hash: String,
    },
}

impl ImportErrorKind {
    /// The orchestrator exit-code convention from §6: validation failures are
    /// distinct from configuration/fatal errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            ImportErrorKind::Validation { .. } => 1,
            ImportErrorKind::Configuration { .. } => 2,
            ImportErrorKind::Integrity { .. } => 2,
            ImportErrorKind::Parsing { .. }
            | ImportErrorKind::Processing { .. }
            | ImportErrorKind::Filesystem { .. } => 3,
        }
    }
}

/// A violation or warning surfaced by the repository validator (§4.14). Distinct
/// from `ImportErrorKind` because a `ValidationReport` accumulates many of these
/// rather than aborting on the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub detail: String,
}

impl Violation {
    pub fn new(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Violation { path: path.into(), detail: detail.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.detail)
    }
}
