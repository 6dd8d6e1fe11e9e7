//! Small helpers shared across modules: atomic file writes and path-to-string
//! conversions. Every artifact the repository writer and rejection writer
//! produce goes through `atomic_write` so "no partial writes visible" (§1)
//! holds for every file, not just blobs.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::ImportErrorKind;

/// Writes `contents` to `path` via a temporary file in the same directory,
/// fsynced, then renamed into place.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| ImportErrorKind::Filesystem {
        operation: "atomic_write",
        path: dir.to_path_buf(),
        detail: "failed to create parent directory".to_owned(),
    })?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)
        .with_context(|| ImportErrorKind::Filesystem {
            operation: "atomic_write",
            path: path.to_path_buf(),
            detail: "failed to create temporary file".to_owned(),
        })?;
    tmp.write_all(contents).with_context(|| ImportErrorKind::Filesystem {
        operation: "atomic_write",
        path: path.to_path_buf(),
        detail: "failed to write contents".to_owned(),
    })?;
    tmp.as_file().sync_all().with_context(|| ImportErrorKind::Filesystem {
        operation: "atomic_write",
        path: path.to_path_buf(),
        detail: "failed to fsync".to_owned(),
    })?;
    tmp.persist(path).map_err(|e| e.error).with_context(|| ImportErrorKind::Filesystem {
        operation: "atomic_write",
        path: path.to_path_buf(),
        detail: "failed to rename into place".to_owned(),
    })?;
    Ok(())
}

/// Forward-slash separated, as required for `files.yaml` entries and
/// attachment `path` attributes regardless of host platform.
pub fn to_forward_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn sha256_file(path: &Path) -> Result<crate::hash::Hash> {
    let bytes = fs::read(path).with_context(|| ImportErrorKind::Filesystem {
        operation: "sha256_file",
        path: path.to_path_buf(),
        detail: "failed to read file for hashing".to_owned(),
    })?;
    Ok(crate::hash::Hash::of_bytes(&bytes))
}

#[cfg(test)]
#[path = "utils_tests.rs"]
mod tests;
