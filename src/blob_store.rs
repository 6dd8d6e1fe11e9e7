//! Hash-addressed blob store (§4.1). Append-only content store for binary
//! attachments, keyed by hex SHA-256 with two-character prefix sharding:
//! `attachments/<first-two-hex-chars>/<full-hex-hash>`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::ImportErrorKind;
use crate::hash::Hash;

const ATTACHMENTS_DIR: &str = "attachments";

/// A content-addressed blob store rooted at `<repo_root>/attachments`.
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(repo_root: impl AsRef<Path>) -> Self {
        BlobStore { root: repo_root.as_ref().join(ATTACHMENTS_DIR) }
    }

    /// Deterministic path for a hash -- never a lookup, just string construction.
    pub fn path_for(&self, hash: &Hash) -> PathBuf {
        self.root.join(hash.shard_prefix()).join(hash.as_hex())
    }

    /// Path relative to the repository root, as stored in an MMS part's `path`
    /// attribute: `attachments/<xx>/<hash>`.
    pub fn relative_path_for(hash: &Hash) -> String {
        format!("{}/{}/{}", ATTACHMENTS_DIR, hash.shard_prefix(), hash.as_hex())
    }

    pub fn exists(&self, hash: &Hash) -> bool {
        self.path_for(hash).is_file()
    }

    /// Stores `bytes` under `hash`. Idempotent: if the target already exists the
    /// write is skipped entirely. The write itself goes to a unique temporary file
    /// in the same shard directory, is fsynced, then renamed into place so a
    /// concurrent reader never observes a partial blob.
    pub fn store(&self, hash: &Hash, bytes: &[u8]) -> Result<()> {
        if self.exists(hash) {
            return Ok(());
        }
        let shard_dir = self.root.join(hash.shard_prefix());
        fs::create_dir_all(&shard_dir).with_context(|| {
            ImportErrorKind::Filesystem {
                operation: "blob_store::store",
                path: shard_dir.clone(),
                detail: "failed to create shard directory".to_owned(),
            }
        })?;

        let target = self.path_for(hash);
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}-", hash.as_hex()))
            .tempfile_in(&shard_dir)
            .with_context(|| ImportErrorKind::Filesystem {
                operation: "blob_store::store",
                path: shard_dir.clone(),
                detail: "failed to create temporary file".to_owned(),
            })?;
        tmp.write_all(bytes).with_context(|| ImportErrorKind::Filesystem {
            operation: "blob_store::store",
            path: target.clone(),
            detail: "failed to write blob bytes".to_owned(),
        })?;
        tmp.as_file().sync_all().with_context(|| ImportErrorKind::Filesystem {
            operation: "blob_store::store",
            path: target.clone(),
            detail: "failed to fsync blob".to_owned(),
        })?;
        // A second writer may have raced us and already produced the same blob;
        // since content determines the target path, persisting is still correct.
        tmp.persist(&target).map_err(|e| e.error).with_context(|| {
            ImportErrorKind::Filesystem {
                operation: "blob_store::store",
                path: target.clone(),
                detail: "failed to rename blob into place".to_owned(),
            }
        })?;
        Ok(())
    }

    /// Re-hashes the stored bytes for `hash` and compares. Returns `Ok(false)`
    /// (not an error) when the blob is simply absent.
    pub fn verify(&self, hash: &Hash) -> Result<bool> {
        let path = self.path_for(hash);
        if !path.is_file() {
            return Ok(false);
        }
        let bytes = fs::read(&path).with_context(|| ImportErrorKind::Filesystem {
            operation: "blob_store::verify",
            path: path.clone(),
            detail: "failed to read blob for verification".to_owned(),
        })?;
        Ok(Hash::of_bytes(&bytes) == *hash)
    }

    /// Enumerates every blob under `attachments/` whose hash is not in
    /// `referenced`. Cleanup of the result is a separate operation, outside the
    /// import core (§4.1).
    pub fn orphans(&self, referenced: &std::collections::HashSet<Hash>) -> Result<Vec<Hash>> {
        let mut orphans = Vec::new();
        if !self.root.is_dir() {
            return Ok(orphans);
        }
        for shard_entry in fs::read_dir(&self.root)
            .with_context(|| ImportErrorKind::Filesystem {
                operation: "blob_store::orphans",
                path: self.root.clone(),
                detail: "failed to list attachments directory".to_owned(),
            })?
        {
            let shard_entry = shard_entry?;
            if !shard_entry.file_type()?.is_dir() {
                continue;
            }
            for blob_entry in fs::read_dir(shard_entry.path())? {
                let blob_entry = blob_entry?;
                if !blob_entry.file_type()?.is_file() {
                    continue;
                }
                let name = blob_entry.file_name();
                let name = name.to_string_lossy();
                if let Some(hash) = Hash::from_hex(&name) {
                    if !referenced.contains(&hash) {
                        orphans.push(hash);
                    }
                }
            }
        }
        orphans.sort();
        Ok(orphans)
    }

    /// Counts distinct blob files under `attachments/`, for `summary.yaml`'s
    /// `total_attachments` (§4.10, §6): the number of blobs the repository
    /// holds, not the number of parts processed in any one run.
    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        if !self.root.is_dir() {
            return Ok(count);
        }
        for shard_entry in fs::read_dir(&self.root).with_context(|| ImportErrorKind::Filesystem {
            operation: "blob_store::count",
            path: self.root.clone(),
            detail: "failed to list attachments directory".to_owned(),
        })? {
            let shard_entry = shard_entry?;
            if !shard_entry.file_type()?.is_dir() {
                continue;
            }
            for blob_entry in fs::read_dir(shard_entry.path())? {
                if blob_entry?.file_type()?.is_file() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
#[path = "blob_store_tests.rs"]
mod tests;
