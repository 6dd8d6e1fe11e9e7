//! Repository writer (§4.10): emits `summary.yaml`, `files.yaml` and its
//! `files.yaml.sha256` side-car at the end of a successful import.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::blob_store::BlobStore;
use crate::error::ImportErrorKind;
use crate::summary::ImportSummary;

const SUMMARY_FILE: &str = "summary.yaml";
const MANIFEST_FILE: &str = "files.yaml";
const MANIFEST_CHECKSUM_FILE: &str = "files.yaml.sha256";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SummaryStatistics {
    total_calls: usize,
    total_sms: usize,
    total_attachments: usize,
    years_covered: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SummaryFile {
    last_updated: DateTime<Utc>,
    statistics: SummaryStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub name: String,
    pub size: u64,
    pub checksum: String,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ManifestFile {
    pub version: String,
    pub generated: DateTime<Utc>,
    pub generator: String,
    pub files: Vec<ManifestEntry>,
}

/// Writes `summary.yaml`, `files.yaml` and `files.yaml.sha256` (§4.10). All
/// three writes are atomic (temp-then-rename), and the manifest walk excludes
/// itself and its checksum side-car. `total_attachments` in `summary.yaml` is
/// the count of distinct blobs on disk (`BlobStore::count`), not a per-run
/// extraction statistic: a calls-only import over a repository with existing
/// blobs must still report them, and two parts sharing one blob must not be
/// double-counted.
pub fn write_outputs(repo_root: &Path, store: &BlobStore, summary: &ImportSummary) -> Result<()> {
    write_summary(repo_root, store, summary)?;
    write_manifest(repo_root)?;
    Ok(())
}

fn write_summary(repo_root: &Path, store: &BlobStore, summary: &ImportSummary) -> Result<()> {
    let file = SummaryFile {
        last_updated: Utc::now(),
        statistics: SummaryStatistics {
            total_calls: summary.total_calls(),
            total_sms: summary.total_sms(),
            total_attachments: store.count()?,
            years_covered: summary.years_covered(),
        },
    };
    let yaml = serde_yaml::to_string(&file).context("failed to serialize summary.yaml")?;
    crate::utils::atomic_write(&repo_root.join(SUMMARY_FILE), yaml.as_bytes())
}

/// Enumerates every file under `repo_root` except the manifest and its
/// checksum side-car, sorted by forward-slash relative path (§4.10).
pub fn build_manifest_entries(repo_root: &Path) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(repo_root).into_iter().filter_map(std::result::Result::ok) {
        if !dir_entry.file_type().is_file() {
            continue;
        }
        let path = dir_entry.path();
        let relative = path.strip_prefix(repo_root).unwrap_or(path);
        let name = crate::utils::to_forward_slash_path(relative);
        if name == MANIFEST_FILE || name == MANIFEST_CHECKSUM_FILE {
            continue;
        }
        let metadata = std::fs::metadata(path).with_context(|| ImportErrorKind::Filesystem {
            operation: "manifest build",
            path: path.to_path_buf(),
            detail: "failed to stat file".to_owned(),
        })?;
        let hash = crate::utils::sha256_file(path)?;
        let modified: DateTime<Utc> = metadata.modified().context("failed to read mtime")?.into();
        entries.push(ManifestEntry {
            name,
            size: metadata.len(),
            checksum: format!("sha256:{}", hash.as_hex()),
            modified,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn write_manifest(repo_root: &Path) -> Result<()> {
    let entries = build_manifest_entries(repo_root)?;
    let manifest = ManifestFile {
        version: "1.0".to_owned(),
        generated: Utc::now(),
        generator: format!("mobilecombackup {}", env!("CARGO_PKG_VERSION")),
        files: entries,
    };
    let yaml = serde_yaml::to_string(&manifest).context("failed to serialize files.yaml")?;
    let manifest_path = repo_root.join(MANIFEST_FILE);
    crate::utils::atomic_write(&manifest_path, yaml.as_bytes())?;

    let manifest_hash = crate::utils::sha256_file(&manifest_path)?;
    let checksum_line = format!("{}  {}\n", manifest_hash.as_hex(), MANIFEST_FILE);
    crate::utils::atomic_write(&repo_root.join(MANIFEST_CHECKSUM_FILE), checksum_line.as_bytes())
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
