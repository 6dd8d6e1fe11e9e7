//! `.mobilecombackup.yaml`: the repository marker file (§3, §6).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ImportErrorKind;

/// The only repository structure version this implementation understands.
pub const CURRENT_STRUCTURE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositoryMarker {
    pub repository_structure_version: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: String,
}

impl RepositoryMarker {
    pub fn new() -> Self {
        RepositoryMarker {
            repository_structure_version: CURRENT_STRUCTURE_VERSION,
            created_at: chrono::Utc::now(),
            created_by: format!("mobilecombackup {}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path).with_context(|| ImportErrorKind::Filesystem {
            operation: "read marker",
            path: path.to_path_buf(),
            detail: "failed to read .mobilecombackup.yaml".to_owned(),
        })?;
        let marker: RepositoryMarker = serde_yaml::from_str(&raw).with_context(|| ImportErrorKind::Parsing {
            path: path.to_path_buf(),
            context: ".mobilecombackup.yaml".to_owned(),
            detail: "invalid YAML".to_owned(),
        })?;
        Ok(Some(marker))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("failed to serialize .mobilecombackup.yaml")?;
        crate::utils::atomic_write(path, yaml.as_bytes())
    }
}

impl Default for RepositoryMarker {
    fn default() -> Self {
        RepositoryMarker::new()
    }
}

#[cfg(test)]
#[path = "marker_tests.rs"]
mod tests;
