//! Import orchestrator (§4.12): the top-level driver. Validates the
//! destination, loads prior state, dispatches each source file to the
//! matching importer, writes outputs, and returns the summary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::blob_store::BlobStore;
use crate::config::{ImportOptions, ProgressSink};
use crate::contacts::ContactRegistry;
use crate::error::ImportErrorKind;
use crate::importer::{CallImporter, MessageImporter};
use crate::rejection::RejectionWriter;
use crate::repository;
use crate::summary::ImportSummary;

/// Stateless driver: every run constructs fresh importers, so there is no
/// instance state to hold between calls (§4.12).
pub struct Orchestrator;

impl Orchestrator {
    /// Runs a full import according to `options`, reporting milestones to
    /// `progress` as it goes (§1, §4.12).
    pub fn run(options: &ImportOptions, progress: &dyn ProgressSink) -> Result<ImportSummary> {
        let started = Instant::now();

        // Step 1: validate the destination before touching anything.
        let report = repository::validate(&options.repo_root)
            .with_context(|| format!("failed to validate repository at {}", options.repo_root.display()))?;
        if !report.is_valid() {
            let detail = report.violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            anyhow::bail!(ImportErrorKind::Configuration { detail: format!("repository is not fit for import: {detail}") });
        }
        for warning in &report.warnings {
            log::warn!("{warning}");
        }

        // Step 2: load the contact registry.
        let contacts_path = options.repo_root.join("contacts.yaml");
        let mut registry = ContactRegistry::load(&contacts_path)?;

        // Step 3: construct importers, load existing year files.
        let mut call_importer = CallImporter::new();
        let mut message_importer = MessageImporter::new();
        call_importer.load_existing(&options.repo_root, options.max_xml_size)?;
        message_importer.load_existing(&options.repo_root, options.max_xml_size)?;

        let store = BlobStore::new(&options.repo_root);
        let rejection_writer = RejectionWriter::new(&options.repo_root);

        // Step 4: resolve source paths.
        let sources = resolve_source_paths(&options.paths)?;

        // Step 5: dispatch each source file by basename prefix.
        let mut rejection_files = Vec::new();
        for source in &sources {
            let basename = source.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if basename.starts_with("calls") {
                if !options.wants_calls() {
                    continue;
                }
                if let Some(path) =
                    call_importer.process_file(source, options.max_xml_size, options.max_message_size, &mut registry, &rejection_writer, progress)?
                {
                    rejection_files.push(crate::utils::to_forward_slash_path(
                        path.strip_prefix(&options.repo_root).unwrap_or(&path),
                    ));
                }
            } else if basename.starts_with("sms") {
                if !options.wants_sms() {
                    continue;
                }
                if let Some(path) = message_importer.process_file(
                    source,
                    options.max_xml_size,
                    options.max_message_size,
                    &store,
                    &mut registry,
                    &rejection_writer,
                    progress,
                )? {
                    rejection_files.push(crate::utils::to_forward_slash_path(
                        path.strip_prefix(&options.repo_root).unwrap_or(&path),
                    ));
                }
            }
        }

        let call_year_warnings = call_importer.year_warnings();
        let sms_year_warnings = message_importer.year_warnings();
        for warning in call_year_warnings.iter().chain(sms_year_warnings.iter()) {
            log::warn!("{warning}");
        }

        // Step 6: write outputs, persist contacts, generate manifests.
        if !options.dry_run {
            if options.wants_calls() {
                call_importer.write(&options.repo_root, false)?;
            }
            if options.wants_sms() {
                message_importer.write(&options.repo_root, false)?;
            }
            registry.save(&contacts_path)?;

            if !options.repo_root.join(".mobilecombackup.yaml").exists() {
                repository::RepositoryMarker::new().save(&options.repo_root.join(".mobilecombackup.yaml"))?;
            }
        }

        let attachment_stats = message_importer.attachment_stats();

        // Step 7: build the summary.
        let summary = ImportSummary {
            calls: call_importer.into_summary(),
            sms: message_importer.into_summary(),
            attachments_extracted: attachment_stats.extracted,
            attachments_referenced: attachment_stats.referenced,
            rejection_files,
            duration: started.elapsed(),
        };

        if !options.dry_run {
            repository::write_outputs(&options.repo_root, &store, &summary)?;
        }

        progress.on_summary(&summary);
        Ok(summary)
    }
}

/// Each input path is either a file (accepted if its basename starts with
/// `calls` or `sms` and ends `.xml`) or a directory walked recursively;
/// hidden directories are skipped, as are files already inside a `calls/` or
/// `sms/` path component (to avoid re-importing the repository itself, §4.12
/// step 4).
fn resolve_source_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in paths {
        if !input.exists() {
            anyhow::bail!(ImportErrorKind::Configuration { detail: format!("source path {} does not exist", input.display()) });
        }
        if input.is_file() {
            if is_eligible_basename(input) {
                sources.push(input.clone());
            }
            continue;
        }
        for entry in WalkDir::new(input).into_iter().filter_entry(|e| !is_hidden_dir(e.path())) {
            let entry = entry.context("failed to walk source directory")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if is_inside_repo_internal_dir(path) {
                continue;
            }
            if is_eligible_basename(path) {
                sources.push(path.to_path_buf());
            }
        }
    }
    sources.sort();
    Ok(sources)
}

fn is_hidden_dir(path: &Path) -> bool {
    path.is_dir() && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('.'))
}

fn is_inside_repo_internal_dir(path: &Path) -> bool {
    path.components().any(|c| matches!(c.as_os_str().to_str(), Some("calls") | Some("sms")))
}

fn is_eligible_basename(path: &Path) -> bool {
    let Some(basename) = path.file_name().and_then(|n| n.to_str()) else { return false };
    (basename.starts_with("calls") || basename.starts_with("sms")) && basename.ends_with(".xml")
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
