//! Configuration record and progress-callback interface handed to the core
//! by its (out-of-scope) front-end (§6).

use std::path::{Path, PathBuf};

/// Default per-record byte limit (§6): 10 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 10 * 1024 * 1024;

/// Which entity kind an import run is restricted to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityFilter {
    #[default]
    Unset,
    Calls,
    Sms,
}

/// The configuration record the core consumes (§6). Constructed with
/// [`ImportOptions::new`] plus builder-style setters, mirroring the teacher's
/// preference for plain constructors over a separate builder crate.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub repo_root: PathBuf,
    pub paths: Vec<PathBuf>,
    pub dry_run: bool,
    pub filter: EntityFilter,
    pub max_xml_size: u64,
    pub max_message_size: u64,
}

impl ImportOptions {
    pub fn new(repo_root: impl Into<PathBuf>, paths: Vec<PathBuf>) -> Self {
        ImportOptions {
            repo_root: repo_root.into(),
            paths,
            dry_run: false,
            filter: EntityFilter::Unset,
            max_xml_size: crate::xml::DEFAULT_MAX_XML_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn filter(mut self, filter: EntityFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn max_xml_size(mut self, max_xml_size: u64) -> Self {
        self.max_xml_size = max_xml_size;
        self
    }

    pub fn max_message_size(mut self, max_message_size: u64) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn wants_calls(&self) -> bool {
        !matches!(self.filter, EntityFilter::Sms)
    }

    pub fn wants_sms(&self) -> bool {
        !matches!(self.filter, EntityFilter::Calls)
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

/// Coarse-grained import milestones the orchestrator reports upward. The
/// core never decides how (or whether) these are rendered; that's the
/// front-end's job (§1, §6).
pub trait ProgressSink {
    fn on_file_start(&self, _path: &Path) {}
    fn on_file_done(&self, _path: &Path, _added: usize, _duplicates: usize, _rejected: usize) {}
    fn on_rejection_written(&self, _path: &Path, _count: usize) {}
    fn on_summary(&self, _summary: &crate::summary::ImportSummary) {}
}

/// No-op sink for library callers and tests that don't care about progress,
/// playing the role the teacher's `NoChooser` plays for `MyselfChooser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {}

/// Forwards every milestone to the `log` facade at `Info`/`Debug` level. The
/// binary wires this in; library code never constructs one on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn on_file_start(&self, path: &Path) {
        log::debug!("processing {}", path.display());
    }

    fn on_file_done(&self, path: &Path, added: usize, duplicates: usize, rejected: usize) {
        log::info!(
            "{}: {} added, {} duplicates, {} rejected",
            path.display(),
            added,
            duplicates,
            rejected
        );
    }

    fn on_rejection_written(&self, path: &Path, count: usize) {
        log::warn!("wrote {} rejected record(s) to {}", count, path.display());
    }

    fn on_summary(&self, summary: &crate::summary::ImportSummary) {
        log::info!("{summary}");
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
