//! Call importer (§4.8, §4.13): `init -> load-existing -> process-file* ->
//! write -> terminal`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::coalescer::Coalescer;
use crate::config::ProgressSink;
use crate::contacts::ContactRegistry;
use crate::entities::{Call, Record};
use crate::rejection::RejectionWriter;
use crate::summary::EntitySummary;
use crate::validator;
use crate::xml::calls as calls_xml;

use super::year_tracker::YearTracker;

pub struct CallImporter {
    coalescer: Coalescer<Call>,
    year_tracker: YearTracker,
    summary: EntitySummary,
}

impl CallImporter {
    pub fn new() -> Self {
        CallImporter { coalescer: Coalescer::new(), year_tracker: YearTracker::new(), summary: EntitySummary::default() }
    }

    /// Streams the repository's existing `calls/calls-<YYYY>.xml` files into
    /// the coalescer, tagging every record as *initial* (§4.8).
    pub fn load_existing(&mut self, repo_root: &Path, max_xml_size: u64) -> Result<()> {
        let dir = repo_root.join("calls");
        if !dir.is_dir() {
            return Ok(());
        }
        let mut entries: Vec<_> = std::fs::read_dir(&dir)?.filter_map(std::result::Result::ok).collect();
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("xml") {
                continue;
            }
            let mut loaded = Vec::new();
            calls_xml::read_calls_file(&path, max_xml_size, |call| {
                loaded.push(call);
                Ok(())
            })?;
            for call in &loaded {
                self.year_tracker.record_initial(call);
            }
            self.coalescer.load_existing(loaded);
        }
        Ok(())
    }

    /// Processes one source file: validate, resolve/observe contact name,
    /// coalesce. Violating records are collected and handed to the rejection
    /// writer (§4.8 step (b)).
    pub fn process_file(
        &mut self,
        path: &Path,
        max_xml_size: u64,
        max_message_size: u64,
        registry: &mut ContactRegistry,
        rejection_writer: &RejectionWriter,
        progress: &dyn ProgressSink,
    ) -> Result<Option<std::path::PathBuf>> {
        progress.on_file_start(path);
        let mut rejected = Vec::new();
        let mut added = 0usize;
        let mut duplicates = 0usize;

        let result = calls_xml::read_calls_file(path, max_xml_size, |mut call| {
            let mut tags = validator::validate_call(&call);
            tags.extend(validator::validate_call_size(&call, max_message_size));
            if !tags.is_empty() {
                call.rejection_reasons = tags;
                rejected.push(call);
                return Ok(());
            }

            // Resolution before observation (§4.8 critical ordering): an
            // already-known number must never accumulate as unprocessed.
            if let Some(name) = registry.resolve(&call.number) {
                call.contact_name = Some(name.to_owned());
            } else if let Some(name) = &call.contact_name {
                registry.observe(&call.number, name);
            }

            if self.coalescer.add(call.clone()) {
                self.year_tracker.record_added(&call);
                added += 1;
            } else {
                self.year_tracker.record_duplicate(&call);
                duplicates += 1;
            }
            Ok(())
        });
        if let Err(e) = result {
            self.summary.errors += 1;
            progress.on_file_done(path, added, duplicates, rejected.len());
            return Err(e);
        }

        self.summary.added += added;
        self.summary.duplicates += duplicates;
        self.summary.rejected += rejected.len();

        let mut rejection_path = None;
        if !rejected.is_empty() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("calls").to_owned();
            let source_hash = crate::utils::sha256_file(path)?;
            rejection_path = rejection_writer.write_calls(&stem, &source_hash, &rejected)?;
            if let Some(written) = &rejection_path {
                progress.on_rejection_written(written, rejected.len());
            }
        }
        progress.on_file_done(path, added, duplicates, rejected.len());
        Ok(rejection_path)
    }

    /// Partitions `coalescer.all()` by year and writes each
    /// `calls/calls-<YYYY>.xml` atomically (§4.8 "write" state). No-op in
    /// dry-run mode.
    pub fn write(&self, repo_root: &Path, dry_run: bool) -> Result<()> {
        if dry_run {
            return Ok(());
        }
        let by_year = self.partition_by_year();
        let dir = repo_root.join("calls");
        for (year, calls) in by_year {
            calls_xml::write_calls_file(&dir.join(format!("calls-{year}.xml")), &calls)?;
        }
        Ok(())
    }

    fn partition_by_year(&self) -> BTreeMap<i32, Vec<Call>> {
        let mut by_year: BTreeMap<i32, Vec<Call>> = BTreeMap::new();
        for call in self.coalescer.all() {
            by_year.entry(call.utc_year()).or_default().push(call);
        }
        by_year
    }

    pub fn final_counts_by_year(&self) -> BTreeMap<i32, usize> {
        self.partition_by_year().into_iter().map(|(year, calls)| (year, calls.len())).collect()
    }

    pub fn year_warnings(&self) -> Vec<String> {
        self.year_tracker.check_against(&self.final_counts_by_year())
    }

    pub fn into_summary(self) -> EntitySummary {
        let mut summary = self.summary;
        summary.by_year = self.year_tracker.into_map();
        summary
    }
}

impl Default for CallImporter {
    fn default() -> Self {
        CallImporter::new()
    }
}

#[cfg(test)]
#[path = "calls_tests.rs"]
mod tests;
