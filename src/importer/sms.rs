//! SMS/MMS importer (§4.8, §4.13): validate, extract attachments, resolve
//! contacts, coalesce.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::attachments::{self, ExtractionStats};
use crate::blob_store::BlobStore;
use crate::coalescer::Coalescer;
use crate::config::ProgressSink;
use crate::contacts::ContactRegistry;
use crate::entities::{Message, Record};
use crate::rejection::RejectionWriter;
use crate::summary::EntitySummary;
use crate::validator;
use crate::xml::sms as sms_xml;

use super::year_tracker::YearTracker;

pub struct MessageImporter {
    coalescer: Coalescer<Message>,
    year_tracker: YearTracker,
    summary: EntitySummary,
    attachment_stats: ExtractionStats,
}

impl MessageImporter {
    pub fn new() -> Self {
        MessageImporter {
            coalescer: Coalescer::new(),
            year_tracker: YearTracker::new(),
            summary: EntitySummary::default(),
            attachment_stats: ExtractionStats::default(),
        }
    }

    pub fn load_existing(&mut self, repo_root: &Path, max_xml_size: u64) -> Result<()> {
        let dir = repo_root.join("sms");
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
            sms_xml::read_messages_file(&path, max_xml_size, |message| {
                loaded.push(message);
                Ok(())
            })?;
            for message in &loaded {
                self.year_tracker.record_initial(message);
            }
            self.coalescer.load_existing(loaded);
        }
        Ok(())
    }

    /// Processes one source file. Order matters (§4.8 critical ordering):
    /// validate, extract attachments (before fingerprinting), resolve
    /// contact, coalesce.
    pub fn process_file(
        &mut self,
        path: &Path,
        max_xml_size: u64,
        max_message_size: u64,
        store: &BlobStore,
        registry: &mut ContactRegistry,
        rejection_writer: &RejectionWriter,
        progress: &dyn ProgressSink,
    ) -> Result<Option<std::path::PathBuf>> {
        progress.on_file_start(path);
        let mut rejected = Vec::new();
        let mut added = 0usize;
        let mut duplicates = 0usize;
        let mut attachment_stats = ExtractionStats::default();

        let result = sms_xml::read_messages_file(path, max_xml_size, |mut message| {
            let mut tags = validator::validate_message(&message);
            tags.extend(validator::validate_message_size(&message, max_message_size));
            if !tags.is_empty() {
                *message.rejection_reasons_mut() = tags;
                rejected.push(message);
                return Ok(());
            }

            if let Message::Mms(mms) = &mut message {
                match attachments::extract(store, mms) {
                    Ok(stats) => {
                        attachment_stats.extracted += stats.extracted;
                        attachment_stats.referenced += stats.referenced;
                    }
                    Err(_) => {
                        message.rejection_reasons_mut().push("malformed-attachment".to_owned());
                        rejected.push(message);
                        return Ok(());
                    }
                }
            }

            // Resolution before observation (§4.8 critical ordering).
            if let Some(name) = registry.resolve(message.address()) {
                message.set_contact_name(name.to_owned());
            } else if let Some(name) = message.contact_name() {
                registry.observe(message.address(), &name.to_owned());
            }

            if self.coalescer.add(message.clone()) {
                self.year_tracker.record_added(&message);
                added += 1;
            } else {
                self.year_tracker.record_duplicate(&message);
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
        self.attachment_stats.extracted += attachment_stats.extracted;
        self.attachment_stats.referenced += attachment_stats.referenced;

        let mut rejection_path = None;
        if !rejected.is_empty() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("sms").to_owned();
            let source_hash = crate::utils::sha256_file(path)?;
            rejection_path = rejection_writer.write_messages(&stem, &source_hash, &rejected)?;
            if let Some(written) = &rejection_path {
                progress.on_rejection_written(written, rejected.len());
            }
        }
        progress.on_file_done(path, added, duplicates, rejected.len());
        Ok(rejection_path)
    }

    pub fn write(&self, repo_root: &Path, dry_run: bool) -> Result<()> {
        if dry_run {
            return Ok(());
        }
        let by_year = self.partition_by_year();
        let dir = repo_root.join("sms");
        for (year, messages) in by_year {
            sms_xml::write_messages_file(&dir.join(format!("sms-{year}.xml")), &messages)?;
        }
        Ok(())
    }

    fn partition_by_year(&self) -> BTreeMap<i32, Vec<Message>> {
        let mut by_year: BTreeMap<i32, Vec<Message>> = BTreeMap::new();
        for message in self.coalescer.all() {
            by_year.entry(message.utc_year()).or_default().push(message);
        }
        by_year
    }

    pub fn final_counts_by_year(&self) -> BTreeMap<i32, usize> {
        self.partition_by_year().into_iter().map(|(year, messages)| (year, messages.len())).collect()
    }

    pub fn year_warnings(&self) -> Vec<String> {
        self.year_tracker.check_against(&self.final_counts_by_year())
    }

    pub fn attachment_stats(&self) -> ExtractionStats {
        self.attachment_stats
    }

    pub fn into_summary(self) -> EntitySummary {
        let mut summary = self.summary;
        summary.by_year = self.year_tracker.into_map();
        summary
    }
}

impl Default for MessageImporter {
    fn default() -> Self {
        MessageImporter::new()
    }
}

#[cfg(test)]
#[path = "sms_tests.rs"]
mod tests;
