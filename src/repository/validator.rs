//! Repository validator (§4.14): a read-only structural check of an existing
//! repository. The orchestrator's step 1 delegates here and refuses to
//! proceed on any violation; the out-of-scope `validate` CLI subcommand can
//! call this module standalone.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::contacts::ContactRegistry;
use crate::error::Violation;
use crate::hash::Hash;
use crate::xml::{calls, sms, DEFAULT_MAX_XML_SIZE};

use super::marker::RepositoryMarker;

/// Violations (blocking) and warnings (advisory) from a validation run
/// (§4.14). A non-empty `violations` makes the repository unfit for import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Runs every check in §4.14, cheap-to-expensive. A repository root that
/// does not exist yet is always valid (first import, §8 scenario 7).
pub fn validate(repo_root: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    if !repo_root.exists() {
        return Ok(report);
    }
    if !repo_root.is_dir() {
        report.violations.push(Violation::new(repo_root, "repository root exists but is not a directory"));
        return Ok(report);
    }

    check_marker(repo_root, &mut report)?;
    check_year_files(repo_root, "calls", &mut report)?;
    check_year_files(repo_root, "sms", &mut report)?;

    let referenced = collect_referenced_attachments(repo_root)?;
    check_attachments(repo_root, &referenced, &mut report);

    check_contacts(repo_root, &mut report)?;
    check_manifest(repo_root, &mut report);

    Ok(report)
}

fn check_marker(repo_root: &Path, report: &mut ValidationReport) -> Result<()> {
    let marker_path = repo_root.join(".mobilecombackup.yaml");
    match RepositoryMarker::load(&marker_path) {
        Ok(Some(marker)) if marker.repository_structure_version != super::marker::CURRENT_STRUCTURE_VERSION => {
            report.violations.push(Violation::new(
                &marker_path,
                format!("unrecognized repository_structure_version {}", marker.repository_structure_version),
            ));
        }
        Ok(_) => {}
        Err(e) => report.violations.push(Violation::new(&marker_path, e.to_string())),
    }
    Ok(())
}

/// Checks every `<entity>/<entity>-<YYYY>.xml` under `repo_root`: the `YYYY`
/// must parse as a four-digit year, the document must be well-formed, and
/// the root `count` attribute must equal the number of child records (§8
/// scenario 8).
fn check_year_files(repo_root: &Path, entity: &str, report: &mut ValidationReport) -> Result<()> {
    let dir = repo_root.join(entity);
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        if !file_name.ends_with(".xml") {
            continue;
        }
        let stem = file_name.trim_end_matches(".xml");
        let Some(year_str) = stem.strip_prefix(&format!("{entity}-")) else {
            report.violations.push(Violation::new(&path, "year file does not match the <entity>-<YYYY>.xml naming convention"));
            continue;
        };
        if year_str.len() != 4 || !year_str.chars().all(|c| c.is_ascii_digit()) {
            report.violations.push(Violation::new(&path, format!("{year_str:?} is not a four-digit year")));
            continue;
        }

        let root_count = match root_count_attribute(&path) {
            Ok(count) => count,
            Err(e) => {
                report.violations.push(Violation::new(&path, format!("not well-formed XML: {e}")));
                continue;
            }
        };
        let child_count = match entity {
            "calls" => count_calls(&path),
            _ => count_messages(&path),
        };
        let child_count = match child_count {
            Ok(count) => count,
            Err(e) => {
                report.violations.push(Violation::new(&path, format!("not well-formed XML: {e}")));
                continue;
            }
        };
        if root_count != child_count {
            report.violations.push(Violation::new(
                &path,
                format!("root count attribute is {root_count} but the file has {child_count} children"),
            ));
        }
    }
    Ok(())
}

fn root_count_attribute(path: &Path) -> Result<u64> {
    let file = std::fs::File::open(path)?;
    let mut reader = Reader::from_reader(std::io::BufReader::new(file));
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => anyhow::bail!("no root element found"),
            Event::Start(e) | Event::Empty(e) => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"count" {
                        let value = attr.unescape_value()?;
                        return Ok(value.parse()?);
                    }
                }
                anyhow::bail!("root element has no count attribute");
            }
            _ => {}
        }
        buf.clear();
    }
}

fn count_calls(path: &Path) -> Result<u64> {
    let mut count = 0u64;
    calls::read_calls_file(path, DEFAULT_MAX_XML_SIZE, |_| {
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

fn count_messages(path: &Path) -> Result<u64> {
    let mut count = 0u64;
    sms::read_messages_file(path, DEFAULT_MAX_XML_SIZE, |_| {
        count += 1;
        Ok(())
    })?;
    Ok(count)
}

/// Collects every attachment path referenced by any MMS part across all SMS
/// year files, for the blob-existence check.
fn collect_referenced_attachments(repo_root: &Path) -> Result<HashSet<String>> {
    let mut referenced = HashSet::new();
    let dir = repo_root.join("sms");
    if !dir.is_dir() {
        return Ok(referenced);
    }
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("xml") {
            continue;
        }
        let _ = sms::read_messages_file(&path, DEFAULT_MAX_XML_SIZE, |message| {
            if let crate::entities::Message::Mms(mms) = message {
                for part in &mms.parts {
                    if let crate::entities::PartPayload::Extracted { path, .. } = &part.payload {
                        referenced.insert(path.clone());
                    }
                }
            }
            Ok(())
        });
    }
    Ok(referenced)
}

/// Every referenced attachment path must resolve to an existing file whose
/// two-character shard directory matches the first two hex characters of the
/// hash embedded in the filename (§4.14 step 4).
fn check_attachments(repo_root: &Path, referenced: &HashSet<String>, report: &mut ValidationReport) {
    for relative_path in referenced {
        let full_path = repo_root.join(relative_path);
        if !full_path.is_file() {
            report.violations.push(Violation::new(&full_path, "referenced attachment does not exist"));
            continue;
        }
        let Some(file_name) = full_path.file_name().and_then(|n| n.to_str()) else { continue };
        let Some(hash) = Hash::from_hex(file_name) else {
            report.violations.push(Violation::new(&full_path, "attachment filename is not a valid hex SHA-256"));
            continue;
        };
        let Some(shard_dir) = full_path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) else { continue };
        if shard_dir != hash.shard_prefix() {
            report.violations.push(Violation::new(
                &full_path,
                format!("shard directory {shard_dir:?} does not match hash prefix {:?}", hash.shard_prefix()),
            ));
        }
    }
}

/// `contacts.yaml`'s `by_number`/`unprocessed` key sets must be disjoint
/// (§3 invariant, §4.14 step 5).
fn check_contacts(repo_root: &Path, report: &mut ValidationReport) -> Result<()> {
    let path = repo_root.join("contacts.yaml");
    if !path.exists() {
        return Ok(());
    }
    let registry = match ContactRegistry::load(&path) {
        Ok(registry) => registry,
        Err(e) => {
            report.violations.push(Violation::new(&path, e.to_string()));
            return Ok(());
        }
    };
    let canonical: HashSet<&str> = registry.canonical_numbers().collect();
    for unprocessed_number in registry.unprocessed_numbers() {
        if canonical.contains(unprocessed_number) {
            report.violations.push(Violation::new(
                &path,
                format!("{unprocessed_number:?} appears in both the canonical and unprocessed sections"),
            ));
        }
    }
    Ok(())
}

/// `files.yaml` staleness is advisory only (§4.14 step 6): the import core
/// never depends on it being correct to proceed.
fn check_manifest(repo_root: &Path, report: &mut ValidationReport) {
    let manifest_path = repo_root.join("files.yaml");
    if !manifest_path.is_file() {
        return;
    }
    let entries = match super::writer::build_manifest_entries(repo_root) {
        Ok(entries) => entries,
        Err(e) => {
            report.warnings.push(Violation::new(&manifest_path, format!("failed to recompute manifest for comparison: {e}")));
            return;
        }
    };
    let raw = match std::fs::read_to_string(&manifest_path) {
        Ok(raw) => raw,
        Err(e) => {
            report.warnings.push(Violation::new(&manifest_path, e.to_string()));
            return;
        }
    };
    let recorded: super::writer::ManifestFile = match serde_yaml::from_str(&raw) {
        Ok(recorded) => recorded,
        Err(e) => {
            report.warnings.push(Violation::new(&manifest_path, format!("failed to parse files.yaml: {e}")));
            return;
        }
    };
    for entry in &entries {
        let matches_recorded = recorded
            .files
            .iter()
            .any(|recorded_entry| recorded_entry.name == entry.name && recorded_entry.checksum == entry.checksum);
        if !matches_recorded {
            report.warnings.push(Violation::new(
                &manifest_path,
                format!("{} is out of date with respect to files.yaml (stale manifest)", entry.name),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
