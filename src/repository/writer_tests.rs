use tempfile::TempDir;

use crate::blob_store::BlobStore;
use crate::summary::{ImportSummary, YearStats};

use super::*;

#[test]
fn write_outputs_produces_summary_and_manifest_with_checksum_sidecar() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("calls")).unwrap();
    std::fs::write(dir.path().join("calls/calls-2021.xml"), b"<calls count=\"0\"></calls>").unwrap();

    let store = BlobStore::new(dir.path());
    let hash = crate::hash::Hash::of_bytes(b"attachment bytes");
    store.store(&hash, b"attachment bytes").unwrap();

    let mut summary = ImportSummary::default();
    summary.calls.by_year.insert(2021, YearStats { initial: 0, added: 1, duplicates: 0 });

    write_outputs(dir.path(), &store, &summary).unwrap();

    assert!(dir.path().join(SUMMARY_FILE).exists());
    assert!(dir.path().join(MANIFEST_FILE).exists());
    assert!(dir.path().join(MANIFEST_CHECKSUM_FILE).exists());

    let summary_yaml = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
    assert!(summary_yaml.contains("total_calls: 1"));
    assert!(summary_yaml.contains("total_attachments: 1"));
    assert!(summary_yaml.contains("2021"));

    let checksum_line = std::fs::read_to_string(dir.path().join(MANIFEST_CHECKSUM_FILE)).unwrap();
    assert!(checksum_line.ends_with("files.yaml\n"));
    assert_eq!(checksum_line.split("  ").count(), 2);
}

#[test]
fn total_attachments_counts_distinct_blobs_not_parts_referencing_them() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    let hash = crate::hash::Hash::of_bytes(b"shared blob");
    store.store(&hash, b"shared blob").unwrap();

    // Two MMS parts across this run reference the same blob (one extracted,
    // one merely referenced); the repository still holds exactly one blob.
    write_outputs(dir.path(), &store, &ImportSummary::default()).unwrap();

    let summary_yaml = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
    assert!(summary_yaml.contains("total_attachments: 1"));
}

#[test]
fn total_attachments_reflects_preexisting_blobs_on_a_calls_only_run() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    store.store(&crate::hash::Hash::of_bytes(b"already here"), b"already here").unwrap();

    write_outputs(dir.path(), &store, &ImportSummary::default()).unwrap();

    let summary_yaml = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
    assert!(summary_yaml.contains("total_attachments: 1"));
}

#[test]
fn manifest_excludes_itself_and_its_checksum_sidecar() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("contacts.yaml"), b"contacts: []\nunprocessed: []\n").unwrap();

    let entries = build_manifest_entries(dir.path()).unwrap();
    assert!(entries.iter().any(|e| e.name == "contacts.yaml"));
    assert!(!entries.iter().any(|e| e.name == MANIFEST_FILE));
    assert!(!entries.iter().any(|e| e.name == MANIFEST_CHECKSUM_FILE));
}

#[test]
fn manifest_entries_are_sorted_by_name() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("zeta.txt"), b"z").unwrap();
    std::fs::write(dir.path().join("alpha.txt"), b"a").unwrap();

    let entries = build_manifest_entries(dir.path()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn manifest_entry_checksum_matches_file_contents() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

    let entries = build_manifest_entries(dir.path()).unwrap();
    let entry = entries.iter().find(|e| e.name == "a.txt").unwrap();
    let expected = crate::hash::Hash::of_bytes(b"hello");
    assert_eq!(entry.checksum, format!("sha256:{}", expected.as_hex()));
    assert_eq!(entry.size, 5);
}
