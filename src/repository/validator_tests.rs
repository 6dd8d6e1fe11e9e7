use tempfile::TempDir;

use super::*;

#[test]
fn nonexistent_repo_root_is_always_valid() {
    let dir = TempDir::new().unwrap();
    let report = validate(&dir.path().join("does-not-exist")).unwrap();
    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
}

#[test]
fn count_mismatch_in_year_file_is_a_single_violation() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("calls")).unwrap();
    std::fs::write(
        dir.path().join("calls/calls-2021.xml"),
        br#"<calls count="4"><call number="1" duration="1" date="1" type="1" /><call number="2" duration="1" date="1" type="1" /><call number="3" duration="1" date="1" type="1" /></calls>"#,
    )
    .unwrap();

    let report = validate(dir.path()).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].detail.contains("root count attribute is 4"));
    assert!(report.violations[0].detail.contains("3 children"));
}

#[test]
fn malformed_year_file_name_is_a_violation() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("calls")).unwrap();
    std::fs::write(dir.path().join("calls/calls-21.xml"), b"<calls count=\"0\"></calls>").unwrap();

    let report = validate(dir.path()).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].detail.contains("four-digit year"));
}

#[test]
fn unreferenced_or_missing_attachment_is_a_violation() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("sms")).unwrap();
    std::fs::write(
        dir.path().join("sms/sms-2021.xml"),
        br#"<smses count="1"><mms address="1" date="1" msg_box="1"><parts><part seq="0" ct="image/png" path="attachments/ab/abcdef0000000000000000000000000000000000000000000000000000000000" original_size="3" extraction_date="2021-01-01T00:00:00Z" /></parts></mms></smses>"#,
    )
    .unwrap();

    let report = validate(dir.path()).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].detail.contains("does not exist"));
}

#[test]
fn shard_prefix_mismatch_is_a_violation() {
    let dir = TempDir::new().unwrap();
    let hash = crate::hash::Hash::of_bytes(b"hello");
    let wrong_shard = if hash.shard_prefix() == "zz" { "yy" } else { "zz" };
    std::fs::create_dir_all(dir.path().join("attachments").join(wrong_shard)).unwrap();
    std::fs::write(dir.path().join("attachments").join(wrong_shard).join(hash.as_hex()), b"hello").unwrap();

    std::fs::create_dir_all(dir.path().join("sms")).unwrap();
    let xml = format!(
        r#"<smses count="1"><mms address="1" date="1" msg_box="1"><parts><part seq="0" ct="image/png" path="attachments/{}/{}" original_size="5" extraction_date="2021-01-01T00:00:00Z" /></parts></mms></smses>"#,
        wrong_shard,
        hash.as_hex()
    );
    std::fs::write(dir.path().join("sms/sms-2021.xml"), xml).unwrap();

    let report = validate(dir.path()).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].detail.contains("shard directory"));
}

#[test]
fn contacts_disjointness_violation() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("contacts.yaml"),
        "contacts:\n  - name: Jim\n    numbers: [\"5551234567\"]\nunprocessed:\n  - phone_number: \"5551234567\"\n    contact_names: [\"Someone\"]\n",
    )
    .unwrap();

    let report = validate(dir.path()).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].detail.contains("canonical and unprocessed"));
}

#[test]
fn unrecognized_structure_version_is_a_violation() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".mobilecombackup.yaml"),
        "repository_structure_version: 999\ncreated_at: 2021-01-01T00:00:00Z\ncreated_by: test\n",
    )
    .unwrap();

    let report = validate(dir.path()).unwrap();
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].detail.contains("999"));
}

#[test]
fn valid_repository_has_no_violations() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("calls")).unwrap();
    std::fs::write(
        dir.path().join("calls/calls-2021.xml"),
        br#"<calls count="1"><call number="1" duration="1" date="1" type="1" /></calls>"#,
    )
    .unwrap();

    let report = validate(dir.path()).unwrap();
    assert!(report.is_valid());
}
