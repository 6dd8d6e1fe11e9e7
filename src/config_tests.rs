use std::path::PathBuf;

use super::*;

#[test]
fn new_applies_defaults() {
    let opts = ImportOptions::new("/tmp/repo", vec![PathBuf::from("a.xml")]);
    assert!(!opts.dry_run);
    assert_eq!(opts.filter, EntityFilter::Unset);
    assert_eq!(opts.max_xml_size, crate::xml::DEFAULT_MAX_XML_SIZE);
    assert_eq!(opts.max_message_size, 10 * 1024 * 1024);
}

#[test]
fn builder_setters_chain() {
    let opts = ImportOptions::new("/tmp/repo", vec![])
        .dry_run(true)
        .filter(EntityFilter::Calls)
        .max_xml_size(1024)
        .max_message_size(2048);
    assert!(opts.dry_run);
    assert_eq!(opts.filter, EntityFilter::Calls);
    assert_eq!(opts.max_xml_size, 1024);
    assert_eq!(opts.max_message_size, 2048);
}

#[test]
fn wants_calls_and_sms_reflect_filter() {
    let unset = ImportOptions::new("/tmp/repo", vec![]);
    assert!(unset.wants_calls());
    assert!(unset.wants_sms());

    let calls_only = ImportOptions::new("/tmp/repo", vec![]).filter(EntityFilter::Calls);
    assert!(calls_only.wants_calls());
    assert!(!calls_only.wants_sms());

    let sms_only = ImportOptions::new("/tmp/repo", vec![]).filter(EntityFilter::Sms);
    assert!(!sms_only.wants_calls());
    assert!(sms_only.wants_sms());
}

#[test]
fn null_progress_sink_accepts_all_calls() {
    let sink = NullProgressSink;
    sink.on_file_start(Path::new("a.xml"));
    sink.on_file_done(Path::new("a.xml"), 1, 0, 0);
    sink.on_rejection_written(Path::new("rej.xml"), 1);
}
