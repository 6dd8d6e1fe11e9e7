use std::collections::BTreeMap;

use crate::entities::{Call, CallType};

use super::*;

fn call_in(year_timestamp: i64) -> Call {
    Call {
        number: "1".to_owned(),
        duration: 0,
        date: year_timestamp,
        call_type: CallType::Incoming,
        readable_date: None,
        contact_name: None,
        rejection_reasons: vec![],
    }
}

#[test]
fn tracks_initial_added_and_duplicates_per_year() {
    let mut tracker = YearTracker::new();
    let c2021 = call_in(1_609_459_200_000); // 2021-01-01T00:00:00Z
    tracker.record_initial(&c2021);
    tracker.record_added(&c2021);
    tracker.record_duplicate(&c2021);

    let map = tracker.into_map();
    let stats = &map[&2021];
    assert_eq!(stats.initial, 1);
    assert_eq!(stats.added, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.final_count(), 2);
}

#[test]
fn check_against_reports_no_warnings_when_counts_match() {
    let mut tracker = YearTracker::new();
    let c2021 = call_in(1_609_459_200_000);
    tracker.record_initial(&c2021);
    tracker.record_added(&c2021);

    let mut actual = BTreeMap::new();
    actual.insert(2021, 2);
    assert!(tracker.check_against(&actual).is_empty());
}

#[test]
fn check_against_warns_on_mismatch() {
    let mut tracker = YearTracker::new();
    let c2021 = call_in(1_609_459_200_000);
    tracker.record_initial(&c2021);

    let actual = BTreeMap::new();
    let warnings = tracker.check_against(&actual);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("2021"));
}
