use super::*;
use crate::entities::{CallType, MessageBox, MmsPart, PartPayload};

fn valid_call() -> Call {
    Call {
        number: "5551234567".to_owned(),
        duration: 10,
        date: 1000,
        call_type: CallType::Incoming,
        readable_date: None,
        contact_name: None,
        rejection_reasons: vec![],
    }
}

#[test]
fn valid_call_has_no_violations() {
    assert!(validate_call(&valid_call()).is_empty());
}

#[test]
fn call_catches_all_rule_violations_independently() {
    let mut c = valid_call();
    c.date = 0;
    assert_eq!(validate_call(&c), vec!["timestamp-not-positive"]);

    let mut c = valid_call();
    c.number = "   ".to_owned();
    assert_eq!(validate_call(&c), vec!["number-empty"]);

    let mut c = valid_call();
    c.call_type = CallType::Unknown(99);
    assert_eq!(validate_call(&c), vec!["call-type-unknown"]);

    let mut c = valid_call();
    c.duration = -1;
    assert_eq!(validate_call(&c), vec!["duration-negative"]);
}

#[test]
fn call_with_multiple_violations_reports_all() {
    let c = Call {
        number: "".to_owned(),
        duration: -5,
        date: -1,
        call_type: CallType::Unknown(0),
        readable_date: None,
        contact_name: None,
        rejection_reasons: vec![],
    };
    let tags = validate_call(&c);
    assert_eq!(
        tags,
        vec!["timestamp-not-positive", "number-empty", "call-type-unknown", "duration-negative"]
    );
}

fn valid_sms() -> Sms {
    Sms {
        address: "5551234567".to_owned(),
        date: 1000,
        message_type: MessageBox::Received,
        body: "hi".to_owned(),
        readable_date: None,
        contact_name: None,
        rejection_reasons: vec![],
    }
}

#[test]
fn valid_sms_has_no_violations() {
    assert!(validate_sms(&valid_sms()).is_empty());
}

#[test]
fn sms_catches_violations() {
    let mut s = valid_sms();
    s.date = 0;
    assert!(validate_sms(&s).contains(&"date-not-positive".to_owned()));

    let mut s = valid_sms();
    s.address = "".to_owned();
    assert!(validate_sms(&s).contains(&"address-empty".to_owned()));

    let mut s = valid_sms();
    s.message_type = MessageBox::Unknown(9);
    assert!(validate_sms(&s).contains(&"message-type-unknown".to_owned()));
}

fn valid_mms() -> Mms {
    Mms {
        address: "5551234567".to_owned(),
        date: 1000,
        message_box: MessageBox::Received,
        subject: None,
        parts: vec![MmsPart {
            seq: 0,
            content_type: "text/plain".to_owned(),
            filename: None,
            payload: PartPayload::None,
        }],
        addrs: vec![],
        contact_name: None,
        rejection_reasons: vec![],
    }
}

#[test]
fn valid_mms_has_no_violations() {
    assert!(validate_mms(&valid_mms()).is_empty());
}

#[test]
fn mms_catches_empty_part_content_type() {
    let mut m = valid_mms();
    m.parts[0].content_type = "".to_owned();
    assert_eq!(validate_mms(&m), vec!["part-0-content-type-empty"]);
}

#[test]
fn mms_with_malformed_base64_is_not_caught_here() {
    // §4.5: inline data that can't be base64-decoded is an extractor concern.
    let mut m = valid_mms();
    m.parts[0].payload = PartPayload::Inline { data_base64: "not valid base64!!".to_owned() };
    assert!(validate_mms(&m).is_empty());
}

#[test]
fn call_size_under_limit_has_no_violations() {
    assert!(validate_call_size(&valid_call(), 1024).is_empty());
}

#[test]
fn call_size_over_limit_is_tagged() {
    let mut c = valid_call();
    c.readable_date = Some("x".repeat(100));
    assert_eq!(validate_call_size(&c, 10), vec!["record-exceeds-max-size"]);
}

#[test]
fn sms_body_over_limit_is_tagged() {
    let mut s = valid_sms();
    s.body = "x".repeat(100);
    assert_eq!(validate_message_size(&Message::Sms(s), 10), vec!["record-exceeds-max-size"]);
}

#[test]
fn mms_inline_part_size_is_estimated_from_base64_length_without_decoding() {
    let mut m = valid_mms();
    // 100 base64 chars bound roughly 75 decoded bytes, over a 10-byte limit.
    m.parts[0].payload = PartPayload::Inline { data_base64: "A".repeat(100) };
    assert_eq!(validate_message_size(&Message::Mms(m), 10), vec!["record-exceeds-max-size"]);
}

#[test]
fn mms_extracted_part_uses_original_size_directly() {
    let mut m = valid_mms();
    m.parts[0].payload =
        PartPayload::Extracted { path: "attachments/ab/abc".to_owned(), original_size: 1000, extraction_date: chrono::Utc::now() };
    assert_eq!(validate_message_size(&Message::Mms(m), 10), vec!["record-exceeds-max-size"]);
}

#[test]
fn validate_message_dispatches_by_variant() {
    let mut bad_sms = valid_sms();
    bad_sms.address = "".to_owned();
    assert!(!validate_message(&Message::Sms(bad_sms)).is_empty());

    let good_mms = valid_mms();
    assert!(validate_message(&Message::Mms(good_mms)).is_empty());
}
