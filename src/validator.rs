//! Record validation (§4.5): a pure predicate returning a list of violation
//! tags. Deterministic and stable -- the same record always produces the same
//! tags in the same order.

use crate::entities::{Call, Message, Mms, MmsPart, PartPayload, Sms};

/// §6 `max_message_size`: a record whose relevant payload exceeds this many
/// bytes is rejected with `record-exceeds-max-size` rather than coalesced.
/// For a call this is the textual fields; for a message it's the body (SMS)
/// or the sum of part payload sizes (MMS) -- the fields that can actually
/// grow unbounded, not the fixed-size timestamp/type fields.
pub fn validate_call_size(call: &Call, max_message_size: u64) -> Vec<String> {
    let size = call.number.len() as u64 + call.readable_date.as_ref().map_or(0, |s| s.len() as u64);
    size_tag(size, max_message_size)
}

pub fn validate_message_size(message: &Message, max_message_size: u64) -> Vec<String> {
    let size = match message {
        Message::Sms(sms) => sms.body.len() as u64,
        Message::Mms(mms) => mms.parts.iter().map(part_size_estimate).sum(),
    };
    size_tag(size, max_message_size)
}

/// Inline payloads aren't decoded just to measure them; a base64 string is at
/// most 4/3 the decoded size, so dividing by 4 and multiplying by 3 gives a
/// safe upper bound on the decoded byte count.
fn part_size_estimate(part: &MmsPart) -> u64 {
    match &part.payload {
        PartPayload::Inline { data_base64 } => (data_base64.len() as u64 / 4) * 3,
        PartPayload::Extracted { original_size, .. } => *original_size,
        PartPayload::None => 0,
    }
}

fn size_tag(size: u64, max_message_size: u64) -> Vec<String> {
    if size > max_message_size {
        vec!["record-exceeds-max-size".to_owned()]
    } else {
        Vec::new()
    }
}

pub fn validate_call(call: &Call) -> Vec<String> {
    let mut tags = Vec::new();
    if call.date <= 0 {
        tags.push("timestamp-not-positive".to_owned());
    }
    if call.number.trim().is_empty() {
        tags.push("number-empty".to_owned());
    }
    if !call.call_type.is_known() {
        tags.push("call-type-unknown".to_owned());
    }
    if call.duration < 0 {
        tags.push("duration-negative".to_owned());
    }
    tags
}

pub fn validate_sms(sms: &Sms) -> Vec<String> {
    let mut tags = Vec::new();
    if sms.date <= 0 {
        tags.push("date-not-positive".to_owned());
    }
    if sms.address.trim().is_empty() {
        tags.push("address-empty".to_owned());
    }
    if !sms.message_type.is_known() {
        tags.push("message-type-unknown".to_owned());
    }
    tags
}

pub fn validate_mms(mms: &Mms) -> Vec<String> {
    let mut tags = Vec::new();
    if mms.date <= 0 {
        tags.push("date-not-positive".to_owned());
    }
    if mms.address.trim().is_empty() {
        tags.push("address-empty".to_owned());
    }
    if !mms.message_box.is_known() {
        tags.push("message-box-unknown".to_owned());
    }
    for part in &mms.parts {
        if part.content_type.trim().is_empty() {
            tags.push(format!("part-{}-content-type-empty", part.seq));
        }
    }
    tags
}

pub fn validate_message(message: &Message) -> Vec<String> {
    match message {
        Message::Sms(sms) => validate_sms(sms),
        Message::Mms(mms) => validate_mms(mms),
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
