//! Shared fixtures for unit tests across the crate: minimal valid `Call` and
//! `Message` builders so individual test modules don't each reinvent them.

use crate::entities::{Call, CallType, Message, MessageBox, Mms, PartPayload, Sms};

pub fn call(number: &str, date_ms: i64, call_type: CallType) -> Call {
    Call { number: number.to_owned(), duration: 0, date: date_ms, call_type, readable_date: None, contact_name: None, rejection_reasons: Vec::new() }
}

pub fn sms(address: &str, date_ms: i64, body: &str) -> Message {
    Message::Sms(Sms {
        address: address.to_owned(),
        date: date_ms,
        message_type: MessageBox::Received,
        body: body.to_owned(),
        readable_date: None,
        contact_name: None,
        rejection_reasons: Vec::new(),
    })
}

pub fn mms(address: &str, date_ms: i64) -> Message {
    Message::Mms(Mms {
        address: address.to_owned(),
        date: date_ms,
        message_box: MessageBox::Received,
        subject: None,
        parts: Vec::new(),
        addrs: Vec::new(),
        contact_name: None,
        rejection_reasons: Vec::new(),
    })
}

pub fn inline_part(seq: i32, content_type: &str, data_base64: &str) -> crate::entities::MmsPart {
    crate::entities::MmsPart {
        seq,
        content_type: content_type.to_owned(),
        filename: None,
        payload: PartPayload::Inline { data_base64: data_base64.to_owned() },
    }
}
