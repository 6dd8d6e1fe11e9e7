//! The record data model (§3): calls, SMS/MMS messages, MMS parts and addresses,
//! plus the `Record` trait the coalescer (§4.3) operates against.

use chrono::{Datelike, TimeZone, Utc};

use crate::hash::Hash;

/// Milliseconds since the Unix epoch. Shared by calls (`date`) and messages
/// (`date`), always compared and partitioned in UTC (§9 "Year partitioning").
pub type TimestampMs = i64;

/// A coalescable item: has a timestamp, a derived UTC year, and a content
/// fingerprint over its semantic (non-cosmetic) fields (§3, §4.3).
pub trait Record {
    fn timestamp_ms(&self) -> TimestampMs;

    fn utc_year(&self) -> i32 {
        utc_year_of(self.timestamp_ms())
    }

    /// SHA-256 of a canonical serialization of this record's semantic fields.
    /// Two records with the same fingerprint are considered the same event
    /// regardless of cosmetic differences (§4.3 rationale).
    fn fingerprint(&self) -> Hash;
}

pub fn utc_year_of(timestamp_ms: TimestampMs) -> i32 {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.year())
        .unwrap_or(1970)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
    Voicemail,
    /// A wire `type` code the backup format doesn't define (§4.5 rejects these).
    Unknown(i32),
}

impl CallType {
    /// Android call-log `type` column convention.
    pub fn from_wire_code(code: i32) -> Self {
        match code {
            1 => CallType::Incoming,
            2 => CallType::Outgoing,
            3 => CallType::Missed,
            4 => CallType::Voicemail,
            other => CallType::Unknown(other),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CallType::Unknown(_))
    }

    pub fn as_str(&self) -> std::borrow::Cow<'static, str> {
        match self {
            CallType::Incoming => "incoming".into(),
            CallType::Outgoing => "outgoing".into(),
            CallType::Missed => "missed".into(),
            CallType::Voicemail => "voicemail".into(),
            CallType::Unknown(code) => format!("unknown({code})").into(),
        }
    }

    pub fn to_wire_code(&self) -> i32 {
        match self {
            CallType::Incoming => 1,
            CallType::Outgoing => 2,
            CallType::Missed => 3,
            CallType::Voicemail => 4,
            CallType::Unknown(code) => *code,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub number: String,
    pub duration: i64,
    pub date: TimestampMs,
    pub call_type: CallType,
    /// Cosmetic: excluded from the fingerprint, present for human readability only.
    pub readable_date: Option<String>,
    /// Cosmetic at fingerprint time, but mutated during import (contact resolution).
    pub contact_name: Option<String>,
    /// Set only on records emitted by the rejection writer or re-read from one.
    pub rejection_reasons: Vec<String>,
}

impl Record for Call {
    fn timestamp_ms(&self) -> TimestampMs {
        self.date
    }

    fn fingerprint(&self) -> Hash {
        let canonical = format!(
            "call\u{1}{}\u{1}{}\u{1}{}\u{1}{}",
            self.number.trim(),
            self.duration,
            self.date,
            self.call_type.as_str(),
        );
        Hash::of_bytes(canonical.as_bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBox {
    Received,
    Sent,
    /// A wire `type`/`msg_box` code the backup format doesn't define.
    Unknown(i32),
}

impl MessageBox {
    /// Android `sms.type` / `mms.msg_box` column convention (1 = received, 2 = sent).
    pub fn from_wire_code(code: i32) -> Self {
        match code {
            1 => MessageBox::Received,
            2 => MessageBox::Sent,
            other => MessageBox::Unknown(other),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MessageBox::Unknown(_))
    }

    pub fn as_str(&self) -> std::borrow::Cow<'static, str> {
        match self {
            MessageBox::Received => "received".into(),
            MessageBox::Sent => "sent".into(),
            MessageBox::Unknown(code) => format!("unknown({code})").into(),
        }
    }

    pub fn to_wire_code(&self) -> i32 {
        match self {
            MessageBox::Received => 1,
            MessageBox::Sent => 2,
            MessageBox::Unknown(code) => *code,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sms {
    pub address: String,
    pub date: TimestampMs,
    pub message_type: MessageBox,
    pub body: String,
    pub readable_date: Option<String>,
    pub contact_name: Option<String>,
    pub rejection_reasons: Vec<String>,
}

impl Record for Sms {
    fn timestamp_ms(&self) -> TimestampMs {
        self.date
    }

    fn fingerprint(&self) -> Hash {
        let canonical = format!(
            "sms\u{1}{}\u{1}{}\u{1}{}\u{1}{}",
            self.address.trim(),
            self.date,
            self.message_type.as_str(),
            self.body,
        );
        Hash::of_bytes(canonical.as_bytes())
    }
}

/// Either the part still carries its original base64 payload, or it has been
/// extracted to the blob store and now carries a repository-relative path plus
/// extraction metadata (§4.7).
#[derive(Debug, Clone, PartialEq)]
pub enum PartPayload {
    Inline { data_base64: String },
    Extracted { path: String, original_size: u64, extraction_date: chrono::DateTime<Utc> },
    /// No payload at all -- e.g. an `smil` layout part with empty `data`, or a
    /// part the extractor intentionally left untouched because it was empty.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MmsPart {
    pub seq: i32,
    pub content_type: String,
    pub filename: Option<String>,
    pub payload: PartPayload,
}

impl MmsPart {
    /// The canonical serialization used in the MMS fingerprint: for an
    /// extracted part this is the `path`, never the original inline bytes
    /// (§9 "Deduplication key").
    fn fingerprint_fragment(&self) -> String {
        match &self.payload {
            PartPayload::Inline { data_base64 } => {
                format!("{}\u{2}{}\u{2}inline\u{2}{}", self.seq, self.content_type, data_base64)
            }
            PartPayload::Extracted { path, .. } => {
                format!("{}\u{2}{}\u{2}extracted\u{2}{}", self.seq, self.content_type, path)
            }
            PartPayload::None => {
                format!("{}\u{2}{}\u{2}none", self.seq, self.content_type)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MmsAddr {
    pub address: String,
    pub addr_type: i32,
    pub charset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mms {
    pub address: String,
    pub date: TimestampMs,
    pub message_box: MessageBox,
    pub subject: Option<String>,
    pub parts: Vec<MmsPart>,
    pub addrs: Vec<MmsAddr>,
    pub contact_name: Option<String>,
    pub rejection_reasons: Vec<String>,
}

impl Record for Mms {
    fn timestamp_ms(&self) -> TimestampMs {
        self.date
    }

    fn fingerprint(&self) -> Hash {
        let parts_fragment = self
            .parts
            .iter()
            .map(MmsPart::fingerprint_fragment)
            .collect::<Vec<_>>()
            .join("\u{3}");
        let canonical = format!(
            "mms\u{1}{}\u{1}{}\u{1}{}\u{1}{}",
            self.address.trim(),
            self.date,
            self.message_box.as_str(),
            parts_fragment,
        );
        Hash::of_bytes(canonical.as_bytes())
    }
}

/// The sum type a reader yields and an importer dispatches on: every SMS
/// backup document may interleave `<sms>` and `<mms>` elements (§6).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Sms(Sms),
    Mms(Mms),
}

impl Record for Message {
    fn timestamp_ms(&self) -> TimestampMs {
        match self {
            Message::Sms(sms) => sms.timestamp_ms(),
            Message::Mms(mms) => mms.timestamp_ms(),
        }
    }

    fn fingerprint(&self) -> Hash {
        match self {
            Message::Sms(sms) => sms.fingerprint(),
            Message::Mms(mms) => mms.fingerprint(),
        }
    }
}

impl Message {
    pub fn contact_name(&self) -> Option<&str> {
        match self {
            Message::Sms(sms) => sms.contact_name.as_deref(),
            Message::Mms(mms) => mms.contact_name.as_deref(),
        }
    }

    pub fn set_contact_name(&mut self, name: String) {
        match self {
            Message::Sms(sms) => sms.contact_name = Some(name),
            Message::Mms(mms) => mms.contact_name = Some(name),
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Message::Sms(sms) => &sms.address,
            Message::Mms(mms) => &mms.address,
        }
    }

    pub fn rejection_reasons_mut(&mut self) -> &mut Vec<String> {
        match self {
            Message::Sms(sms) => &mut sms.rejection_reasons,
            Message::Mms(mms) => &mut mms.rejection_reasons,
        }
    }
}

#[cfg(test)]
#[path = "entities_tests.rs"]
mod tests;
