//! Streaming reader/writer for `sms/sms-<YYYY>.xml` documents: root `smses`
//! with `count`, children `<sms .../>` and `<mms .../>` interleaved, the
//! latter with nested `<parts>`/`<part>` and optional `<addrs>`/`<addr>` (§6).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::entities::{Message, MessageBox, Mms, MmsAddr, MmsPart, PartPayload, Sms};

use super::{attr_string, parse_error, LimitedReader};

/// Streams `<sms>`/`<mms>` elements from `reader`, invoking `on_message` for
/// each one in document order.
pub fn read_messages<R: Read>(
    reader: R,
    max_bytes: u64,
    source_path: &Path,
    mut on_message: impl FnMut(Message) -> Result<()>,
) -> Result<()> {
    let limited = LimitedReader::new(reader, max_bytes);
    let buffered = BufReader::new(limited);
    let mut xml = Reader::from_reader(buffered);
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        let event = xml.read_event_into(&mut buf).map_err(|e| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), e.to_string())
        })?;
        match event {
            Event::Eof => break,
            Event::Empty(e) if e.local_name().as_ref() == b"sms" => {
                on_message(Message::Sms(parse_sms(&e, source_path, &xml)?))?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"sms" => {
                on_message(Message::Sms(parse_sms(&e, source_path, &xml)?))?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"mms" => {
                let owned = e.into_owned();
                let mms = parse_mms(&owned, &mut xml, &mut buf, source_path)?;
                on_message(Message::Mms(mms))?;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"mms" => {
                // An <mms/> with no parts at all -- unusual but valid.
                let mms = parse_mms_attrs(&e, source_path, &xml)?;
                on_message(Message::Mms(mms))?;
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

pub fn read_messages_file(path: &Path, max_bytes: u64, on_message: impl FnMut(Message) -> Result<()>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_messages(file, max_bytes, path, on_message)
}

fn parse_sms<R>(e: &BytesStart, source_path: &Path, xml: &Reader<R>) -> Result<Sms> {
    let mut address = None;
    let mut date = None;
    let mut message_type = None;
    let mut body = None;
    let mut readable_date = None;
    let mut contact_name = None;
    let mut rejection_reasons = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), err.to_string())
        })?;
        match attr.key.as_ref() {
            b"address" => address = Some(attr_string(&attr)?),
            b"date" => date = Some(attr_string(&attr)?),
            b"type" => message_type = Some(attr_string(&attr)?),
            b"body" => body = Some(attr_string(&attr)?),
            b"readable_date" => readable_date = Some(attr_string(&attr)?),
            b"contact_name" => contact_name = Some(attr_string(&attr)?),
            b"rejection_reasons" => {
                let raw = attr_string(&attr)?;
                rejection_reasons = raw.split(',').filter(|s| !s.is_empty()).map(str::to_owned).collect();
            }
            _ => {}
        }
    }

    let date: i64 = date
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|_| parse_error(source_path, "sms@date", "not an integer"))?;
    let message_type = MessageBox::from_wire_code(
        message_type
            .as_deref()
            .unwrap_or("0")
            .parse()
            .map_err(|_| parse_error(source_path, "sms@type", "not an integer"))?,
    );

    Ok(Sms {
        address: address.unwrap_or_default(),
        date,
        message_type,
        body: body.unwrap_or_default(),
        readable_date,
        contact_name,
        rejection_reasons,
    })
}

fn parse_mms_attrs<R>(e: &BytesStart, source_path: &Path, xml: &Reader<R>) -> Result<Mms> {
    let mut address = None;
    let mut date = None;
    let mut message_box = None;
    let mut subject = None;
    let mut contact_name = None;
    let mut rejection_reasons = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), err.to_string())
        })?;
        match attr.key.as_ref() {
            b"address" => address = Some(attr_string(&attr)?),
            b"date" => date = Some(attr_string(&attr)?),
            b"msg_box" => message_box = Some(attr_string(&attr)?),
            b"subject" => subject = Some(attr_string(&attr)?),
            b"contact_name" => contact_name = Some(attr_string(&attr)?),
            b"rejection_reasons" => {
                let raw = attr_string(&attr)?;
                rejection_reasons = raw.split(',').filter(|s| !s.is_empty()).map(str::to_owned).collect();
            }
            _ => {}
        }
    }

    let date: i64 = date
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|_| parse_error(source_path, "mms@date", "not an integer"))?;
    let message_box = MessageBox::from_wire_code(
        message_box
            .as_deref()
            .unwrap_or("0")
            .parse()
            .map_err(|_| parse_error(source_path, "mms@msg_box", "not an integer"))?,
    );
    let subject = subject.filter(|s| !s.is_empty());

    Ok(Mms {
        address: address.unwrap_or_default(),
        date,
        message_box,
        subject,
        parts: Vec::new(),
        addrs: Vec::new(),
        contact_name,
        rejection_reasons,
    })
}

fn parse_mms<R: Read>(
    start: &BytesStart,
    xml: &mut Reader<BufReader<LimitedReader<R>>>,
    buf: &mut Vec<u8>,
    source_path: &Path,
) -> Result<Mms> {
    let mut mms = parse_mms_attrs(start, source_path, xml)?;

    loop {
        let event = xml.read_event_into(buf).map_err(|e| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), e.to_string())
        })?;
        match event {
            Event::End(e) if e.local_name().as_ref() == b"mms" => break,
            Event::Eof => {
                return Err(parse_error(source_path, "mms", "unexpected end of document inside <mms>"))
            }
            Event::Start(e) if e.local_name().as_ref() == b"parts" => {
                mms.parts = parse_parts(xml, buf, source_path)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"addrs" => {
                mms.addrs = parse_addrs(xml, buf, source_path)?;
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(mms)
}

fn parse_parts<R: Read>(
    xml: &mut Reader<BufReader<LimitedReader<R>>>,
    buf: &mut Vec<u8>,
    source_path: &Path,
) -> Result<Vec<MmsPart>> {
    let mut parts = Vec::new();
    loop {
        let event = xml.read_event_into(buf).map_err(|e| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), e.to_string())
        })?;
        match event {
            Event::End(e) if e.local_name().as_ref() == b"parts" => break,
            Event::Eof => {
                return Err(parse_error(source_path, "parts", "unexpected end of document inside <parts>"))
            }
            Event::Empty(e) if e.local_name().as_ref() == b"part" => {
                parts.push(parse_part(&e, source_path, xml)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"part" => {
                parts.push(parse_part(&e, source_path, xml)?);
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(parts)
}

fn parse_part<R>(e: &BytesStart, source_path: &Path, xml: &Reader<R>) -> Result<MmsPart> {
    let mut seq = None;
    let mut content_type = None;
    let mut filename = None;
    let mut data = None;
    let mut path = None;
    let mut original_size = None;
    let mut extraction_date = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), err.to_string())
        })?;
        match attr.key.as_ref() {
            b"seq" => seq = Some(attr_string(&attr)?),
            b"ct" => content_type = Some(attr_string(&attr)?),
            b"fn" => filename = Some(attr_string(&attr)?),
            b"data" => data = Some(attr_string(&attr)?),
            b"path" => path = Some(attr_string(&attr)?),
            b"original_size" => original_size = Some(attr_string(&attr)?),
            b"extraction_date" => extraction_date = Some(attr_string(&attr)?),
            _ => {}
        }
    }

    let seq: i32 = seq
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|_| parse_error(source_path, "part@seq", "not an integer"))?;
    let filename = filename.filter(|s| !s.is_empty());

    let payload = if let Some(path) = path {
        let original_size: u64 = original_size
            .as_deref()
            .unwrap_or("0")
            .parse()
            .map_err(|_| parse_error(source_path, "part@original_size", "not an integer"))?;
        let extraction_date = extraction_date
            .as_deref()
            .map(|s| {
                chrono::DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .map_err(|_| parse_error(source_path, "part@extraction_date", "not RFC 3339"))
            })
            .transpose()?
            .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).unwrap());
        PartPayload::Extracted { path, original_size, extraction_date }
    } else {
        match data {
            Some(data) if !data.is_empty() => PartPayload::Inline { data_base64: data },
            _ => PartPayload::None,
        }
    };

    Ok(MmsPart { seq, content_type: content_type.unwrap_or_default(), filename, payload })
}

fn parse_addrs<R: Read>(
    xml: &mut Reader<BufReader<LimitedReader<R>>>,
    buf: &mut Vec<u8>,
    source_path: &Path,
) -> Result<Vec<MmsAddr>> {
    let mut addrs = Vec::new();
    loop {
        let event = xml.read_event_into(buf).map_err(|e| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), e.to_string())
        })?;
        match event {
            Event::End(e) if e.local_name().as_ref() == b"addrs" => break,
            Event::Eof => {
                return Err(parse_error(source_path, "addrs", "unexpected end of document inside <addrs>"))
            }
            Event::Empty(e) if e.local_name().as_ref() == b"addr" => {
                addrs.push(parse_addr(&e, source_path, xml)?);
            }
            Event::Start(e) if e.local_name().as_ref() == b"addr" => {
                addrs.push(parse_addr(&e, source_path, xml)?);
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(addrs)
}

fn parse_addr<R>(e: &BytesStart, source_path: &Path, xml: &Reader<R>) -> Result<MmsAddr> {
    let mut address = None;
    let mut addr_type = None;
    let mut charset = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), err.to_string())
        })?;
        match attr.key.as_ref() {
            b"address" => address = Some(attr_string(&attr)?),
            b"type" => addr_type = Some(attr_string(&attr)?),
            b"charset" => charset = Some(attr_string(&attr)?),
            _ => {}
        }
    }
    let addr_type: i32 = addr_type.as_deref().unwrap_or("0").parse().unwrap_or(0);
    Ok(MmsAddr { address: address.unwrap_or_default(), addr_type, charset })
}

/// Writes a `<smses count="N">...</smses>` document, `<sms>`/`<mms>` emitted
/// in the order given by the caller (the coalescer's year-partitioned order).
pub fn write_messages<W: Write>(writer: W, messages: &[Message]) -> Result<()> {
    let mut out = BufWriter::new(writer);
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<smses count="{}">"#, messages.len())?;
    for message in messages {
        match message {
            Message::Sms(sms) => write_sms(&mut out, sms)?,
            Message::Mms(mms) => write_mms(&mut out, mms)?,
        }
    }
    writeln!(out, "</smses>")?;
    out.flush()?;
    Ok(())
}

fn write_sms<W: Write>(out: &mut W, sms: &Sms) -> Result<()> {
    write!(out, r#"  <sms address="{}" date="{}" type="{}" body="{}""#,
        escape(&sms.address), sms.date, sms.message_type.to_wire_code(), escape(&sms.body))?;
    if let Some(readable_date) = &sms.readable_date {
        write!(out, r#" readable_date="{}""#, escape(readable_date))?;
    }
    if let Some(contact_name) = &sms.contact_name {
        write!(out, r#" contact_name="{}""#, escape(contact_name))?;
    }
    if !sms.rejection_reasons.is_empty() {
        write!(out, r#" rejection_reasons="{}""#, escape(&sms.rejection_reasons.join(",")))?;
    }
    writeln!(out, " />")?;
    Ok(())
}

fn write_mms<W: Write>(out: &mut W, mms: &Mms) -> Result<()> {
    write!(out, r#"  <mms address="{}" date="{}" msg_box="{}""#,
        escape(&mms.address), mms.date, mms.message_box.to_wire_code())?;
    if let Some(subject) = &mms.subject {
        write!(out, r#" subject="{}""#, escape(subject))?;
    }
    if let Some(contact_name) = &mms.contact_name {
        write!(out, r#" contact_name="{}""#, escape(contact_name))?;
    }
    if !mms.rejection_reasons.is_empty() {
        write!(out, r#" rejection_reasons="{}""#, escape(&mms.rejection_reasons.join(",")))?;
    }
    writeln!(out, ">")?;

    writeln!(out, "    <parts>")?;
    for part in &mms.parts {
        write!(out, r#"      <part seq="{}" ct="{}""#, part.seq, escape(&part.content_type))?;
        if let Some(filename) = &part.filename {
            write!(out, r#" fn="{}""#, escape(filename))?;
        }
        match &part.payload {
            PartPayload::Inline { data_base64 } => {
                write!(out, r#" data="{}""#, escape(data_base64))?;
            }
            PartPayload::Extracted { path, original_size, extraction_date } => {
                write!(
                    out,
                    r#" path="{}" original_size="{}" extraction_date="{}""#,
                    escape(path),
                    original_size,
                    extraction_date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                )?;
            }
            PartPayload::None => {}
        }
        writeln!(out, " />")?;
    }
    writeln!(out, "    </parts>")?;

    if !mms.addrs.is_empty() {
        writeln!(out, "    <addrs>")?;
        for addr in &mms.addrs {
            write!(out, r#"      <addr address="{}" type="{}""#, escape(&addr.address), addr.addr_type)?;
            if let Some(charset) = &addr.charset {
                write!(out, r#" charset="{}""#, escape(charset))?;
            }
            writeln!(out, " />")?;
        }
        writeln!(out, "    </addrs>")?;
    }

    writeln!(out, "  </mms>")?;
    Ok(())
}

pub fn write_messages_file(path: &Path, messages: &[Message]) -> Result<()> {
    let mut bytes = Vec::new();
    write_messages(&mut bytes, messages)?;
    crate::utils::atomic_write(path, &bytes)
}

fn escape(s: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(s)
}

#[cfg(test)]
#[path = "sms_tests.rs"]
mod tests;
