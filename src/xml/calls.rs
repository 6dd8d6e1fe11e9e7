//! Streaming reader/writer for `calls/calls-<YYYY>.xml` documents: root `calls`
//! with `count`, children `<call number duration date type readable_date
//! contact_name rejection_reasons />` (§6).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::entities::{Call, CallType};

use super::{attr_string, parse_error, LimitedReader};

/// Streams `<call>` elements from `reader`, invoking `on_call` for each one in
/// document order. Returns an error (and stops parsing) if `on_call` returns
/// one, or if the document is malformed or exceeds `max_bytes`.
pub fn read_calls<R: Read>(
    reader: R,
    max_bytes: u64,
    source_path: &Path,
    mut on_call: impl FnMut(Call) -> Result<()>,
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
            Event::Empty(e) if e.local_name().as_ref() == b"call" => {
                let call = parse_call(&e, source_path, &xml)?;
                on_call(call)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"call" => {
                let call = parse_call(&e, source_path, &xml)?;
                on_call(call)?;
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

pub fn read_calls_file(path: &Path, max_bytes: u64, on_call: impl FnMut(Call) -> Result<()>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_calls(file, max_bytes, path, on_call)
}

fn parse_call<R>(e: &quick_xml::events::BytesStart, source_path: &Path, xml: &Reader<R>) -> Result<Call> {
    let mut number = None;
    let mut duration = None;
    let mut date = None;
    let mut call_type = None;
    let mut readable_date = None;
    let mut contact_name = None;
    let mut rejection_reasons = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            parse_error(source_path, format!("byte offset {}", xml.buffer_position()), err.to_string())
        })?;
        match attr.key.as_ref() {
            b"number" => number = Some(attr_string(&attr)?),
            b"duration" => duration = Some(attr_string(&attr)?),
            b"date" => date = Some(attr_string(&attr)?),
            b"type" => call_type = Some(attr_string(&attr)?),
            b"readable_date" => readable_date = Some(attr_string(&attr)?),
            b"contact_name" => contact_name = Some(attr_string(&attr)?),
            b"rejection_reasons" => {
                let raw = attr_string(&attr)?;
                rejection_reasons = raw.split(',').filter(|s| !s.is_empty()).map(str::to_owned).collect();
            }
            _ => {} // unknown attributes are tolerated (§4.4 forward compatibility)
        }
    }

    let number = number.unwrap_or_default();
    let duration: i64 = duration
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|_| parse_error(source_path, "call@duration", "not an integer"))?;
    let date: i64 = date
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|_| parse_error(source_path, "call@date", "not an integer"))?;
    let call_type = CallType::from_wire_code(
        call_type
            .as_deref()
            .unwrap_or("0")
            .parse()
            .map_err(|_| parse_error(source_path, "call@type", "not an integer"))?,
    );

    Ok(Call { number, duration, date, call_type, readable_date, contact_name, rejection_reasons })
}

/// Writes a `<calls count="N">...</calls>` document. `count` is always the
/// actual number of `calls` emitted (§3 invariant), never the caller's belief.
pub fn write_calls<W: Write>(writer: W, calls: &[Call]) -> Result<()> {
    let mut out = BufWriter::new(writer);
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<calls count="{}">"#, calls.len())?;
    for call in calls {
        write!(out, r#"  <call number="{}" duration="{}" date="{}" type="{}""#,
            escape(&call.number), call.duration, call.date, call.call_type.to_wire_code())?;
        if let Some(readable_date) = &call.readable_date {
            write!(out, r#" readable_date="{}""#, escape(readable_date))?;
        }
        if let Some(contact_name) = &call.contact_name {
            write!(out, r#" contact_name="{}""#, escape(contact_name))?;
        }
        if !call.rejection_reasons.is_empty() {
            write!(out, r#" rejection_reasons="{}""#, escape(&call.rejection_reasons.join(",")))?;
        }
        writeln!(out, " />")?;
    }
    writeln!(out, "</calls>")?;
    out.flush()?;
    Ok(())
}

pub fn write_calls_file(path: &Path, calls: &[Call]) -> Result<()> {
    // Writers go through the same atomic temp-then-rename discipline as every
    // other artifact (§4.8 "write" state, §4.10); build the bytes in memory
    // first so the atomic_write helper can own the single write+fsync+rename.
    let mut bytes = Vec::new();
    write_calls(&mut bytes, calls)?;
    crate::utils::atomic_write(path, &bytes)
}

fn escape(s: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(s)
}

#[cfg(test)]
#[path = "calls_tests.rs"]
mod tests;
