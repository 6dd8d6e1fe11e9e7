//! Streaming SAX-style XML readers and writers for the native backup format
//! (§4.4, §6). `quick-xml` never resolves external entities or processes DTDs,
//! which is the security baseline the spec asks for; we don't have to do
//! anything extra to get it.

pub mod calls;
pub mod sms;

use std::io::Read;

use anyhow::{Context, Result};

use crate::error::ImportErrorKind;

/// Default per-document byte limit (§4.4, §6): 500 MiB.
pub const DEFAULT_MAX_XML_SIZE: u64 = 500 * 1024 * 1024;

/// Wraps a reader so that reading more than `limit` bytes fails with a
/// structured error instead of silently truncating. A read that lands exactly
/// on `limit` succeeds; the overflow is only detected on the next read call,
/// which is enough to distinguish "file of exactly `limit` bytes" (accepted)
/// from "one byte more" (rejected) per §8's boundary behavior.
pub struct LimitedReader<R> {
    inner: R,
    limit: u64,
    total_read: u64,
}

impl<R: Read> LimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        LimitedReader { inner, limit, total_read: 0 }
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.total_read >= self.limit {
            let mut probe = [0u8; 1];
            return match self.inner.read(&mut probe)? {
                0 => Ok(0),
                _ => Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("xml document exceeds size limit of {} bytes", self.limit),
                )),
            };
        }
        let remaining = (self.limit - self.total_read) as usize;
        let cap = buf.len().min(remaining);
        let n = self.inner.read(&mut buf[..cap])?;
        self.total_read += n as u64;
        Ok(n)
    }
}

/// Converts a `quick_xml` attribute value into an owned, unescaped `String`.
pub(crate) fn attr_string(attr: &quick_xml::events::attributes::Attribute) -> Result<String> {
    Ok(attr.unescape_value().context("failed to unescape attribute value")?.into_owned())
}

pub(crate) fn parse_error(path: &std::path::Path, context: impl Into<String>, detail: impl Into<String>) -> anyhow::Error {
    anyhow::anyhow!(ImportErrorKind::Parsing {
        path: path.to_path_buf(),
        context: context.into(),
        detail: detail.into(),
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
