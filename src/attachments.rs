//! Attachment extractor (§4.7): scans MMS parts, filters by MIME type,
//! decodes inline base64, writes to the blob store, and rewrites the part to
//! reference the stored blob.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;

use crate::blob_store::BlobStore;
use crate::entities::{Mms, PartPayload};
use crate::error::ImportErrorKind;
use crate::hash::Hash;

/// Content-types the extractor leaves untouched regardless of payload (§4.7,
/// §8 boundary behavior).
const SKIP_PREFIXES: &[&str] = &["application/vnd.wap."];
const SKIP_EXACT: &[&str] = &["application/smil", "text/plain", "text/x-vCard"];

fn is_skipped(content_type: &str) -> bool {
    SKIP_EXACT.contains(&content_type) || SKIP_PREFIXES.iter().any(|prefix| content_type.starts_with(prefix))
}

/// Outcome of extracting one MMS's parts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStats {
    /// New blobs written to the store.
    pub extracted: usize,
    /// Parts whose blob already existed (store was a no-op).
    pub referenced: usize,
}

/// Extracts every extractable part of `mms` in place. Transactional: on any
/// decode failure, `mms` is left unmodified and an error is returned so the
/// caller can route the whole message to the rejection sink (§4.7).
pub fn extract(store: &BlobStore, mms: &mut Mms) -> Result<ExtractionStats> {
    // Decode and hash every part first, mutate nothing until every part that
    // needs extracting has succeeded -- a single bad part must not leave
    // siblings half-rewritten (§4.7 "transactional per MMS").
    struct Pending {
        index: usize,
        hash: Hash,
        bytes: Vec<u8>,
    }

    let mut pending = Vec::new();
    for (index, part) in mms.parts.iter().enumerate() {
        if is_skipped(&part.content_type) {
            continue;
        }
        let data_base64 = match &part.payload {
            PartPayload::Inline { data_base64 } if !data_base64.is_empty() => data_base64,
            _ => continue,
        };
        let bytes = BASE64.decode(data_base64.as_bytes()).map_err(|e| {
            anyhow::anyhow!(ImportErrorKind::Processing {
                operation: "attachment extraction",
                identifier: format!("part {index} ({})", part.content_type),
                detail: format!("malformed-attachment: {e}"),
            })
        })?;
        let hash = Hash::of_bytes(&bytes);
        pending.push(Pending { index, hash, bytes });
    }

    let mut stats = ExtractionStats::default();
    for item in pending {
        let already_present = store.exists(&item.hash);
        store.store(&item.hash, &item.bytes).context("failed to store attachment blob")?;
        if already_present {
            stats.referenced += 1;
        } else {
            stats.extracted += 1;
        }

        let part = &mut mms.parts[item.index];
        part.payload = PartPayload::Extracted {
            path: BlobStore::relative_path_for(&item.hash),
            original_size: item.bytes.len() as u64,
            extraction_date: Utc::now(),
        };
    }
    Ok(stats)
}

#[cfg(test)]
#[path = "attachments_tests.rs"]
mod tests;
