use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tempfile::TempDir;

use crate::entities::{MmsAddr, MmsPart};

use super::*;

fn make_mms(parts: Vec<MmsPart>) -> Mms {
    Mms {
        address: "5551234567".to_owned(),
        date: 1000,
        message_box: crate::entities::MessageBox::Received,
        subject: None,
        parts,
        addrs: Vec::<MmsAddr>::new(),
        contact_name: None,
        rejection_reasons: vec![],
    }
}

fn inline_part(seq: i32, content_type: &str, bytes: &[u8]) -> MmsPart {
    MmsPart {
        seq,
        content_type: content_type.to_owned(),
        filename: None,
        payload: PartPayload::Inline { data_base64: BASE64.encode(bytes) },
    }
}

#[test]
fn extracts_image_and_leaves_smil_part_untouched() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());

    let png_bytes = vec![0x89, 0x50, 0x4e, 0x47, 1, 2, 3];
    let smil_bytes = b"<smil>layout</smil>".to_vec();
    let mut mms = make_mms(vec![
        inline_part(0, "image/png", &png_bytes),
        inline_part(1, "application/smil", &smil_bytes),
    ]);

    let stats = extract(&store, &mut mms).unwrap();
    assert_eq!(stats.extracted, 1);
    assert_eq!(stats.referenced, 0);

    match &mms.parts[0].payload {
        PartPayload::Extracted { path, original_size, .. } => {
            assert_eq!(*original_size, png_bytes.len() as u64);
            assert!(store.exists(&Hash::of_bytes(&png_bytes)));
            assert!(path.starts_with("attachments/"));
        }
        other => panic!("expected extracted payload, got {other:?}"),
    }
    match &mms.parts[1].payload {
        PartPayload::Inline { data_base64 } => assert_eq!(data_base64, &BASE64.encode(&smil_bytes)),
        other => panic!("expected smil part untouched, got {other:?}"),
    }
}

#[test]
fn empty_inline_data_on_extractable_type_is_left_untouched() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    let mut mms = make_mms(vec![MmsPart {
        seq: 0,
        content_type: "image/png".to_owned(),
        filename: None,
        payload: PartPayload::Inline { data_base64: String::new() },
    }]);

    let stats = extract(&store, &mut mms).unwrap();
    assert_eq!(stats.extracted, 0);
    assert!(matches!(mms.parts[0].payload, PartPayload::Inline { .. }));
}

#[test]
fn second_mms_referencing_same_bytes_counts_as_referenced() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    let bytes = vec![9u8; 50];

    let mut first = make_mms(vec![inline_part(0, "image/jpeg", &bytes)]);
    let first_stats = extract(&store, &mut first).unwrap();
    assert_eq!(first_stats.extracted, 1);

    let mut second = make_mms(vec![inline_part(0, "image/jpeg", &bytes)]);
    let second_stats = extract(&store, &mut second).unwrap();
    assert_eq!(second_stats.extracted, 0);
    assert_eq!(second_stats.referenced, 1);
}

#[test]
fn malformed_base64_fails_whole_mms_with_no_partial_writes() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    let good_bytes = vec![1u8; 10];
    let mut mms = make_mms(vec![
        inline_part(0, "image/png", &good_bytes),
        MmsPart {
            seq: 1,
            content_type: "image/png".to_owned(),
            filename: None,
            payload: PartPayload::Inline { data_base64: "not valid base64!!".to_owned() },
        },
    ]);

    let result = extract(&store, &mut mms);
    assert!(result.is_err());
    // Transactional: the first part's blob must not have been written, and
    // its payload must remain untouched inline data (§4.7).
    assert!(!store.exists(&Hash::of_bytes(&good_bytes)));
    assert!(matches!(mms.parts[0].payload, PartPayload::Inline { .. }));
}

#[test]
fn vnd_wap_prefix_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = BlobStore::new(dir.path());
    let mut mms = make_mms(vec![inline_part(0, "application/vnd.wap.multipart.related", b"data")]);
    let stats = extract(&store, &mut mms).unwrap();
    assert_eq!(stats.extracted, 0);
    assert!(matches!(mms.parts[0].payload, PartPayload::Inline { .. }));
}
