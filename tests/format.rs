// Unit tests for src/format.rs — the fixed-layout container codec.

use imgfs::format::{
    metadata_offset, read_header, write_header, Header, ImgMetadata, Resolution, EMPTY,
    HEADER_SIZE, METADATA_SIZE, NON_EMPTY,
};

fn sample_header() -> Header {
    Header {
        name: "imgFS container v1".to_owned(),
        version: 7,
        nb_files: 3,
        max_files: 128,
        resized_res: [64, 64, 256, 256],
    }
}

fn sample_metadata() -> ImgMetadata {
    ImgMetadata {
        img_id: "pic1".to_owned(),
        sha: [0xab; 32],
        orig_res: [800, 600],
        size: [0, 0, 12345],
        offset: [0, 0, 27776],
        is_valid: NON_EMPTY,
    }
}

// ── Layout sizes ──────────────────────────────────────────────────────────────

#[test]
fn header_encodes_to_fixed_size() {
    assert_eq!(sample_header().encode().len(), HEADER_SIZE);
    assert_eq!(HEADER_SIZE, 64);
}

#[test]
fn metadata_encodes_to_fixed_size() {
    assert_eq!(sample_metadata().encode().len(), METADATA_SIZE);
    assert_eq!(METADATA_SIZE, 216);
}

#[test]
fn metadata_offset_arithmetic() {
    assert_eq!(metadata_offset(0), HEADER_SIZE as u64);
    assert_eq!(
        metadata_offset(5),
        (HEADER_SIZE + 5 * METADATA_SIZE) as u64
    );
}

// ── Round trips ───────────────────────────────────────────────────────────────

#[test]
fn header_roundtrip() {
    let header = sample_header();
    let decoded = Header::decode(&header.encode()).unwrap();
    assert_eq!(decoded, header);
}

#[test]
fn metadata_roundtrip() {
    let record = sample_metadata();
    let decoded = ImgMetadata::decode(&record.encode()).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn zeroed_metadata_decodes_as_empty_slot() {
    let decoded = ImgMetadata::decode(&[0u8; METADATA_SIZE]).unwrap();
    assert_eq!(decoded.is_valid, EMPTY);
    assert_eq!(decoded.img_id, "");
    assert_eq!(decoded.offset, [0, 0, 0]);
}

#[test]
fn decode_rejects_short_input() {
    assert!(Header::decode(&[0u8; HEADER_SIZE - 1]).is_err());
    assert!(ImgMetadata::decode(&[0u8; METADATA_SIZE - 1]).is_err());
}

// ── Field placement and padding ───────────────────────────────────────────────

#[test]
fn header_name_is_nul_padded() {
    let buf = sample_header().encode();
    let name = b"imgFS container v1";
    assert_eq!(&buf[..name.len()], name);
    assert!(buf[name.len()..32].iter().all(|&b| b == 0));
}

#[test]
fn header_reserved_bytes_stay_zero() {
    let buf = sample_header().encode();
    assert!(buf[52..64].iter().all(|&b| b == 0));
}

#[test]
fn over_long_name_is_truncated_not_overflowed() {
    let mut header = sample_header();
    header.name = "x".repeat(100);
    let decoded = Header::decode(&header.encode()).unwrap();
    assert_eq!(decoded.name.len(), 31);
}

#[test]
fn img_id_field_is_nul_terminated() {
    let buf = sample_metadata().encode();
    assert_eq!(&buf[..4], b"pic1");
    assert_eq!(buf[4], 0);
}

#[test]
fn is_valid_sits_after_the_offset_triple() {
    let buf = sample_metadata().encode();
    let raw = u16::from_ne_bytes([buf[208], buf[209]]);
    assert_eq!(raw, NON_EMPTY);
}

// ── Resolution parsing ────────────────────────────────────────────────────────

#[test]
fn resolution_accepts_both_spellings() {
    assert_eq!(Resolution::parse("thumb"), Some(Resolution::Thumb));
    assert_eq!(Resolution::parse("thumbnail"), Some(Resolution::Thumb));
    assert_eq!(Resolution::parse("small"), Some(Resolution::Small));
    assert_eq!(Resolution::parse("orig"), Some(Resolution::Orig));
    assert_eq!(Resolution::parse("original"), Some(Resolution::Orig));
}

#[test]
fn resolution_rejects_anything_else() {
    assert_eq!(Resolution::parse(""), None);
    assert_eq!(Resolution::parse("Thumb"), None);
    assert_eq!(Resolution::parse("medium"), None);
}

#[test]
fn resolution_indexes_match_the_record_layout() {
    assert_eq!(Resolution::Thumb.index(), 0);
    assert_eq!(Resolution::Small.index(), 1);
    assert_eq!(Resolution::Orig.index(), 2);
}

// ── Positioned file I/O ───────────────────────────────────────────────────────

#[test]
fn header_file_roundtrip() {
    let mut file = tempfile::tempfile().unwrap();
    let header = sample_header();
    write_header(&mut file, &header).unwrap();
    assert_eq!(read_header(&mut file).unwrap(), header);
}
