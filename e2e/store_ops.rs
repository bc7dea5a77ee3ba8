// e2e/store_ops.rs — end-to-end store scenarios driven through the public
// library API with generated JPEGs.

use std::io::Cursor;

use imgfs::format::{Resolution, EMPTY, NON_EMPTY};
use imgfs::{do_create, do_delete, do_insert, do_list, do_read, ImgfsError, ImgfsFile, ListMode};
use tempfile::TempDir;

const RES: [u16; 4] = [64, 64, 256, 256];

fn make_jpeg(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([seed.wrapping_add(x as u8), seed ^ (y as u8), seed.wrapping_mul(3)])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn jpeg_dimensions(buf: &[u8]) -> (u32, u32) {
    use image::GenericImageView;
    image::load_from_memory(buf).unwrap().dimensions()
}

fn fresh(max_files: u32) -> (TempDir, std::path::PathBuf, ImgfsFile) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("t.imgfs");
    let fs = do_create(&path, max_files, RES).unwrap();
    (dir, path, fs)
}

// ── Scenario: create / insert / read / delete ─────────────────────────────────

#[test]
fn full_image_lifecycle() {
    let (_dir, _path, mut fs) = fresh(10);
    let jpeg = make_jpeg(800, 600, 1);

    do_insert(&jpeg, "pic1", &mut fs).unwrap();
    assert_eq!(fs.header.nb_files, 1);
    assert_eq!(
        do_list(&fs, ListMode::Json).unwrap(),
        r#"{"Images":["pic1"]}"#
    );

    let orig = do_read("pic1", Resolution::Orig, &mut fs).unwrap();
    assert_eq!(orig, jpeg);

    let thumb = do_read("pic1", Resolution::Thumb, &mut fs).unwrap();
    let (w, h) = jpeg_dimensions(&thumb);
    assert!(w <= 64 && h <= 64, "thumbnail {w}x{h} exceeds its box");

    do_delete("pic1", &mut fs).unwrap();
    assert_eq!(fs.header.nb_files, 0);
    assert_eq!(do_list(&fs, ListMode::Json).unwrap(), r#"{"Images":[]}"#);
}

#[test]
fn original_dimensions_are_recorded_on_insert() {
    let (_dir, _path, mut fs) = fresh(4);
    do_insert(&make_jpeg(320, 200, 4), "dim", &mut fs).unwrap();
    let slot = fs.find_by_id("dim").unwrap();
    assert_eq!(fs.metadata[slot].orig_res, [320, 200]);
}

// ── Scenario: content dedup ───────────────────────────────────────────────────

#[test]
fn identical_bytes_share_the_blob() {
    let (_dir, path, mut fs) = fresh(10);
    let jpeg = make_jpeg(100, 80, 2);

    do_insert(&jpeg, "a", &mut fs).unwrap();
    let len_after_first = std::fs::metadata(&path).unwrap().len();

    do_insert(&jpeg, "b", &mut fs).unwrap();
    let len_after_second = std::fs::metadata(&path).unwrap().len();

    // The second insert rewrites metadata in place; no blob bytes appended.
    assert_eq!(len_after_first, len_after_second);

    let (ia, ib) = (fs.find_by_id("a").unwrap(), fs.find_by_id("b").unwrap());
    assert_eq!(fs.metadata[ia].offset, fs.metadata[ib].offset);
    assert_eq!(fs.metadata[ia].size, fs.metadata[ib].size);
}

// ── Scenario: duplicate identifier ────────────────────────────────────────────

#[test]
fn duplicate_identifier_leaves_the_container_untouched() {
    let (_dir, path, mut fs) = fresh(10);
    do_insert(&make_jpeg(50, 50, 3), "pic1", &mut fs).unwrap();

    let before = std::fs::read(&path).unwrap();
    let err = do_insert(&make_jpeg(60, 60, 4), "pic1", &mut fs);
    assert!(matches!(err, Err(ImgfsError::DuplicateId)));

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(fs.header.nb_files, 1);
    // The failed insert must not leave a ghost slot in memory either.
    assert_eq!(fs.iter_valid().count(), 1);
}

// ── Capacity bound ────────────────────────────────────────────────────────────

#[test]
fn the_insert_after_capacity_fails_full() {
    let (_dir, _path, mut fs) = fresh(2);
    do_insert(&make_jpeg(20, 20, 1), "one", &mut fs).unwrap();
    do_insert(&make_jpeg(20, 20, 2), "two", &mut fs).unwrap();
    assert!(matches!(
        do_insert(&make_jpeg(20, 20, 3), "three", &mut fs),
        Err(ImgfsError::ImgfsFull)
    ));
    assert_eq!(fs.header.nb_files, 2);
}

#[test]
fn deleting_frees_a_slot_for_reuse() {
    let (_dir, _path, mut fs) = fresh(2);
    do_insert(&make_jpeg(20, 20, 1), "one", &mut fs).unwrap();
    do_insert(&make_jpeg(20, 20, 2), "two", &mut fs).unwrap();
    do_delete("one", &mut fs).unwrap();
    do_insert(&make_jpeg(20, 20, 5), "again", &mut fs).unwrap();
    assert_eq!(fs.header.nb_files, 2);
    assert_eq!(fs.find_by_id("again"), Some(0));
}

// ── Delete semantics ──────────────────────────────────────────────────────────

#[test]
fn second_delete_reports_image_not_found() {
    let (_dir, _path, mut fs) = fresh(4);
    do_insert(&make_jpeg(30, 30, 9), "pic", &mut fs).unwrap();
    do_delete("pic", &mut fs).unwrap();
    assert!(matches!(
        do_delete("pic", &mut fs),
        Err(ImgfsError::ImageNotFound)
    ));
    assert!(!do_list(&fs, ListMode::Json).unwrap().contains("pic"));
}

#[test]
fn delete_marks_the_slot_empty_on_disk() {
    let (_dir, path, mut fs) = fresh(4);
    do_insert(&make_jpeg(30, 30, 9), "pic", &mut fs).unwrap();
    do_delete("pic", &mut fs).unwrap();
    drop(fs);

    let reopened = ImgfsFile::open(&path, false).unwrap();
    assert_eq!(reopened.header.nb_files, 0);
    assert!(reopened.metadata.iter().all(|m| m.is_valid == EMPTY));
}

// ── Lazy resize ───────────────────────────────────────────────────────────────

#[test]
fn lazy_resize_is_idempotent_and_stable() {
    let (_dir, path, mut fs) = fresh(4);
    do_insert(&make_jpeg(800, 600, 6), "pic", &mut fs).unwrap();

    let first = do_read("pic", Resolution::Thumb, &mut fs).unwrap();
    let slot = fs.find_by_id("pic").unwrap();
    let offset_after_first = fs.metadata[slot].offset[Resolution::Thumb.index()];
    assert_ne!(offset_after_first, 0);
    let len_after_first = std::fs::metadata(&path).unwrap().len();

    let second = do_read("pic", Resolution::Thumb, &mut fs).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        fs.metadata[slot].offset[Resolution::Thumb.index()],
        offset_after_first
    );
    // No second blob appended.
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len_after_first);
}

#[test]
fn small_variant_fits_the_configured_box() {
    let (_dir, _path, mut fs) = fresh(4);
    do_insert(&make_jpeg(800, 600, 8), "pic", &mut fs).unwrap();
    let small = do_read("pic", Resolution::Small, &mut fs).unwrap();
    let (w, h) = jpeg_dimensions(&small);
    assert!(w <= 256 && h <= 256, "small variant {w}x{h} exceeds its box");
}

#[test]
fn resized_variants_survive_reopening() {
    let (_dir, path, mut fs) = fresh(4);
    do_insert(&make_jpeg(400, 300, 2), "keep", &mut fs).unwrap();
    let thumb = do_read("keep", Resolution::Thumb, &mut fs).unwrap();
    drop(fs);

    let mut reopened = ImgfsFile::open(&path, true).unwrap();
    let slot = reopened.find_by_id("keep").unwrap();
    assert_ne!(reopened.metadata[slot].offset[Resolution::Thumb.index()], 0);
    assert_eq!(do_read("keep", Resolution::Thumb, &mut reopened).unwrap(), thumb);
}

// ── Version monotonicity ──────────────────────────────────────────────────────

#[test]
fn every_mutation_bumps_the_version_and_nothing_else_does() {
    let (_dir, _path, mut fs) = fresh(4);
    assert_eq!(fs.header.version, 0);

    do_insert(&make_jpeg(100, 100, 1), "a", &mut fs).unwrap();
    let after_insert = fs.header.version;
    assert!(after_insert > 0);

    do_list(&fs, ListMode::Json).unwrap();
    assert_eq!(fs.header.version, after_insert);

    // Failed mutation: duplicate identifier.
    let _ = do_insert(&make_jpeg(100, 100, 1), "a", &mut fs);
    assert_eq!(fs.header.version, after_insert);

    do_read("a", Resolution::Thumb, &mut fs).unwrap();
    let after_resize = fs.header.version;
    assert!(after_resize > after_insert);

    // Second read of a materialised variant is not a mutation.
    do_read("a", Resolution::Thumb, &mut fs).unwrap();
    assert_eq!(fs.header.version, after_resize);

    do_delete("a", &mut fs).unwrap();
    assert!(fs.header.version > after_resize);
}

// ── Structural invariants after a mixed workload ──────────────────────────────

#[test]
fn valid_records_always_have_a_materialised_original() {
    let (_dir, _path, mut fs) = fresh(8);
    for i in 0..5u8 {
        do_insert(&make_jpeg(64 + u32::from(i), 64, i), &format!("img{i}"), &mut fs).unwrap();
    }
    do_delete("img2", &mut fs).unwrap();
    do_read("img3", Resolution::Small, &mut fs).unwrap();

    for (_, record) in fs.iter_valid() {
        assert_eq!(record.is_valid, NON_EMPTY);
        assert_ne!(record.offset[Resolution::Orig.index()], 0);
        // offset[r] == 0 iff size[r] == 0 for the sub-resolutions.
        for r in [Resolution::Thumb, Resolution::Small] {
            assert_eq!(
                record.offset[r.index()] == 0,
                record.size[r.index()] == 0
            );
        }
    }
    assert_eq!(fs.header.nb_files, fs.iter_valid().count() as u32);
}
