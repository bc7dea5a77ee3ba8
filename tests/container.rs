// Unit tests for src/container.rs — container creation, opening and the
// in-memory metadata table helpers.

use imgfs::format::{write_metadata_at, EMPTY, HEADER_SIZE, METADATA_SIZE, NON_EMPTY};
use imgfs::{do_create, ImgfsError, ImgfsFile};
use tempfile::TempDir;

const RES: [u16; 4] = [64, 64, 256, 256];

fn scratch() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.imgfs");
    (dir, path)
}

// ── create ────────────────────────────────────────────────────────────────────

#[test]
fn create_writes_header_and_zeroed_table() {
    let (_dir, path) = scratch();
    let fs = do_create(&path, 8, RES).unwrap();
    assert_eq!(fs.header.nb_files, 0);
    assert_eq!(fs.header.version, 0);
    assert_eq!(fs.header.max_files, 8);
    assert!(fs.metadata.iter().all(|m| m.is_valid == EMPTY));

    let len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(len, (HEADER_SIZE + 8 * METADATA_SIZE) as u64);
}

#[test]
fn create_rejects_zero_capacity() {
    let (_dir, path) = scratch();
    assert!(matches!(do_create(&path, 0, RES), Err(ImgfsError::MaxFiles)));
}

#[test]
fn create_rejects_out_of_bounds_resolutions() {
    let (_dir, path) = scratch();
    let too_big_thumb = [200, 64, 256, 256];
    assert!(matches!(
        do_create(&path, 8, too_big_thumb),
        Err(ImgfsError::Resolutions)
    ));
    let zero_small = [64, 64, 0, 256];
    assert!(matches!(
        do_create(&path, 8, zero_small),
        Err(ImgfsError::Resolutions)
    ));
}

// ── open ──────────────────────────────────────────────────────────────────────

#[test]
fn open_mirrors_what_create_wrote() {
    let (_dir, path) = scratch();
    let created = do_create(&path, 4, RES).unwrap();
    drop(created);

    let opened = ImgfsFile::open(&path, false).unwrap();
    assert_eq!(opened.header.max_files, 4);
    assert_eq!(opened.header.resized_res, RES);
    assert_eq!(opened.metadata.len(), 4);
}

#[test]
fn open_rejects_truncated_file() {
    let (_dir, path) = scratch();
    drop(do_create(&path, 4, RES).unwrap());

    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len((HEADER_SIZE + 2 * METADATA_SIZE) as u64).unwrap();
    drop(file);

    assert!(matches!(
        ImgfsFile::open(&path, false),
        Err(ImgfsError::Io(_))
    ));
}

#[test]
fn open_rejects_missing_file() {
    let (_dir, path) = scratch();
    assert!(matches!(
        ImgfsFile::open(&path, false),
        Err(ImgfsError::Io(_))
    ));
}

// ── table helpers ─────────────────────────────────────────────────────────────

fn occupy(fs: &mut ImgfsFile, slot: usize, img_id: &str) {
    fs.metadata[slot].img_id = img_id.to_owned();
    fs.metadata[slot].is_valid = NON_EMPTY;
    write_metadata_at(&mut fs.file, slot, &fs.metadata[slot]).unwrap();
}

#[test]
fn find_by_id_scans_occupied_slots_only() {
    let (_dir, path) = scratch();
    let mut fs = do_create(&path, 4, RES).unwrap();
    occupy(&mut fs, 2, "pic1");
    // A stale identifier in a free slot must not be found.
    fs.metadata[0].img_id = "ghost".to_owned();

    assert_eq!(fs.find_by_id("pic1"), Some(2));
    assert_eq!(fs.find_by_id("ghost"), None);
    assert_eq!(fs.find_by_id("absent"), None);
}

#[test]
fn first_free_slot_returns_lowest_empty_index() {
    let (_dir, path) = scratch();
    let mut fs = do_create(&path, 3, RES).unwrap();
    assert_eq!(fs.first_free_slot(), Some(0));

    occupy(&mut fs, 0, "a");
    assert_eq!(fs.first_free_slot(), Some(1));

    occupy(&mut fs, 1, "b");
    occupy(&mut fs, 2, "c");
    assert_eq!(fs.first_free_slot(), None);
}

#[test]
fn iter_valid_yields_slot_order() {
    let (_dir, path) = scratch();
    let mut fs = do_create(&path, 4, RES).unwrap();
    occupy(&mut fs, 3, "late");
    occupy(&mut fs, 1, "early");

    let ids: Vec<(usize, String)> = fs
        .iter_valid()
        .map(|(slot, m)| (slot, m.img_id.clone()))
        .collect();
    assert_eq!(ids, vec![(1, "early".to_owned()), (3, "late".to_owned())]);
}
