// e2e/cli_integration.rs — black-box tests of the `imgfscmd` binary via
// std::process::Command.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

/// Locate the `imgfscmd` binary produced by Cargo.
fn imgfscmd_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_imgfscmd"))
}

fn make_jpeg_file(dir: &TempDir, name: &str, width: u32, height: u32, seed: u8) -> PathBuf {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([seed.wrapping_add(x as u8), seed ^ (y as u8), seed])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, buf).unwrap();
    path
}

fn run_in(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(imgfscmd_bin())
        .args(args)
        .current_dir(dir.path())
        .output()
        .expect("failed to run imgfscmd")
}

// ── help ──────────────────────────────────────────────────────────────────────

#[test]
fn help_prints_usage_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["help"]);
    assert_eq!(output.status.code(), Some(0));
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.to_lowercase().contains("usage"));
}

#[test]
fn missing_subcommand_fails_with_help() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &[]);
    assert_ne!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR:"));
}

// ── create / list ─────────────────────────────────────────────────────────────

#[test]
fn create_then_list_shows_an_empty_container() {
    let dir = TempDir::new().unwrap();
    let created = run_in(&dir, &["create", "t.imgfs", "-m", "10"]);
    assert_eq!(created.status.code(), Some(0), "create failed");
    assert!(String::from_utf8_lossy(&created.stdout).contains("11 item(s) written"));

    let listed = run_in(&dir, &["list", "t.imgfs"]);
    assert_eq!(listed.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&listed.stdout);
    assert!(stdout.contains("<< empty imgFS >>"));
    assert!(stdout.contains("MAX IMAGES: 10"));
}

#[test]
fn create_rejects_oversized_thumb_resolution() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["create", "t.imgfs", "-t", "300", "300"]);
    // Resolutions error kind.
    assert_eq!(output.status.code(), Some(11));
}

// ── insert / read / delete lifecycle ──────────────────────────────────────────

#[test]
fn insert_read_delete_lifecycle() {
    let dir = TempDir::new().unwrap();
    let jpeg = make_jpeg_file(&dir, "input.jpg", 400, 300, 5);
    assert_eq!(run_in(&dir, &["create", "t.imgfs"]).status.code(), Some(0));

    let inserted = run_in(&dir, &["insert", "t.imgfs", "pic1", jpeg.to_str().unwrap()]);
    assert_eq!(inserted.status.code(), Some(0), "insert failed");

    let listed = run_in(&dir, &["list", "t.imgfs"]);
    assert!(String::from_utf8_lossy(&listed.stdout).contains("pic1"));

    // Default resolution extracts the original bytes.
    assert_eq!(run_in(&dir, &["read", "t.imgfs", "pic1"]).status.code(), Some(0));
    let extracted = dir.path().join("pic1_orig.jpg");
    assert_eq!(std::fs::read(&extracted).unwrap(), std::fs::read(&jpeg).unwrap());

    // A small variant lands in its own file and decodes within bounds.
    assert_eq!(
        run_in(&dir, &["read", "t.imgfs", "pic1", "small"]).status.code(),
        Some(0)
    );
    let small = std::fs::read(dir.path().join("pic1_small.jpg")).unwrap();
    let decoded = image::load_from_memory(&small).unwrap();
    use image::GenericImageView;
    let (w, h) = decoded.dimensions();
    assert!(w <= 256 && h <= 256);

    assert_eq!(run_in(&dir, &["delete", "t.imgfs", "pic1"]).status.code(), Some(0));
    let relisted = run_in(&dir, &["list", "t.imgfs"]);
    assert!(String::from_utf8_lossy(&relisted.stdout).contains("<< empty imgFS >>"));
}

// ── Error exit codes ──────────────────────────────────────────────────────────

#[test]
fn deleting_an_absent_image_exits_with_its_error_kind() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_in(&dir, &["create", "t.imgfs"]).status.code(), Some(0));
    let output = run_in(&dir, &["delete", "t.imgfs", "nope"]);
    // ImageNotFound error kind.
    assert_eq!(output.status.code(), Some(9));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR:"));
}

#[test]
fn inserting_a_duplicate_identifier_exits_with_its_error_kind() {
    let dir = TempDir::new().unwrap();
    let jpeg = make_jpeg_file(&dir, "input.jpg", 100, 100, 1);
    assert_eq!(run_in(&dir, &["create", "t.imgfs"]).status.code(), Some(0));
    let jpeg_arg = jpeg.to_str().unwrap();
    assert_eq!(
        run_in(&dir, &["insert", "t.imgfs", "dup", jpeg_arg]).status.code(),
        Some(0)
    );
    let output = run_in(&dir, &["insert", "t.imgfs", "dup", jpeg_arg]);
    // DuplicateId error kind.
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn reading_with_an_unknown_resolution_exits_with_its_error_kind() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_in(&dir, &["create", "t.imgfs"]).status.code(), Some(0));
    let output = run_in(&dir, &["read", "t.imgfs", "pic1", "gigantic"]);
    // Resolutions error kind.
    assert_eq!(output.status.code(), Some(11));
}

#[test]
fn listing_a_missing_container_exits_with_an_io_error() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["list", "absent.imgfs"]);
    // Io error kind.
    assert_eq!(output.status.code(), Some(3));
}
