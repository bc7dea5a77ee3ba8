// e2e/http_server.rs — black-box tests of the `imgfs_server` binary over
// real TCP connections, including the concurrent-insert scenario.

use std::io::{Cursor, Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use imgfs::format::Resolution;
use tempfile::TempDir;

const RES: [u16; 4] = [64, 64, 256, 256];

fn make_jpeg(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([seed.wrapping_add(x as u8), seed ^ (y as u8), seed])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

/// Child process that is killed when the test ends, pass or fail.
struct ServerGuard {
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn start_server(port: u16, max_files: u32) -> (TempDir, PathBuf, ServerGuard) {
    let dir = TempDir::new().unwrap();
    let container = dir.path().join("t.imgfs");
    drop(imgfs::do_create(&container, max_files, RES).unwrap());
    std::fs::write(dir.path().join("index.html"), "<html><body>imgFS</body></html>").unwrap();

    let child = Command::new(env!("CARGO_BIN_EXE_imgfs_server"))
        .args(["t.imgfs", &port.to_string()])
        .current_dir(dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn imgfs_server");
    let guard = ServerGuard { child };

    // Wait for the listener to come up.
    for _ in 0..200 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return (dir, container, guard);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("imgfs_server did not start listening on port {port}");
}

/// Send one raw request, read the whole reply (the server closes the
/// connection after responding), and split it into head and body.
fn request(port: u16, raw: &[u8]) -> (String, Vec<u8>) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.write_all(raw).unwrap();
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).unwrap();

    let split = reply
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("reply without header terminator");
    let head = String::from_utf8_lossy(&reply[..split]).into_owned();
    (head, reply[split + 4..].to_vec())
}

fn get(port: u16, target: &str) -> (String, Vec<u8>) {
    request(port, format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes())
}

fn post(port: u16, target: &str, body: &[u8]) -> (String, Vec<u8>) {
    let mut raw = format!(
        "POST {target} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);
    request(port, &raw)
}

// ── Listing ───────────────────────────────────────────────────────────────────

#[test]
fn list_on_an_empty_container_returns_empty_json() {
    let (_dir, _container, _guard) = start_server(18301, 8);
    let (head, body) = get(18301, "/imgfs/list");
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Type: application/json"));
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["Images"], serde_json::json!([]));
}

// ── Upload / read / delete flow ───────────────────────────────────────────────

#[test]
fn upload_read_delete_flow() {
    let (_dir, _container, _guard) = start_server(18302, 8);
    let jpeg = make_jpeg(800, 600, 7);

    let (head, _) = post(18302, "/imgfs/insert?name=pic1", &jpeg);
    assert!(head.starts_with("HTTP/1.1 302 Found"));
    assert!(head.contains("Location: /index.html"));

    let (head, body) = get(18302, "/imgfs/list");
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["Images"], serde_json::json!(["pic1"]));

    let (head, body) = get(18302, "/imgfs/read?res=small&img_id=pic1");
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Type: image/jpeg"));
    use image::GenericImageView;
    let (w, h) = image::load_from_memory(&body).unwrap().dimensions();
    assert!(w <= 256 && h <= 256, "small variant {w}x{h} exceeds its box");

    let (head, _) = get(18302, "/imgfs/delete?img_id=pic1");
    assert!(head.starts_with("HTTP/1.1 302 Found"));

    let (_, body) = get(18302, "/imgfs/list");
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["Images"], serde_json::json!([]));
}

// ── Error paths and the landing page ──────────────────────────────────────────

#[test]
fn error_paths_and_landing_page() {
    let (_dir, _container, _guard) = start_server(18303, 8);

    let (head, body) = get(18303, "/imgfs/read?res=small&img_id=absent");
    assert!(head.starts_with("HTTP/1.1 500 Internal Server Error"));
    assert!(String::from_utf8_lossy(&body).starts_with("Error: "));

    let (head, body) = get(18303, "/imgfs/compact");
    assert!(head.starts_with("HTTP/1.1 500 Internal Server Error"));
    assert!(String::from_utf8_lossy(&body).contains("invalid command"));

    let (head, _) = get(18303, "/imgfs/read?res=bogus&img_id=x");
    assert!(head.starts_with("HTTP/1.1 500 Internal Server Error"));

    let (head, body) = get(18303, "/index.html");
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Type: text/html"));
    assert!(String::from_utf8_lossy(&body).contains("imgFS"));
}

// ── Concurrent inserts ────────────────────────────────────────────────────────

#[test]
fn sixteen_concurrent_inserts_all_land() {
    const N: usize = 16;
    let (_dir, container, _guard) = start_server(18304, 32);

    let workers: Vec<_> = (0..N)
        .map(|i| {
            std::thread::spawn(move || {
                let jpeg = make_jpeg(120 + i as u32, 90, i as u8);
                let (head, _) = post(18304, &format!("/imgfs/insert?name=img{i}"), &jpeg);
                assert!(head.starts_with("HTTP/1.1 302 Found"), "insert {i}: {head}");
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let (_, body) = get(18304, "/imgfs/list");
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let mut ids: Vec<String> = parsed["Images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_owned())
        .collect();
    ids.sort();
    let mut expected: Vec<String> = (0..N).map(|i| format!("img{i}")).collect();
    expected.sort();
    assert_eq!(ids, expected);

    // Inspect the container itself: the mutations are all on disk and the
    // table holds no half-written record.
    let fs = imgfs::ImgfsFile::open(&container, false).unwrap();
    assert_eq!(fs.header.nb_files, N as u32);
    assert!(fs.header.version >= N as u32);
    for (_, record) in fs.iter_valid() {
        assert_ne!(record.offset[Resolution::Orig.index()], 0);
    }
}

// ── Orderly shutdown ──────────────────────────────────────────────────────────

#[test]
fn sigterm_shuts_an_idle_server_down_promptly() {
    let (_dir, _container, mut guard) = start_server(18305, 8);

    // No connection is in flight or pending: the accept loop is parked.
    unsafe { libc::kill(guard.child.id() as libc::pid_t, libc::SIGTERM) };

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(status) = guard.child.try_wait().unwrap() {
            assert!(status.success(), "orderly shutdown should exit 0, got {status}");
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "server still running 5s after SIGTERM"
        );
        std::thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn sigint_shuts_a_server_down_after_traffic() {
    let (_dir, _container, mut guard) = start_server(18306, 8);
    let (head, _) = get(18306, "/imgfs/list");
    assert!(head.starts_with("HTTP/1.1 200 OK"));

    unsafe { libc::kill(guard.child.id() as libc::pid_t, libc::SIGINT) };

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(status) = guard.child.try_wait().unwrap() {
            assert!(status.success(), "orderly shutdown should exit 0, got {status}");
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "server still running 5s after SIGINT"
        );
        std::thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn server_shutdown_is_idempotent_and_closes_the_listener() {
    let dir = TempDir::new().unwrap();
    let container = dir.path().join("t.imgfs");
    drop(imgfs::do_create(&container, 4, RES).unwrap());

    let server = imgfs::server::Server::startup(&container, Some(18307)).unwrap();
    assert!(TcpStream::connect(("127.0.0.1", 18307)).is_ok());

    server.shutdown();
    server.shutdown();
    assert!(
        TcpStream::connect(("127.0.0.1", 18307)).is_err(),
        "listener should be closed after shutdown"
    );
}
