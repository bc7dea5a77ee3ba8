// Unit tests for src/server/service.rs — routing and reply formatting —
// and src/http/net.rs response serialisation. Replies are written into
// in-memory buffers; no sockets involved.

use std::io::Cursor;
use std::sync::Mutex;

use imgfs::format::Resolution;
use imgfs::http::message::{parse_message, Parsed};
use imgfs::http::{http_reply, HttpMessage};
use imgfs::server::{handle_http_message, ApiCall, ServerState};
use imgfs::{do_create, do_insert, ImgfsError};
use tempfile::TempDir;

fn parsed(buf: &[u8]) -> HttpMessage<'_> {
    match parse_message(buf).unwrap() {
        Parsed::Complete(msg) => msg,
        other => panic!("expected a complete message, got {other:?}"),
    }
}

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

fn server_state(max_files: u32) -> (TempDir, ServerState) {
    let dir = TempDir::new().unwrap();
    let fs = do_create(dir.path().join("t.imgfs"), max_files, [64, 64, 256, 256]).unwrap();
    (dir, ServerState { fs: Mutex::new(Some(fs)), port: 8000 })
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[test]
fn routes_root_and_index_to_the_landing_page() {
    let route = |buf: &[u8]| imgfs::server::service::route(&parsed(buf)).unwrap();
    assert_eq!(route(b"GET / HTTP/1.1\r\n\r\n"), ApiCall::Index);
    assert_eq!(route(b"GET /index.html HTTP/1.1\r\n\r\n"), ApiCall::Index);
}

#[test]
fn routes_the_store_operations() {
    let route = |buf: &[u8]| imgfs::server::service::route(&parsed(buf)).unwrap();
    assert_eq!(route(b"GET /imgfs/list HTTP/1.1\r\n\r\n"), ApiCall::List);
    assert_eq!(
        route(b"GET /imgfs/read?res=small&img_id=pic1 HTTP/1.1\r\n\r\n"),
        ApiCall::Read { img_id: "pic1".to_owned(), resolution: Resolution::Small }
    );
    assert_eq!(
        route(b"GET /imgfs/delete?img_id=pic1 HTTP/1.1\r\n\r\n"),
        ApiCall::Delete { img_id: "pic1".to_owned() }
    );
    assert_eq!(
        route(b"POST /imgfs/insert?name=pic2 HTTP/1.1\r\nContent-Length: 0\r\n\r\n"),
        ApiCall::Insert { name: "pic2".to_owned() }
    );
}

#[test]
fn unknown_paths_and_wrong_verbs_route_to_unknown() {
    let route = |buf: &[u8]| imgfs::server::service::route(&parsed(buf)).unwrap();
    assert_eq!(route(b"GET /imgfs/compact HTTP/1.1\r\n\r\n"), ApiCall::Unknown);
    assert_eq!(route(b"POST /imgfs/list HTTP/1.1\r\n\r\n"), ApiCall::Unknown);
    assert_eq!(
        route(b"GET /imgfs/insert?name=x HTTP/1.1\r\n\r\n"),
        ApiCall::Unknown
    );
}

#[test]
fn read_without_parameters_is_invalid_argument() {
    let msg = parsed(b"GET /imgfs/read?res=small HTTP/1.1\r\n\r\n");
    assert!(matches!(
        imgfs::server::service::route(&msg),
        Err(ImgfsError::InvalidArgument)
    ));
}

#[test]
fn read_with_unknown_resolution_is_invalid_command() {
    let msg = parsed(b"GET /imgfs/read?res=huge&img_id=pic1 HTTP/1.1\r\n\r\n");
    assert!(matches!(
        imgfs::server::service::route(&msg),
        Err(ImgfsError::InvalidCommand)
    ));
}

// ── Reply serialisation ───────────────────────────────────────────────────────

#[test]
fn http_reply_frames_status_headers_and_length() {
    let mut out = Vec::new();
    http_reply(&mut out, "200 OK", "Content-Type: application/json\r\n", b"{}").unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{}"
    );
}

#[test]
fn http_reply_with_empty_body_still_carries_length() {
    let mut out = Vec::new();
    http_reply(&mut out, "302 Found", "Location: /index.html\r\n", b"").unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with("Content-Length: 0\r\n\r\n"));
}

// ── Dispatch against a live container ─────────────────────────────────────────

fn dispatch(state: &ServerState, raw: &[u8]) -> String {
    let msg = parsed(raw);
    let mut out = Vec::new();
    handle_http_message(state, &msg, &mut out).unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

#[test]
fn list_on_an_empty_container_returns_empty_json_array() {
    let (_dir, state) = server_state(4);
    let reply = dispatch(&state, b"GET /imgfs/list HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("Content-Type: application/json"));
    assert!(reply.ends_with(r#"{"Images":[]}"#));
}

#[test]
fn insert_then_list_round_trips_through_the_dispatcher() {
    let (_dir, state) = server_state(4);
    let jpeg = make_jpeg(40, 30, 7);
    let head = format!(
        "POST /imgfs/insert?name=pic1 HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    );
    let mut raw = head.into_bytes();
    raw.extend_from_slice(&jpeg);

    let reply = dispatch(&state, &raw);
    assert!(reply.starts_with("HTTP/1.1 302 Found\r\n"));
    assert!(reply.contains("Location: /index.html\r\n"));

    let listing = dispatch(&state, b"GET /imgfs/list HTTP/1.1\r\n\r\n");
    assert!(listing.ends_with(r#"{"Images":["pic1"]}"#));
}

#[test]
fn reading_an_absent_image_reports_a_500_error_body() {
    let (_dir, state) = server_state(4);
    let reply = dispatch(&state, b"GET /imgfs/read?res=small&img_id=nope HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(reply.ends_with("Error: image not found\n"));
}

#[test]
fn deleting_a_stored_image_redirects_home() {
    let (_dir, state) = server_state(4);
    {
        let mut guard = state.fs.lock().unwrap();
        let fs = guard.as_mut().unwrap();
        do_insert(&make_jpeg(32, 32, 3), "gone", fs).unwrap();
    }
    let reply = dispatch(&state, b"GET /imgfs/delete?img_id=gone HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 302 Found\r\n"));

    let listing = dispatch(&state, b"GET /imgfs/list HTTP/1.1\r\n\r\n");
    assert!(listing.ends_with(r#"{"Images":[]}"#));
}

#[test]
fn unroutable_requests_report_invalid_command() {
    let (_dir, state) = server_state(4);
    let reply = dispatch(&state, b"PUT /imgfs/list HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(reply.ends_with("Error: invalid command\n"));
}

#[test]
fn insert_with_an_empty_body_is_rejected() {
    let (_dir, state) = server_state(4);
    let reply = dispatch(
        &state,
        b"POST /imgfs/insert?name=pic1 HTTP/1.1\r\nContent-Length: 0\r\n\r\n",
    );
    assert!(reply.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(reply.ends_with("Error: invalid argument\n"));
}
