// Unit tests for src/http/message.rs — incremental request parsing and the
// query-string helpers.

use imgfs::http::message::{get_var, match_uri, match_verb, parse_message, Parsed};
use imgfs::ImgfsError;

// ── Framing states ────────────────────────────────────────────────────────────

#[test]
fn missing_header_terminator_is_incomplete() {
    let buf = b"GET /imgfs/list HTTP/1.1\r\nHost: localhost\r\n";
    assert!(matches!(parse_message(buf).unwrap(), Parsed::Incomplete));
}

#[test]
fn empty_buffer_is_incomplete() {
    assert!(matches!(parse_message(b"").unwrap(), Parsed::Incomplete));
}

#[test]
fn bodyless_request_parses_complete() {
    let buf = b"GET /imgfs/list HTTP/1.1\r\nHost: localhost\r\n\r\n";
    match parse_message(buf).unwrap() {
        Parsed::Complete(msg) => {
            assert_eq!(msg.method, "GET");
            assert_eq!(msg.uri, "/imgfs/list");
            assert_eq!(msg.content_length, 0);
            assert!(msg.body.is_empty());
            assert_eq!(msg.headers.len(), 1);
            assert_eq!(msg.headers[0].key, "Host");
            assert_eq!(msg.headers[0].value, "localhost");
        }
        other => panic!("expected Complete, got {other:?}"),
    }
}

#[test]
fn short_body_reports_partial_with_lengths() {
    let buf = b"POST /imgfs/insert?name=x HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
    match parse_message(buf).unwrap() {
        Parsed::Partial { header_len, content_length } => {
            assert_eq!(content_length, 10);
            assert_eq!(header_len, buf.len() - 3);
        }
        other => panic!("expected Partial, got {other:?}"),
    }
}

#[test]
fn full_body_parses_complete_with_exact_slice() {
    let buf = b"POST /imgfs/insert?name=x HTTP/1.1\r\nContent-Length: 4\r\n\r\n\xff\xd8\xff\xe0";
    match parse_message(buf).unwrap() {
        Parsed::Complete(msg) => {
            assert_eq!(msg.method, "POST");
            assert_eq!(msg.content_length, 4);
            assert_eq!(msg.body, b"\xff\xd8\xff\xe0");
        }
        other => panic!("expected Complete, got {other:?}"),
    }
}

#[test]
fn reparsing_a_growing_buffer_converges() {
    let full = b"POST /imgfs/insert?name=x HTTP/1.1\r\nContent-Length: 3\r\n\r\nxyz";
    let mut complete_at = None;
    for end in 0..=full.len() {
        match parse_message(&full[..end]).unwrap() {
            Parsed::Complete(_) => {
                complete_at = Some(end);
                break;
            }
            _ => continue,
        }
    }
    assert_eq!(complete_at, Some(full.len()));
}

// ── Malformed input ───────────────────────────────────────────────────────────

#[test]
fn truncated_request_line_is_an_error() {
    let buf = b"GET\r\n\r\n";
    assert!(parse_message(buf).is_err());
}

#[test]
fn header_line_without_separator_is_an_error() {
    let buf = b"GET / HTTP/1.1\r\nBogusHeader\r\n\r\n";
    assert!(parse_message(buf).is_err());
}

#[test]
fn unparsable_content_length_is_an_error() {
    let buf = b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
    assert!(parse_message(buf).is_err());
}

// ── URI helpers ───────────────────────────────────────────────────────────────

fn parsed(buf: &[u8]) -> imgfs::http::HttpMessage<'_> {
    match parse_message(buf).unwrap() {
        Parsed::Complete(msg) => msg,
        other => panic!("expected Complete, got {other:?}"),
    }
}

#[test]
fn match_uri_is_a_prefix_match() {
    let buf = b"GET /imgfs/read?res=small&img_id=pic1 HTTP/1.1\r\n\r\n";
    let msg = parsed(buf);
    assert!(match_uri(&msg, "/imgfs/read"));
    assert!(match_uri(&msg, "/imgfs"));
    assert!(!match_uri(&msg, "/imgfs/delete"));
}

#[test]
fn match_verb_is_exact() {
    assert!(match_verb("GET", "GET"));
    assert!(!match_verb("GETX", "GET"));
    assert!(!match_verb("GE", "GET"));
}

// ── get_var ───────────────────────────────────────────────────────────────────

#[test]
fn get_var_finds_a_parameter_anywhere_in_the_query() {
    let uri = "/imgfs/read?res=small&img_id=pic1";
    assert_eq!(get_var(uri, "res", 32).unwrap(), Some("small".to_owned()));
    assert_eq!(get_var(uri, "img_id", 32).unwrap(), Some("pic1".to_owned()));
}

#[test]
fn get_var_value_runs_to_ampersand_or_end() {
    let uri = "/x?a=1&b=22&c=333";
    assert_eq!(get_var(uri, "a", 32).unwrap(), Some("1".to_owned()));
    assert_eq!(get_var(uri, "c", 32).unwrap(), Some("333".to_owned()));
}

#[test]
fn get_var_missing_parameter_is_none() {
    assert_eq!(get_var("/imgfs/list", "res", 32).unwrap(), None);
    assert_eq!(get_var("/x?a=1", "res", 32).unwrap(), None);
}

#[test]
fn get_var_does_not_match_a_name_suffix() {
    // `img_id` must not be found inside `other_img_id`.
    let uri = "/x?other_img_id=nope";
    assert_eq!(get_var(uri, "img_id", 32).unwrap(), None);
}

#[test]
fn get_var_rejects_over_long_values() {
    let uri = "/x?name=abcdefgh";
    assert!(matches!(get_var(uri, "name", 4), Err(ImgfsError::Runtime)));
    assert_eq!(get_var(uri, "name", 8).unwrap(), Some("abcdefgh".to_owned()));
}
