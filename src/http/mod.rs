//! Minimal HTTP/1.1 plumbing: incremental request parsing and the
//! connection-per-request server loop.

pub mod message;
pub mod net;

pub use message::{get_var, match_uri, match_verb, parse_message, HttpHeader, HttpMessage, Parsed};
pub use net::{handle_connection, http_reply, http_serve_file, MAX_HEADER_SIZE};

/// Line terminator used throughout the protocol.
pub const HTTP_LINE_DELIM: &str = "\r\n";

/// Separator between a header key and its value.
pub const HTTP_HDR_KV_DELIM: &str = ": ";

/// Terminator of the whole header block.
pub const HTTP_HDR_END_DELIM: &[u8] = b"\r\n\r\n";

/// Status line prefix of every response.
pub const HTTP_PROTOCOL_ID: &str = "HTTP/1.1 ";

pub const HTTP_OK: &str = "200 OK";
pub const HTTP_FOUND: &str = "302 Found";
pub const HTTP_NOT_FOUND: &str = "404 Not Found";
pub const HTTP_INTERNAL_ERROR: &str = "500 Internal Server Error";
