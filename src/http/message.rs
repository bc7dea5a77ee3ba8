//! Incremental HTTP/1.1 request parsing over a byte buffer.
//!
//! The parser is zero-copy: a parsed [`HttpMessage`] borrows every field
//! from the caller's buffer. It is also restartable — feeding the same
//! buffer again after more bytes have arrived is the intended calling
//! pattern, and the tri-state [`Parsed`] result tells the caller whether
//! to keep reading and how much room the body still needs.

use crate::error::{ImgfsError, Result};
use crate::http::{HTTP_HDR_END_DELIM, HTTP_HDR_KV_DELIM, HTTP_LINE_DELIM};

/// One parsed header line, borrowing from the request buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpHeader<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// A fully framed request.
#[derive(Debug)]
pub struct HttpMessage<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub headers: Vec<HttpHeader<'a>>,
    pub body: &'a [u8],
    /// Declared `Content-Length`, 0 when the header is absent.
    pub content_length: usize,
}

/// Outcome of one parsing attempt.
#[derive(Debug)]
pub enum Parsed<'a> {
    /// The header terminator has not arrived yet.
    Incomplete,
    /// Headers are framed but the body is still short of `content_length`.
    Partial { header_len: usize, content_length: usize },
    /// The whole message is available.
    Complete(HttpMessage<'a>),
}

/// Parse as much of `buf` as possible.
///
/// Malformed input (non-ASCII header block, bad request line, unparsable
/// `Content-Length`) is an error; everything else is one of the three
/// [`Parsed`] states.
pub fn parse_message(buf: &[u8]) -> Result<Parsed<'_>> {
    let Some(head_len) = find_subslice(buf, HTTP_HDR_END_DELIM) else {
        return Ok(Parsed::Incomplete);
    };
    let header_len = head_len + HTTP_HDR_END_DELIM.len();

    let head = std::str::from_utf8(&buf[..head_len]).map_err(|_| ImgfsError::InvalidArgument)?;
    let mut lines = head.split(HTTP_LINE_DELIM);

    let request_line = lines.next().unwrap_or_default();
    let mut tokens = request_line.splitn(3, ' ');
    let method = tokens.next().unwrap_or_default();
    let uri = tokens.next().unwrap_or_default();
    let version = tokens.next().unwrap_or_default();
    if method.is_empty() || uri.is_empty() || version.is_empty() {
        return Err(ImgfsError::InvalidArgument);
    }

    let mut headers = Vec::new();
    for line in lines {
        let (key, value) = line
            .split_once(HTTP_HDR_KV_DELIM)
            .ok_or(ImgfsError::InvalidArgument)?;
        headers.push(HttpHeader { key, value });
    }

    let content_length = match headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case("Content-Length"))
    {
        Some(h) => h
            .value
            .trim()
            .parse::<usize>()
            .map_err(|_| ImgfsError::InvalidArgument)?,
        None => 0,
    };

    if buf.len() - header_len < content_length {
        return Ok(Parsed::Partial { header_len, content_length });
    }

    Ok(Parsed::Complete(HttpMessage {
        method,
        uri,
        headers,
        body: &buf[header_len..header_len + content_length],
        content_length,
    }))
}

/// Does the request URI start with `prefix`?
#[inline]
pub fn match_uri(message: &HttpMessage<'_>, prefix: &str) -> bool {
    message.uri.starts_with(prefix)
}

/// Exact method (or any token) equality.
#[inline]
pub fn match_verb(token: &str, verb: &str) -> bool {
    token == verb
}

/// Look up `name` in the query-string portion of `uri`.
///
/// The value runs to the next `&` or the end of the string. A value longer
/// than `max_len` bytes fails with [`ImgfsError::Runtime`]; an absent
/// parameter (or absent query string) is `Ok(None)`.
pub fn get_var(uri: &str, name: &str, max_len: usize) -> Result<Option<String>> {
    let Some((_, query)) = uri.split_once('?') else {
        return Ok(None);
    };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            if value.len() > max_len {
                return Err(ImgfsError::Runtime);
            }
            return Ok(Some(value.to_owned()));
        }
    }
    Ok(None)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
