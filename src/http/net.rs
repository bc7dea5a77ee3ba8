//! Connection-level plumbing: the per-connection read loop, response
//! serialisation and static file serving.
//!
//! Sockets follow a connection-per-request model: one message in, one
//! reply out, then the stream is dropped. There is no keep-alive.

use std::io::{Read, Write};
use std::path::Path;

use log::debug;

use crate::error::{ImgfsError, Result};
use crate::http::message::{parse_message, HttpMessage, Parsed};
use crate::http::{HTTP_LINE_DELIM, HTTP_NOT_FOUND, HTTP_OK, HTTP_PROTOCOL_ID};

/// Size of the initial per-connection buffer; a request whose header block
/// exceeds this is rejected. The buffer grows once the declared body
/// length is known.
pub const MAX_HEADER_SIZE: usize = 2048;

/// Serialise and send one response.
///
/// `headers` is the extra header block, each line already terminated by
/// CRLF; `Content-Length` and the blank line are appended here so every
/// reply carries a correct length.
pub fn http_reply<W: Write>(out: &mut W, status: &str, headers: &str, body: &[u8]) -> Result<()> {
    let head = format!(
        "{HTTP_PROTOCOL_ID}{status}{HTTP_LINE_DELIM}{headers}Content-Length: {}{HTTP_LINE_DELIM}{HTTP_LINE_DELIM}",
        body.len(),
    );
    out.write_all(head.as_bytes())?;
    if !body.is_empty() {
        out.write_all(body)?;
    }
    out.flush()?;
    Ok(())
}

/// Serve a file from disk as `text/html`, or reply `404 Not Found` when it
/// cannot be read.
pub fn http_serve_file<W: Write>(out: &mut W, path: &Path) -> Result<()> {
    match std::fs::read(path) {
        Ok(content) => http_reply(
            out,
            HTTP_OK,
            "Content-Type: text/html; charset=utf-8\r\n",
            &content,
        ),
        Err(e) => {
            debug!("cannot serve {}: {e}", path.display());
            http_reply(out, HTTP_NOT_FOUND, "", b"")
        }
    }
}

/// Read one request from `stream`, hand it to `dispatch`, and return the
/// dispatcher's result. The socket closes when the stream is dropped by
/// the caller.
///
/// Bytes are read into a [`MAX_HEADER_SIZE`] buffer until the parser sees
/// the end of the header block; once the declared `Content-Length` is
/// known the buffer is enlarged and reading continues until the body is
/// complete. Any read or parse failure aborts this connection only.
pub fn handle_connection<S, F>(mut stream: S, dispatch: F) -> Result<()>
where
    S: Read + Write,
    F: FnOnce(&HttpMessage<'_>, &mut S) -> Result<()>,
{
    let mut buf = vec![0u8; MAX_HEADER_SIZE];
    let mut filled = 0usize;

    loop {
        if filled == buf.len() {
            // Headers never terminated within the allowed window.
            return Err(ImgfsError::Runtime);
        }
        let n = stream.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(ImgfsError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-request",
            )));
        }
        filled += n;

        match parse_message(&buf[..filled])? {
            Parsed::Incomplete => continue,
            Parsed::Partial { header_len, content_length } => {
                let needed = header_len + content_length;
                if buf.len() < needed {
                    buf.resize(needed, 0);
                }
            }
            Parsed::Complete(message) => {
                debug!(
                    "request: {} {} ({}B body)",
                    message.method, message.uri, message.content_length
                );
                return dispatch(&message, &mut stream);
            }
        }
    }
}
