//! Bridge between the HTTP layer and the store operations: URI routing,
//! per-operation handlers and error replies.

use std::io::Write;
use std::path::Path;

use log::debug;

use crate::error::{ImgfsError, Result};
use crate::format::{Resolution, MAX_IMG_ID};
use crate::http::message::{get_var, match_uri, match_verb, HttpMessage};
use crate::http::net::{http_reply, http_serve_file};
use crate::http::{HTTP_FOUND, HTTP_INTERNAL_ERROR, HTTP_OK};
use crate::server::ServerState;
use crate::store::{do_delete, do_insert, do_list, do_read, ListMode};

/// URI namespace of the store operations.
pub const URI_ROOT: &str = "/imgfs";

/// Landing page served for `/` and `/index.html`.
pub const BASE_FILE: &str = "index.html";

/// Longest accepted resolution spelling ("thumbnail").
const MAX_RES_LEN: usize = 16;

/// A routed request. Every reachable operation is a variant, so the
/// "unknown command" path is part of the type rather than a default
/// branch somewhere else.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiCall {
    /// Serve the static landing page.
    Index,
    List,
    Read { img_id: String, resolution: Resolution },
    Delete { img_id: String },
    Insert { name: String },
    Unknown,
}

/// Map a parsed request onto an [`ApiCall`], extracting and validating
/// query parameters on the way.
///
/// A missing parameter is [`ImgfsError::InvalidArgument`]; an unknown
/// resolution spelling is [`ImgfsError::InvalidCommand`].
pub fn route(message: &HttpMessage<'_>) -> Result<ApiCall> {
    let path = message.uri.split('?').next().unwrap_or(message.uri);
    let is_get = match_verb(message.method, "GET");

    if is_get && (path == "/" || path == "/index.html") {
        return Ok(ApiCall::Index);
    }
    if is_get && match_uri(message, &format!("{URI_ROOT}/list")) {
        return Ok(ApiCall::List);
    }
    if is_get && match_uri(message, &format!("{URI_ROOT}/read")) {
        let res = require_var(message.uri, "res", MAX_RES_LEN)?;
        let img_id = require_var(message.uri, "img_id", MAX_IMG_ID)?;
        let resolution = Resolution::parse(&res).ok_or(ImgfsError::InvalidCommand)?;
        return Ok(ApiCall::Read { img_id, resolution });
    }
    if is_get && match_uri(message, &format!("{URI_ROOT}/delete")) {
        let img_id = require_var(message.uri, "img_id", MAX_IMG_ID)?;
        return Ok(ApiCall::Delete { img_id });
    }
    if match_verb(message.method, "POST") && match_uri(message, &format!("{URI_ROOT}/insert")) {
        let name = require_var(message.uri, "name", MAX_IMG_ID)?;
        return Ok(ApiCall::Insert { name });
    }
    Ok(ApiCall::Unknown)
}

fn require_var(uri: &str, name: &str, max_len: usize) -> Result<String> {
    match get_var(uri, name, max_len)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ImgfsError::InvalidArgument),
    }
}

/// Dispatch one request and write its reply to `out`.
///
/// Returns the result of the handler that ran; store failures are
/// reported to the client as `500` and do not propagate.
pub fn handle_http_message<W: Write>(
    state: &ServerState,
    message: &HttpMessage<'_>,
    out: &mut W,
) -> Result<()> {
    let call = match route(message) {
        Ok(call) => call,
        Err(e) => return reply_error_msg(out, &e),
    };
    debug!("routing {} {} -> {call:?}", message.method, message.uri);

    match call {
        ApiCall::Index => http_serve_file(out, Path::new(BASE_FILE)),
        ApiCall::List => handle_list_call(state, out),
        ApiCall::Read { img_id, resolution } => {
            handle_read_call(state, &img_id, resolution, out)
        }
        ApiCall::Delete { img_id } => handle_delete_call(state, &img_id, out),
        ApiCall::Insert { name } => handle_insert_call(state, &name, message.body, out),
        ApiCall::Unknown => reply_error_msg(out, &ImgfsError::InvalidCommand),
    }
}

fn handle_list_call<W: Write>(state: &ServerState, out: &mut W) -> Result<()> {
    let listing = {
        let guard = lock_fs(state)?;
        match guard.as_ref() {
            Some(fs) => do_list(fs, ListMode::Json),
            None => Err(ImgfsError::Runtime),
        }
    };
    match listing {
        Ok(json) => http_reply(
            out,
            HTTP_OK,
            "Content-Type: application/json\r\n",
            json.as_bytes(),
        ),
        Err(e) => reply_error_msg(out, &e),
    }
}

fn handle_read_call<W: Write>(
    state: &ServerState,
    img_id: &str,
    resolution: Resolution,
    out: &mut W,
) -> Result<()> {
    let image = {
        let mut guard = lock_fs(state)?;
        match guard.as_mut() {
            Some(fs) => do_read(img_id, resolution, fs),
            None => Err(ImgfsError::Runtime),
        }
    };
    match image {
        Ok(data) => http_reply(out, HTTP_OK, "Content-Type: image/jpeg\r\n", &data),
        Err(e) => reply_error_msg(out, &e),
    }
}

fn handle_delete_call<W: Write>(state: &ServerState, img_id: &str, out: &mut W) -> Result<()> {
    let outcome = {
        let mut guard = lock_fs(state)?;
        match guard.as_mut() {
            Some(fs) => do_delete(img_id, fs),
            None => Err(ImgfsError::Runtime),
        }
    };
    match outcome {
        Ok(()) => reply_302_msg(out),
        Err(e) => reply_error_msg(out, &e),
    }
}

fn handle_insert_call<W: Write>(
    state: &ServerState,
    name: &str,
    body: &[u8],
    out: &mut W,
) -> Result<()> {
    if body.is_empty() {
        return reply_error_msg(out, &ImgfsError::InvalidArgument);
    }
    let outcome = {
        let mut guard = lock_fs(state)?;
        match guard.as_mut() {
            Some(fs) => do_insert(body, name, fs),
            None => Err(ImgfsError::Runtime),
        }
    };
    match outcome {
        Ok(()) => reply_302_msg(out),
        Err(e) => reply_error_msg(out, &e),
    }
}

fn lock_fs(
    state: &ServerState,
) -> Result<std::sync::MutexGuard<'_, Option<crate::container::ImgfsFile>>> {
    // A poisoned mutex means a worker died inside a store operation; the
    // slot holds None once shutdown has closed the container.
    state.fs.lock().map_err(|_| ImgfsError::Runtime)
}

/// `500 Internal Server Error` carrying the failure text.
fn reply_error_msg<W: Write>(out: &mut W, error: &ImgfsError) -> Result<()> {
    let body = format!("Error: {error}\n");
    http_reply(out, HTTP_INTERNAL_ERROR, "", body.as_bytes())
}

/// `302 Found` back to the landing page.
fn reply_302_msg<W: Write>(out: &mut W) -> Result<()> {
    http_reply(out, HTTP_FOUND, "Location: /index.html\r\n", b"")
}
