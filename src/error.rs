//! Error taxonomy shared by the container library, the CLI and the server.
//!
//! Every fallible operation in the crate returns [`Result`]. The CLI maps a
//! failure to its [`ImgfsError::exit_code`]; the server maps it to a
//! `500 Internal Server Error` reply whose body carries the `Display` text.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ImgfsError>;

/// All failure kinds an imgFS operation can report.
#[derive(Debug, Error)]
pub enum ImgfsError {
    /// A caller-supplied value is out of range or otherwise unusable.
    #[error("invalid argument")]
    InvalidArgument,

    /// An allocation was refused. Kept for taxonomy completeness; Rust
    /// aborts on allocator failure, so this is only produced by explicit
    /// size checks.
    #[error("out of memory")]
    OutOfMemory,

    /// Any file or socket failure (short read/write, seek, open, bind).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An internal limit was hit at runtime (e.g. an over-long query value).
    #[error("runtime error")]
    Runtime,

    #[error("not enough arguments")]
    NotEnoughArguments,

    /// Unknown CLI verb or unroutable HTTP request.
    #[error("invalid command")]
    InvalidCommand,

    /// Empty, over-long or unknown image identifier.
    #[error("invalid image ID")]
    InvalidImgId,

    /// All metadata slots are occupied.
    #[error("imgFS is full")]
    ImgfsFull,

    #[error("image not found")]
    ImageNotFound,

    /// Another valid record already carries this identifier.
    #[error("duplicate image ID")]
    DuplicateId,

    /// Resolution string not recognised, or resolution bounds violated.
    #[error("invalid resolution")]
    Resolutions,

    /// `max_files` outside the accepted range.
    #[error("invalid max number of files")]
    MaxFiles,

    /// JPEG decode, thumbnail or encode failure.
    #[error("image library error: {0}")]
    ImgLib(#[from] image::ImageError),

    /// Internal inconsistency that should never surface to users.
    #[error("internal debug error")]
    Debug,
}

impl ImgfsError {
    /// Process exit code for this failure kind. Success is 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            ImgfsError::InvalidArgument => 1,
            ImgfsError::OutOfMemory => 2,
            ImgfsError::Io(_) => 3,
            ImgfsError::Runtime => 4,
            ImgfsError::NotEnoughArguments => 5,
            ImgfsError::InvalidCommand => 6,
            ImgfsError::InvalidImgId => 7,
            ImgfsError::ImgfsFull => 8,
            ImgfsError::ImageNotFound => 9,
            ImgfsError::DuplicateId => 10,
            ImgfsError::Resolutions => 11,
            ImgfsError::MaxFiles => 12,
            ImgfsError::ImgLib(_) => 13,
            ImgfsError::Debug => 14,
        }
    }
}
