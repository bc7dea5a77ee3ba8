// imgFS — single-file JPEG image store with lazily materialised variants.

pub mod cli;
pub mod container;
pub mod content;
pub mod dedup;
pub mod error;
pub mod format;
pub mod http;
pub mod server;
pub mod store;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// Crate-wide error type and result alias.
pub use error::{ImgfsError, Result};

/// Open container handle: file, header and the in-memory metadata table.
pub use container::ImgfsFile;

/// On-disk header and metadata record types.
pub use format::{Header, ImgMetadata, Resolution};

/// Fixed layout sizes of the container format.
pub use format::{HEADER_SIZE, MAX_IMGFS_NAME, MAX_IMG_ID, METADATA_SIZE, NB_RES};

/// The five store operations.
pub use store::{do_create, do_delete, do_insert, do_list, do_read, ListMode};

/// Name and content deduplication over a freshly populated slot.
pub use dedup::do_name_and_content_dedup;

/// On-demand materialisation of resized variants.
pub use content::{get_resolution, lazily_resize};
