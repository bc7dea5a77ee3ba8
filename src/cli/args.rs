//! clap definitions for `imgfscmd`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default capacity of a freshly created container.
pub const DEFAULT_MAX_FILES: u32 = 128;
/// Default thumbnail bounding box side.
pub const DEFAULT_THUMB_RES: u16 = 64;
/// Default small-variant bounding box side.
pub const DEFAULT_SMALL_RES: u16 = 256;

#[derive(Parser, Debug)]
#[command(
    name = "imgfscmd",
    about = "imgFS command line interpreter",
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the content of an imgFS container.
    List {
        imgfs_filename: PathBuf,
    },

    /// Create a new imgFS container.
    Create {
        imgfs_filename: PathBuf,

        /// Maximum number of stored images.
        #[arg(short = 'm', long = "max_files", default_value_t = DEFAULT_MAX_FILES)]
        max_files: u32,

        /// Thumbnail bounding box, X then Y (at most 128 each).
        #[arg(
            short = 't',
            long = "thumb_res",
            num_args = 2,
            value_names = ["X_RES", "Y_RES"],
            default_values_t = [DEFAULT_THUMB_RES, DEFAULT_THUMB_RES]
        )]
        thumb_res: Vec<u16>,

        /// Small-variant bounding box, X then Y (at most 512 each).
        #[arg(
            short = 's',
            long = "small_res",
            num_args = 2,
            value_names = ["X_RES", "Y_RES"],
            default_values_t = [DEFAULT_SMALL_RES, DEFAULT_SMALL_RES]
        )]
        small_res: Vec<u16>,
    },

    /// Read an image from the container and extract it to a JPEG file.
    Read {
        imgfs_filename: PathBuf,
        img_id: String,
        /// original | orig | thumbnail | thumb | small (default: original).
        resolution: Option<String>,
    },

    /// Insert a JPEG file into the container.
    Insert {
        imgfs_filename: PathBuf,
        img_id: String,
        filename: PathBuf,
    },

    /// Delete an image from the container.
    Delete {
        imgfs_filename: PathBuf,
        img_id: String,
    },
}
