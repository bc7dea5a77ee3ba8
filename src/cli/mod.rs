//! Command-line front-end: argument definitions and the per-command
//! implementations shared by the `imgfscmd` binary.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};
pub use commands::{
    do_create_cmd, do_delete_cmd, do_insert_cmd, do_list_cmd, do_read_cmd, read_disk_image,
    write_disk_image,
};
