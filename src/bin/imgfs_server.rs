//! Binary entry point for the imgFS HTTP server.
//!
//! `imgfs_server <container_file> [<port>]` — opens the container
//! read-write, prints its header, then serves until SIGINT or SIGTERM.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use imgfs::server::Server;

#[derive(Parser, Debug)]
#[command(name = "imgfs_server", about = "HTTP front-end for an imgFS container")]
struct Args {
    /// Path to the container file.
    imgfs_filename: PathBuf,

    /// TCP port to listen on. Omitted or 0 selects the default (8000).
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let server = Server::startup(&args.imgfs_filename, args.port)
        .with_context(|| format!("cannot serve {}", args.imgfs_filename.display()))?;
    let outcome = server.run().context("accept loop failed");
    // run() already shut the server down on its way out; calling again is
    // a no-op and covers the error path too.
    server.shutdown();
    outcome
}
