//! Binary entry point for the `imgfscmd` command-line tool.
//!
//! Parses the subcommand, runs it, and maps any failure onto the crate's
//! error taxonomy: `ERROR: <message>` plus the help text on stderr, and
//! the error kind as process exit code.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use imgfs::cli::{
    do_create_cmd, do_delete_cmd, do_insert_cmd, do_list_cmd, do_read_cmd, Cli, Command,
};
use imgfs::error::ImgfsError;

fn run(cli: &Cli) -> imgfs::error::Result<()> {
    match &cli.command {
        Command::List { imgfs_filename } => do_list_cmd(imgfs_filename),
        Command::Create { imgfs_filename, max_files, thumb_res, small_res } => {
            do_create_cmd(imgfs_filename, *max_files, thumb_res, small_res)
        }
        Command::Read { imgfs_filename, img_id, resolution } => {
            do_read_cmd(imgfs_filename, img_id, resolution.as_deref())
        }
        Command::Insert { imgfs_filename, img_id, filename } => {
            do_insert_cmd(imgfs_filename, img_id, filename)
        }
        Command::Delete { imgfs_filename, img_id } => do_delete_cmd(imgfs_filename, img_id),
    }
}

/// Report `error` the way every failing invocation does, then exit.
fn fail(error: &ImgfsError) -> ! {
    eprintln!("ERROR: {error}");
    let _ = Cli::command().print_help();
    std::process::exit(error.exit_code());
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // `imgfscmd help` and friends: usage text, success.
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => {
            let kind = match e.kind() {
                ErrorKind::MissingRequiredArgument | ErrorKind::MissingSubcommand => {
                    ImgfsError::NotEnoughArguments
                }
                ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument => {
                    ImgfsError::InvalidCommand
                }
                _ => ImgfsError::InvalidArgument,
            };
            fail(&kind);
        }
    };

    if let Err(e) = run(&cli) {
        fail(&e);
    }
}
