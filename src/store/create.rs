//! Container creation: header plus a zeroed metadata table.

use std::io::Write;
use std::path::Path;

use crate::container::ImgfsFile;
use crate::error::{ImgfsError, Result};
use crate::format::{Header, ImgMetadata, MAX_SMALL_RES, MAX_THUMB_RES};

/// Create a new container at `path`, truncating any existing file.
///
/// Writes a fresh header (`nb_files = 0`, `version = 0`, fixed name tag)
/// followed by `max_files` zeroed records, and returns the open handle.
pub fn do_create<P: AsRef<Path>>(
    path: P,
    max_files: u32,
    resized_res: [u16; 4],
) -> Result<ImgfsFile> {
    if max_files == 0 {
        return Err(ImgfsError::MaxFiles);
    }
    let [tw, th, sw, sh] = resized_res;
    if tw == 0 || th == 0 || tw > MAX_THUMB_RES || th > MAX_THUMB_RES {
        return Err(ImgfsError::Resolutions);
    }
    if sw == 0 || sh == 0 || sw > MAX_SMALL_RES || sh > MAX_SMALL_RES {
        return Err(ImgfsError::Resolutions);
    }

    let header = Header::new(max_files, resized_res);
    let metadata = vec![ImgMetadata::default(); max_files as usize];

    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    file.write_all(&header.encode())?;
    for record in &metadata {
        file.write_all(&record.encode())?;
    }

    Ok(ImgfsFile { file, header, metadata })
}
