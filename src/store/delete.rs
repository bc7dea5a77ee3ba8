//! Delete an image: the slot is freed, the blob bytes stay behind.

use crate::container::ImgfsFile;
use crate::error::{ImgfsError, Result};
use crate::format::{write_header, write_metadata_at, EMPTY};

/// Remove `img_id` from the container.
///
/// Only the metadata record and the header are rewritten; the blob region
/// is never reclaimed.
pub fn do_delete(img_id: &str, fs: &mut ImgfsFile) -> Result<()> {
    let index = fs.find_by_id(img_id).ok_or(ImgfsError::ImageNotFound)?;

    let mut record = fs.metadata[index].clone();
    record.is_valid = EMPTY;
    write_metadata_at(&mut fs.file, index, &record)?;
    fs.metadata[index] = record;

    let mut header = fs.header.clone();
    header.nb_files -= 1;
    header.version += 1;
    write_header(&mut fs.file, &header)?;
    fs.header = header;
    Ok(())
}
