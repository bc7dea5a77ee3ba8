//! Insert a JPEG into the container, deduplicating by identifier and by
//! content hash.

use std::io::{Seek, SeekFrom, Write};

use sha2::{Digest, Sha256};

use crate::container::ImgfsFile;
use crate::content::get_resolution;
use crate::dedup::do_name_and_content_dedup;
use crate::error::{ImgfsError, Result};
use crate::format::{write_header, write_metadata_at, ImgMetadata, Resolution, MAX_IMG_ID, NON_EMPTY};

/// Insert `image_buffer` under `img_id`.
///
/// Fails with [`ImgfsError::ImgfsFull`] when no slot is free, with
/// [`ImgfsError::InvalidImgId`] for an empty or over-long identifier, and
/// with [`ImgfsError::DuplicateId`] when the identifier is already taken.
/// Identical content (by SHA-256) shares the blob bytes of the earlier
/// copy instead of appending them again.
pub fn do_insert(image_buffer: &[u8], img_id: &str, fs: &mut ImgfsFile) -> Result<()> {
    if fs.header.nb_files >= fs.header.max_files {
        return Err(ImgfsError::ImgfsFull);
    }
    if img_id.is_empty() || img_id.len() > MAX_IMG_ID {
        return Err(ImgfsError::InvalidImgId);
    }

    let index = fs.first_free_slot().ok_or(ImgfsError::ImgfsFull)?;

    let (width, height) = get_resolution(image_buffer)?;
    let sha = Sha256::digest(image_buffer);

    let record = &mut fs.metadata[index];
    *record = ImgMetadata::default();
    record.img_id = img_id.to_owned();
    record.sha.copy_from_slice(&sha);
    record.orig_res = [width, height];
    record.size[Resolution::Orig.index()] = image_buffer.len() as u32;
    record.is_valid = NON_EMPTY;

    match commit(image_buffer, index, fs) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Leave no half-inserted ghost in the in-memory table.
            fs.metadata[index] = ImgMetadata::default();
            Err(e)
        }
    }
}

/// Dedup, blob append and the header/record rewrite. Split out so the
/// caller can roll the slot back on any failure.
fn commit(image_buffer: &[u8], index: usize, fs: &mut ImgfsFile) -> Result<()> {
    do_name_and_content_dedup(fs, index)?;

    if fs.metadata[index].offset[Resolution::Orig.index()] == 0 {
        let end = fs.file.seek(SeekFrom::End(0))?;
        fs.file.write_all(image_buffer)?;
        fs.metadata[index].offset[Resolution::Orig.index()] = end;
    }

    let mut header = fs.header.clone();
    header.nb_files += 1;
    header.version += 1;
    write_header(&mut fs.file, &header)?;
    write_metadata_at(&mut fs.file, index, &fs.metadata[index])?;
    fs.header = header;
    Ok(())
}
