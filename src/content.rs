//! JPEG content handling: probing the dimensions of an uploaded image and
//! the on-demand materialisation of resized variants.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use image::GenericImageView;
use log::debug;

use crate::container::ImgfsFile;
use crate::error::{ImgfsError, Result};
use crate::format::{write_header, write_metadata_at, Resolution, EMPTY};

/// Decode `image_buffer` and return its `(width, height)`.
pub fn get_resolution(image_buffer: &[u8]) -> Result<(u32, u32)> {
    let decoded = image::load_from_memory(image_buffer)?;
    Ok(decoded.dimensions())
}

/// Materialise the variant of slot `index` at `resolution`, if needed.
///
/// The original blob is decoded, shrunk to fit the bounding box configured
/// in the header, re-encoded as JPEG and appended at end-of-file; the
/// record and the header (version bump) are then rewritten in place.
/// Requesting the original, or a variant that already exists, is a no-op.
///
/// The in-memory record and header are only updated once every write has
/// succeeded, so a failure mid-way leaves at worst orphan bytes at the
/// file tail and never a record pointing at garbage.
pub fn lazily_resize(resolution: Resolution, fs: &mut ImgfsFile, index: usize) -> Result<()> {
    if resolution == Resolution::Orig {
        return Ok(());
    }
    if index >= fs.header.max_files as usize || fs.metadata[index].is_valid == EMPTY {
        return Err(ImgfsError::InvalidImgId);
    }
    if fs.metadata[index].offset[resolution.index()] != 0 {
        return Ok(());
    }

    let orig_size = fs.metadata[index].size[Resolution::Orig.index()] as usize;
    let orig_offset = fs.metadata[index].offset[Resolution::Orig.index()];

    let mut original = vec![0u8; orig_size];
    fs.file.seek(SeekFrom::Start(orig_offset))?;
    fs.file.read_exact(&mut original)?;

    let decoded = image::load_from_memory(&original)?;
    let (bound_w, bound_h) = fs.header.resized_bounds(resolution);
    let resized = decoded.thumbnail(bound_w, bound_h);

    let mut encoded = Vec::new();
    resized.write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Jpeg)?;
    debug!(
        "resized {:?} for slot {index}: {}x{} -> {}B",
        resolution,
        resized.width(),
        resized.height(),
        encoded.len()
    );

    let end = fs.file.seek(SeekFrom::End(0))?;
    fs.file.write_all(&encoded)?;

    let mut record = fs.metadata[index].clone();
    record.size[resolution.index()] = encoded.len() as u32;
    record.offset[resolution.index()] = end;
    write_metadata_at(&mut fs.file, index, &record)?;

    let mut header = fs.header.clone();
    header.version += 1;
    write_header(&mut fs.file, &header)?;

    fs.metadata[index] = record;
    fs.header = header;
    Ok(())
}
