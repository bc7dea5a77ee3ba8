//! Read an image at a given resolution, materialising the variant first
//! when necessary.

use std::io::{Read, Seek, SeekFrom};

use crate::container::ImgfsFile;
use crate::content::lazily_resize;
use crate::error::{ImgfsError, Result};
use crate::format::Resolution;

/// Return the JPEG bytes of `img_id` at `resolution`.
///
/// A sub-resolution that has not been materialised yet is generated and
/// persisted on the way (which mutates the container).
pub fn do_read(img_id: &str, resolution: Resolution, fs: &mut ImgfsFile) -> Result<Vec<u8>> {
    let index = fs.find_by_id(img_id).ok_or(ImgfsError::ImageNotFound)?;

    if resolution != Resolution::Orig && fs.metadata[index].offset[resolution.index()] == 0 {
        lazily_resize(resolution, fs, index)?;
    }

    let size = fs.metadata[index].size[resolution.index()] as usize;
    let offset = fs.metadata[index].offset[resolution.index()];

    let mut buf = vec![0u8; size];
    fs.file.seek(SeekFrom::Start(offset))?;
    fs.file.read_exact(&mut buf)?;
    Ok(buf)
}
