//! Name and content deduplication over the metadata table.

use crate::container::ImgfsFile;
use crate::error::{ImgfsError, Result};
use crate::format::{EMPTY, NON_EMPTY};

/// Deduplicate the freshly populated slot `index` against every other
/// valid record.
///
/// * A matching `img_id` elsewhere fails with [`ImgfsError::DuplicateId`].
/// * A matching SHA-256 shares blob storage: the `size` and `offset`
///   triples of the first match (in slot order) are copied into `index`.
/// * Otherwise `offset[ORIG]` is reset to 0 so the caller knows it must
///   append the blob itself.
pub fn do_name_and_content_dedup(fs: &mut ImgfsFile, index: usize) -> Result<()> {
    if index >= fs.header.max_files as usize {
        return Err(ImgfsError::ImageNotFound);
    }
    if fs.metadata[index].is_valid == EMPTY {
        return Err(ImgfsError::ImageNotFound);
    }

    let mut shared: Option<usize> = None;
    for (i, other) in fs.metadata.iter().enumerate() {
        if i == index || other.is_valid != NON_EMPTY {
            continue;
        }
        if other.img_id == fs.metadata[index].img_id {
            return Err(ImgfsError::DuplicateId);
        }
        if shared.is_none() && other.sha == fs.metadata[index].sha {
            shared = Some(i);
        }
    }

    match shared {
        Some(i) => {
            let (size, offset) = (fs.metadata[i].size, fs.metadata[i].offset);
            fs.metadata[index].size = size;
            fs.metadata[index].offset = offset;
        }
        None => {
            fs.metadata[index].offset[crate::format::Resolution::Orig.index()] = 0;
        }
    }
    Ok(())
}
