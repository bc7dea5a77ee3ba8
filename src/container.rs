//! Open container handle: the file, the decoded header and the in-memory
//! mirror of the metadata table, plus the lookup helpers over that table.
//!
//! All persistence goes through the codec functions in [`crate::format`];
//! the helpers here never touch the file on their own.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{ImgfsError, Result};
use crate::format::{
    read_all_metadata, read_header, Header, ImgMetadata, EMPTY, HEADER_SIZE, METADATA_SIZE,
    NON_EMPTY,
};

/// An open imgFS container.
///
/// Dropping the value closes the file and releases the table.
#[derive(Debug)]
pub struct ImgfsFile {
    pub file: std::fs::File,
    pub header: Header,
    pub metadata: Vec<ImgMetadata>,
}

impl ImgfsFile {
    /// Open an existing container, loading header and metadata into memory.
    ///
    /// `writable` selects read-only or read-write access; mutating store
    /// operations require a writable handle. A file shorter than
    /// `HEADER_SIZE + max_files * METADATA_SIZE` is rejected as corrupt.
    pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> Result<ImgfsFile> {
        let mut file = OpenOptions::new().read(true).write(writable).open(path)?;

        let header = read_header(&mut file)?;
        if header.max_files == 0 {
            return Err(corrupt("container declares zero capacity"));
        }

        let min_len = HEADER_SIZE as u64 + u64::from(header.max_files) * METADATA_SIZE as u64;
        if file.metadata()?.len() < min_len {
            return Err(corrupt("file shorter than its declared metadata table"));
        }

        let metadata = read_all_metadata(&mut file, header.max_files)?;
        Ok(ImgfsFile { file, header, metadata })
    }

    /// Index of the valid record carrying `img_id`, scanning occupied slots
    /// in order. O(max_files).
    pub fn find_by_id(&self, img_id: &str) -> Option<usize> {
        self.metadata
            .iter()
            .position(|m| m.is_valid == NON_EMPTY && m.img_id == img_id)
    }

    /// First slot with `is_valid == EMPTY`, if any.
    pub fn first_free_slot(&self) -> Option<usize> {
        self.metadata.iter().position(|m| m.is_valid == EMPTY)
    }

    /// Occupied records in slot order, with their slot index.
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, &ImgMetadata)> {
        self.metadata
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_valid == NON_EMPTY)
    }
}

fn corrupt(what: &str) -> ImgfsError {
    ImgfsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, what.to_owned()))
}
