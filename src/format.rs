//! On-disk container format: fixed-layout codec for the header and the
//! metadata records, plus positioned file I/O over both.
//!
//! A container file is laid out as
//!
//! ```text
//! [0 .. HEADER_SIZE)                          header
//! [HEADER_SIZE .. + max_files * METADATA_SIZE) metadata table
//! [.. end of file)                            blob region (append-only)
//! ```
//!
//! All integers are encoded in **host byte order**. The format is therefore
//! not portable across architectures of different endianness; a container
//! written on a little-endian machine must be read on one. Record sizes are
//! compile-time constants baked into the offset arithmetic below.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{ImgfsError, Result};

// ── Layout constants ──────────────────────────────────────────────────────────

/// Maximum significant length of the container name tag (NUL padding follows).
pub const MAX_IMGFS_NAME: usize = 31;

/// Maximum significant length of an image identifier.
pub const MAX_IMG_ID: usize = 127;

/// Number of stored resolutions (thumbnail, small, original).
pub const NB_RES: usize = 3;

/// Encoded header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Encoded metadata record size in bytes.
pub const METADATA_SIZE: usize = 216;

/// Name tag written into every freshly created container.
pub const CONTAINER_TAG: &str = "imgFS container v1";

/// Slot state: free.
pub const EMPTY: u16 = 0;

/// Slot state: occupied by a valid image.
pub const NON_EMPTY: u16 = 1;

/// Hard limits on the configurable resized resolutions.
pub const MAX_THUMB_RES: u16 = 128;
pub const MAX_SMALL_RES: u16 = 512;

// ── Resolution ────────────────────────────────────────────────────────────────

/// One of the three resolutions an image can be served at.
///
/// The discriminant doubles as the index into the `size` and `offset`
/// triples of a metadata record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Thumb = 0,
    Small = 1,
    Orig = 2,
}

impl Resolution {
    /// Index into a record's `size`/`offset` arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a user-facing resolution name. Accepts the short and long
    /// spellings; anything else is `None`.
    pub fn parse(s: &str) -> Option<Resolution> {
        match s {
            "thumb" | "thumbnail" => Some(Resolution::Thumb),
            "small" => Some(Resolution::Small),
            "orig" | "original" => Some(Resolution::Orig),
            _ => None,
        }
    }

    /// Filename suffix used when a read image is extracted to disk.
    pub fn suffix(self) -> &'static str {
        match self {
            Resolution::Thumb => "_thumbnail",
            Resolution::Small => "_small",
            Resolution::Orig => "_orig",
        }
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

/// Container header. One per file, always at offset 0.
///
/// `max_files` and `resized_res` are fixed at creation time; `version` and
/// `nb_files` change on every successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Name tag, at most [`MAX_IMGFS_NAME`] bytes, NUL-padded on disk.
    pub name: String,
    /// Monotonic mutation counter.
    pub version: u32,
    /// Number of records currently marked valid.
    pub nb_files: u32,
    /// Capacity of the metadata table.
    pub max_files: u32,
    /// thumb_w, thumb_h, small_w, small_h.
    pub resized_res: [u16; 4],
}

impl Header {
    /// Fresh header for a container of the given shape.
    pub fn new(max_files: u32, resized_res: [u16; 4]) -> Header {
        Header {
            name: CONTAINER_TAG.to_owned(),
            version: 0,
            nb_files: 0,
            max_files,
            resized_res,
        }
    }

    /// Bounding box `(width, height)` configured for a sub-resolution.
    ///
    /// Only meaningful for `Thumb` and `Small`; the original keeps its own
    /// dimensions.
    pub fn resized_bounds(&self, resolution: Resolution) -> (u32, u32) {
        match resolution {
            Resolution::Thumb => (u32::from(self.resized_res[0]), u32::from(self.resized_res[1])),
            Resolution::Small => (u32::from(self.resized_res[2]), u32::from(self.resized_res[3])),
            Resolution::Orig => (0, 0),
        }
    }

    /// Encode into the fixed 64-byte on-disk block.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        put_str(&mut buf[0..32], &self.name);
        buf[32..36].copy_from_slice(&self.version.to_ne_bytes());
        buf[36..40].copy_from_slice(&self.nb_files.to_ne_bytes());
        buf[40..44].copy_from_slice(&self.max_files.to_ne_bytes());
        for (i, r) in self.resized_res.iter().enumerate() {
            buf[44 + 2 * i..46 + 2 * i].copy_from_slice(&r.to_ne_bytes());
        }
        // bytes 52..64 are reserved padding, left zero
        buf
    }

    /// Decode from an encoded block. Fails on short input.
    pub fn decode(buf: &[u8]) -> Result<Header> {
        if buf.len() < HEADER_SIZE {
            return Err(truncated("header block too short"));
        }
        let mut resized_res = [0u16; 4];
        for (i, r) in resized_res.iter_mut().enumerate() {
            *r = get_u16(buf, 44 + 2 * i);
        }
        Ok(Header {
            name: get_str(&buf[0..32]),
            version: get_u32(buf, 32),
            nb_files: get_u32(buf, 36),
            max_files: get_u32(buf, 40),
            resized_res,
        })
    }
}

impl fmt::Display for Header {
    /// Human-readable header block, as printed by `list` and at server startup.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*****************************************")?;
        writeln!(f, "********** IMGFS HEADER START ***********")?;
        writeln!(f, "TYPE: {}", self.name)?;
        writeln!(
            f,
            "VERSION: {} IMAGE COUNT: {} MAX IMAGES: {}",
            self.version, self.nb_files, self.max_files
        )?;
        writeln!(
            f,
            "THUMBNAIL: {} x {} SMALL: {} x {}",
            self.resized_res[0], self.resized_res[1], self.resized_res[2], self.resized_res[3]
        )?;
        writeln!(f, "*********** IMGFS HEADER END ************")?;
        write!(f, "*****************************************")
    }
}

// ── Metadata record ───────────────────────────────────────────────────────────

/// One metadata slot. `max_files` of these follow the header on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct ImgMetadata {
    /// Image identifier, at most [`MAX_IMG_ID`] bytes, NUL-terminated on disk.
    pub img_id: String,
    /// SHA-256 of the original JPEG bytes.
    pub sha: [u8; 32],
    /// Width, height of the original.
    pub orig_res: [u32; 2],
    /// Blob byte length per resolution index.
    pub size: [u32; NB_RES],
    /// Blob file offset per resolution index; 0 means "not materialised".
    pub offset: [u64; NB_RES],
    /// [`EMPTY`] or [`NON_EMPTY`].
    pub is_valid: u16,
}

impl Default for ImgMetadata {
    fn default() -> ImgMetadata {
        ImgMetadata {
            img_id: String::new(),
            sha: [0; 32],
            orig_res: [0; 2],
            size: [0; NB_RES],
            offset: [0; NB_RES],
            is_valid: EMPTY,
        }
    }
}

impl ImgMetadata {
    /// Encode into the fixed 216-byte on-disk block.
    pub fn encode(&self) -> [u8; METADATA_SIZE] {
        let mut buf = [0u8; METADATA_SIZE];
        put_str(&mut buf[0..128], &self.img_id);
        buf[128..160].copy_from_slice(&self.sha);
        buf[160..164].copy_from_slice(&self.orig_res[0].to_ne_bytes());
        buf[164..168].copy_from_slice(&self.orig_res[1].to_ne_bytes());
        for (i, s) in self.size.iter().enumerate() {
            buf[168 + 4 * i..172 + 4 * i].copy_from_slice(&s.to_ne_bytes());
        }
        // bytes 180..184 are alignment padding before the offset triple
        for (i, o) in self.offset.iter().enumerate() {
            buf[184 + 8 * i..192 + 8 * i].copy_from_slice(&o.to_ne_bytes());
        }
        buf[208..210].copy_from_slice(&self.is_valid.to_ne_bytes());
        // bytes 210..216 are reserved padding, left zero
        buf
    }

    /// Decode from an encoded block. Fails on short input.
    pub fn decode(buf: &[u8]) -> Result<ImgMetadata> {
        if buf.len() < METADATA_SIZE {
            return Err(truncated("metadata block too short"));
        }
        let mut sha = [0u8; 32];
        sha.copy_from_slice(&buf[128..160]);
        let mut size = [0u32; NB_RES];
        for (i, s) in size.iter_mut().enumerate() {
            *s = get_u32(buf, 168 + 4 * i);
        }
        let mut offset = [0u64; NB_RES];
        for (i, o) in offset.iter_mut().enumerate() {
            *o = get_u64(buf, 184 + 8 * i);
        }
        Ok(ImgMetadata {
            img_id: get_str(&buf[0..128]),
            sha,
            orig_res: [get_u32(buf, 160), get_u32(buf, 164)],
            size,
            offset,
            is_valid: get_u16(buf, 208),
        })
    }

    /// One-line human rendering used by `list` in stdout mode.
    pub fn describe(&self, slot: usize) -> String {
        let mut sha_hex = String::with_capacity(16);
        for byte in &self.sha[..8] {
            sha_hex.push_str(&format!("{byte:02x}"));
        }
        format!(
            "[{slot:3}] {:<32} {}x{}  orig {}B @{}  thumb {}B @{}  small {}B @{}  sha {sha_hex}..",
            self.img_id,
            self.orig_res[0],
            self.orig_res[1],
            self.size[Resolution::Orig.index()],
            self.offset[Resolution::Orig.index()],
            self.size[Resolution::Thumb.index()],
            self.offset[Resolution::Thumb.index()],
            self.size[Resolution::Small.index()],
            self.offset[Resolution::Small.index()],
        )
    }
}

// ── Field codecs ──────────────────────────────────────────────────────────────

fn put_str(dst: &mut [u8], s: &str) {
    // Truncate at the field width minus the terminating NUL.
    let bytes = s.as_bytes();
    let n = bytes.len().min(dst.len() - 1);
    dst[..n].copy_from_slice(&bytes[..n]);
}

fn get_str(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}

#[inline]
fn get_u16(src: &[u8], at: usize) -> u16 {
    u16::from_ne_bytes([src[at], src[at + 1]])
}

#[inline]
fn get_u32(src: &[u8], at: usize) -> u32 {
    u32::from_ne_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]])
}

#[inline]
fn get_u64(src: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&src[at..at + 8]);
    u64::from_ne_bytes(b)
}

fn truncated(what: &str) -> ImgfsError {
    ImgfsError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, what.to_owned()))
}

// ── Positioned file I/O ───────────────────────────────────────────────────────

/// File offset of the metadata record in slot `index`.
#[inline]
pub fn metadata_offset(index: usize) -> u64 {
    (HEADER_SIZE + index * METADATA_SIZE) as u64
}

/// Read and decode the header at offset 0.
pub fn read_header(file: &mut File) -> Result<Header> {
    let mut buf = [0u8; HEADER_SIZE];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf)?;
    Header::decode(&buf)
}

/// Encode and rewrite the header in place.
pub fn write_header(file: &mut File, header: &Header) -> Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.encode())?;
    Ok(())
}

/// Read and decode the whole metadata table.
pub fn read_all_metadata(file: &mut File, max_files: u32) -> Result<Vec<ImgMetadata>> {
    let mut table = Vec::with_capacity(max_files as usize);
    let mut buf = [0u8; METADATA_SIZE];
    file.seek(SeekFrom::Start(metadata_offset(0)))?;
    for _ in 0..max_files {
        file.read_exact(&mut buf)?;
        table.push(ImgMetadata::decode(&buf)?);
    }
    Ok(table)
}

/// Encode and rewrite the record in slot `index` in place.
pub fn write_metadata_at(file: &mut File, index: usize, record: &ImgMetadata) -> Result<()> {
    file.seek(SeekFrom::Start(metadata_offset(index)))?;
    file.write_all(&record.encode())?;
    Ok(())
}
