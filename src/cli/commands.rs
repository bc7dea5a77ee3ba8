//! Implementations behind the `imgfscmd` subcommands, plus the disk-image
//! helpers `read` and `insert` rely on.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::container::ImgfsFile;
use crate::error::{ImgfsError, Result};
use crate::format::{Resolution, MAX_IMG_ID};
use crate::store::{do_create, do_delete, do_insert, do_list, do_read, ListMode};

/// `list <imgfs_filename>`
pub fn do_list_cmd(imgfs_filename: &Path) -> Result<()> {
    let fs = ImgfsFile::open(imgfs_filename, false)?;
    do_list(&fs, ListMode::Stdout)?;
    Ok(())
}

/// `create <imgfs_filename> [-m N] [-t X Y] [-s X Y]`
pub fn do_create_cmd(
    imgfs_filename: &Path,
    max_files: u32,
    thumb_res: &[u16],
    small_res: &[u16],
) -> Result<()> {
    let resized_res = [thumb_res[0], thumb_res[1], small_res[0], small_res[1]];
    let fs = do_create(imgfs_filename, max_files, resized_res)?;
    println!("{} item(s) written", fs.header.max_files + 1);
    Ok(())
}

/// `read <imgfs_filename> <imgID> [resolution]`
///
/// The image is extracted to `<imgID><suffix>.jpg` in the current
/// directory.
pub fn do_read_cmd(imgfs_filename: &Path, img_id: &str, resolution: Option<&str>) -> Result<()> {
    let resolution = match resolution {
        Some(s) => Resolution::parse(s).ok_or(ImgfsError::Resolutions)?,
        None => Resolution::Orig,
    };

    let mut fs = ImgfsFile::open(imgfs_filename, true)?;
    let image = do_read(img_id, resolution, &mut fs)?;

    let out_name = create_name(img_id, resolution);
    write_disk_image(Path::new(&out_name), &image)
}

/// `insert <imgfs_filename> <imgID> <filename>`
pub fn do_insert_cmd(imgfs_filename: &Path, img_id: &str, filename: &Path) -> Result<()> {
    let mut fs = ImgfsFile::open(imgfs_filename, true)?;
    let image = read_disk_image(filename)?;
    do_insert(&image, img_id, &mut fs)
}

/// `delete <imgfs_filename> <imgID>`
pub fn do_delete_cmd(imgfs_filename: &Path, img_id: &str) -> Result<()> {
    if img_id.is_empty() || img_id.len() > MAX_IMG_ID {
        return Err(ImgfsError::InvalidImgId);
    }
    let mut fs = ImgfsFile::open(imgfs_filename, true)?;
    do_delete(img_id, &mut fs)
}

/// Output filename for an extracted image.
fn create_name(img_id: &str, resolution: Resolution) -> String {
    format!("{img_id}{}.jpg", resolution.suffix())
}

/// Slurp a whole file.
pub fn read_disk_image(path: &Path) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Write `image` to `path`, truncating.
pub fn write_disk_image(path: &Path, image: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(image)?;
    Ok(())
}
