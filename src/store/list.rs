//! Enumerate the container, either as human-readable text or as JSON.

use serde::Serialize;

use crate::container::ImgfsFile;
use crate::error::Result;

/// Output shape selector for [`do_list`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMode {
    /// Print the header block and one line per valid record to stdout.
    Stdout,
    /// Produce `{"Images": [id, ...]}` in slot order.
    Json,
}

#[derive(Serialize)]
struct Listing {
    #[serde(rename = "Images")]
    images: Vec<String>,
}

/// List the valid records of `fs`.
///
/// Both modes return the produced text; `Stdout` additionally prints it.
pub fn do_list(fs: &ImgfsFile, mode: ListMode) -> Result<String> {
    match mode {
        ListMode::Stdout => {
            let mut out = format!("{}\n", fs.header);
            if fs.header.nb_files == 0 {
                out.push_str("<< empty imgFS >>\n");
            } else {
                for (slot, record) in fs.iter_valid() {
                    out.push_str(&record.describe(slot));
                    out.push('\n');
                }
            }
            print!("{out}");
            Ok(out)
        }
        ListMode::Json => {
            let listing = Listing {
                images: fs.iter_valid().map(|(_, m)| m.img_id.clone()).collect(),
            };
            serde_json::to_string(&listing).map_err(|_| crate::error::ImgfsError::Runtime)
        }
    }
}
