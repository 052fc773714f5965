use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;

use crate::Result;

/// Opens `path` for appending, creating missing parent directories.
pub fn open_file_for_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    Ok(file)
}
