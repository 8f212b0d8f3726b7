//! Filesystem utilities: crash-safe writes and flat working-tree listing.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::GitletResult;

/// Write data to a file atomically using temp-file-then-rename.
///
/// On POSIX, `rename()` within the same filesystem is atomic: either the
/// old file or the new file is visible, never a partial write. The temp
/// file is fsynced before renaming so the data is durable on disk.
pub fn atomic_write(path: &Path, data: &[u8]) -> GitletResult<()> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_data()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// List the plain files at the top level of the working directory, sorted.
///
/// The working tree is flat: directories (including `.gitlet/`) are not
/// descended into and do not appear in the result.
pub fn working_file_names(root: &Path) -> GitletResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Delete every plain file at the top level of the working directory.
pub fn clear_working_files(root: &Path) -> GitletResult<()> {
    for name in working_file_names(root)? {
        fs::remove_file(root.join(name))?;
    }
    Ok(())
}
