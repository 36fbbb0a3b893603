use crate::models::error::{BackupError, Result};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SQL_SUFFIX: &str = ".sql";

/// List the `.sql` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. Entries that cannot be inspected
/// are skipped with a warning; only failing to list `dir` itself is an error.
pub fn get_sql_files_in_path(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(BackupError::DirectoryRead {
                    path: dir.to_path_buf(),
                    cause: e,
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(SQL_SUFFIX) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}
