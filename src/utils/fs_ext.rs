//! File system helpers shared by the log locator and the baseline store

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file found in a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
}

/// List regular files of `dir`, sorted by name
///
/// Entries whose names are not valid UTF-8 are ignored.
pub fn list_files(dir: &Path) -> std::io::Result<Vec<DirEntryInfo>> {
    let mut files: Vec<DirEntryInfo> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some(DirEntryInfo { name, path: entry.path() })
        })
        .collect();

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Last modification time, `UNIX_EPOCH` when the platform cannot report it
pub fn modified_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
