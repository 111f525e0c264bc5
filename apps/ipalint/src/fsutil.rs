//! Filesystem primitives: tree listing and size measurement.

use crate::size::FileSize;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List every regular file under `dir`, depth-first with siblings sorted by
/// name so the order is stable across platforms.
pub fn list_tree(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn file_size(path: &Path) -> io::Result<FileSize> {
    Ok(FileSize::from_bytes(std::fs::metadata(path)?.len()))
}

/// Sum of all regular file sizes beneath `dir`.
pub fn directory_size(dir: &Path) -> io::Result<FileSize> {
    list_tree(dir)?.iter().map(|p| file_size(p)).sum()
}

/// Root-relative path with forward slashes regardless of platform.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = pathdiff::diff_paths(path, root)?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
