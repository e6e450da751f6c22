//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::Path;

/// Remove a file, symlink or directory tree.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Remove every top-level entry of `dir` for which `keep` returns false.
///
/// Returns the names of the removed entries, sorted.
pub fn reset_dir_except<F>(dir: &Path, keep: F) -> io::Result<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let mut removed = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if keep(&name) {
            continue;
        }
        remove_path(&entry.path())?;
        removed.push(name);
    }

    removed.sort();
    Ok(removed)
}

/// Names of the top-level entries of `dir`, sorted.
pub fn list_entries(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
