use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::info;
use walkdir::WalkDir;

/// Replace `dest` wholesale with a recursive copy of `source`.
///
/// Anything previously at `dest` is removed first, so re-importing never
/// merges old and new contents. A failure part-way leaves a partial copy.
/// Returns the number of files copied.
pub fn replace_tree(source: &Path, dest: &Path) -> io::Result<u64> {
    remove_path(dest)?;
    copy_tree(source, dest)
}

/// Recursively copy `source` into `dest`, creating directories as needed.
pub fn copy_tree(source: &Path, dest: &Path) -> io::Result<u64> {
    let mut copied = 0;
    fs::create_dir_all(dest)?;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    info!(
        files = copied,
        "copied {} to {}",
        source.display(),
        dest.display()
    );
    Ok(copied)
}

/// Remove a file or directory tree; a missing path is not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// First file in `dist_dir` (by name) whose extension matches `extension`.
pub fn find_installer(dist_dir: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dist_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
        .collect();

    candidates.sort();
    Ok(candidates.into_iter().next())
}
