//! Whole-entry primitives used by the merger and the relocator:
//! duplicate, relocate (rename with cross-device fallback) and remove a
//! file, symlink or directory tree. Symlinks are always copied as links.

use anyhow::{Result, anyhow};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::classify::EntryKind;
use super::copy::safe_copy_and_rename_with_metadata;
use super::helpers::io_error_with_help;
use super::util::is_cross_device;

/// Remove whatever sits at `path`. Absent paths are fine.
pub fn remove_entry(path: &Path, kind: EntryKind) -> Result<()> {
    match kind {
        EntryKind::Absent => Ok(()),
        EntryKind::Directory => fs::remove_dir_all(path).map_err(io_error_with_help("remove directory", path)),
        EntryKind::File => fs::remove_file(path).map_err(io_error_with_help("remove file", path)),
        EntryKind::Symlink => {
            // Windows directory symlinks need remove_dir.
            match fs::remove_file(path) {
                Ok(()) => Ok(()),
                #[cfg(windows)]
                Err(_) if fs::remove_dir(path).is_ok() => Ok(()),
                Err(e) => Err(io_error_with_help("remove symlink", path)(e)),
            }
        }
    }
}

/// Recreate the link at `src` as a new link at `dst` (same target text).
pub fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(io_error_with_help("read symlink", src))?;
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, dst).map_err(io_error_with_help("create symlink", dst))
    }
    #[cfg(windows)]
    {
        let resolved = src.parent().map(|p| p.join(&target)).unwrap_or_else(|| target.clone());
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(&target, dst).map_err(io_error_with_help("create symlink", dst))
        } else {
            std::os::windows::fs::symlink_file(&target, dst).map_err(io_error_with_help("create symlink", dst))
        }
    }
}

/// Duplicate a directory tree into `dst` (created if missing), links copied as links.
pub fn copy_tree(src: &Path, dst: &Path, preserve: bool) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| anyhow!("walk '{}': {}", src.display(), e))?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);
        let ft = entry.file_type();
        if ft.is_dir() {
            fs::create_dir_all(&target).map_err(io_error_with_help("create directory", &target))?;
        } else if ft.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            safe_copy_and_rename_with_metadata(entry.path(), &target, preserve)?;
        }
    }
    debug!(src = %src.display(), dst = %dst.display(), "copied tree");
    Ok(())
}

/// Duplicate any entry to `dst`.
pub fn copy_entry(src: &Path, dst: &Path, kind: EntryKind, preserve: bool) -> Result<()> {
    match kind {
        EntryKind::Directory => copy_tree(src, dst, preserve),
        EntryKind::Symlink => copy_symlink(src, dst),
        EntryKind::File => safe_copy_and_rename_with_metadata(src, dst, preserve),
        EntryKind::Absent => Err(io_error_with_help("copy", src)(std::io::ErrorKind::NotFound.into())),
    }
}

/// Move `src` to `dst` by renaming; across devices fall back to copy + remove.
pub fn relocate_entry(src: &Path, dst: &Path, kind: EntryKind, preserve: bool) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => {
            debug!(src = %src.display(), dst = %dst.display(), "renamed");
            Ok(())
        }
        Err(e) if is_cross_device(&e) => {
            warn!(src = %src.display(), dst = %dst.display(), "cross-device rename; copying instead");
            copy_entry(src, dst, kind, preserve)?;
            remove_entry(src, kind)
        }
        Err(e) => Err(io_error_with_help("rename", src)(e)),
    }
}
