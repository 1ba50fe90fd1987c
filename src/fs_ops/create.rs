//! Directory and file creation with force semantics.

use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{debug, warn};

use super::classify::{EntryKind, classify};
use super::helpers::io_error_with_help;
use super::tree::remove_entry;
use crate::errors::RelocateError;

/// Whether `path` can hold entries: a directory, or a symlink that resolves to one.
pub fn is_container(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}

/// Create `path` and any missing parents. Returns `true` if it was newly created.
///
/// Symlinks to directories are accepted as they are. With `force`, anything
/// else sitting at `path` or at one of its ancestors (a file, a dangling link,
/// a link to a file) is removed so the directory chain can be built.
pub fn ensure_folder(path: &Path, force: bool) -> Result<bool> {
    if is_container(path) {
        return Ok(false);
    }

    if force {
        // The deepest existing ancestor is either a usable container or in the way.
        let mut cursor = Some(path);
        while let Some(p) = cursor {
            let kind = classify(p);
            if kind.exists() {
                if !is_container(p) {
                    warn!(path = %p.display(), kind = kind.describe(), "removing entry blocking directory creation");
                    remove_entry(p, kind)?;
                }
                break;
            }
            cursor = p.parent();
        }
    } else {
        let kind = classify(path);
        if kind.exists() {
            return Err(RelocateError::TypeConflict {
                dest: path.to_path_buf(),
                reason: format!("a {} exists where a directory is required", kind.describe()),
            }
            .into());
        }
    }

    fs::create_dir_all(path).map_err(io_error_with_help("create directory", path))?;
    debug!(path = %path.display(), "created directory");
    Ok(true)
}

/// Create an empty file at `path` (parents created). Returns `true` if newly created.
/// `clear` truncates an existing file; with `force` a directory in the way is removed.
pub fn touch(path: &Path, clear: bool, force: bool) -> Result<bool> {
    match classify(path) {
        EntryKind::File => {
            if clear {
                OpenOptions::new()
                    .write(true)
                    .truncate(true)
                    .open(path)
                    .map_err(io_error_with_help("truncate file", path))?;
            }
            return Ok(false);
        }
        EntryKind::Absent => {}
        kind if force => remove_entry(path, kind)?,
        kind => {
            return Err(RelocateError::TypeConflict {
                dest: path.to_path_buf(),
                reason: format!("a {} exists where a file is required", kind.describe()),
            }
            .into());
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_folder(parent, force)?;
    }
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_error_with_help("create file", path))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FailureKind, error_kind};
    use tempfile::tempdir;

    #[test]
    fn folder_reports_creation() {
        let td = tempdir().unwrap();
        let p = td.path().join("a/b/c");
        assert!(ensure_folder(&p, false).unwrap());
        assert!(!ensure_folder(&p, false).unwrap());
        assert!(p.is_dir());
    }

    #[test]
    fn folder_force_removes_blocking_file() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("a"), "in the way").unwrap();
        let p = td.path().join("a/b");
        let err = ensure_folder(&p, false).unwrap_err();
        assert!(err.to_string().contains("create directory"));
        assert!(ensure_folder(&p, true).unwrap());
        assert!(p.is_dir());
    }

    #[test]
    fn folder_without_force_rejects_file_at_path() {
        let td = tempdir().unwrap();
        let p = td.path().join("f");
        fs::write(&p, "x").unwrap();
        let err = ensure_folder(&p, false).unwrap_err();
        assert_eq!(error_kind(&err), FailureKind::TypeConflict);
    }

    #[cfg(unix)]
    #[test]
    fn folder_accepts_link_to_directory_and_replaces_dangling_link() {
        let td = tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(!ensure_folder(&link, false).unwrap());
        assert!(!ensure_folder(&link, true).unwrap());
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());

        let dangling = td.path().join("dangling");
        std::os::unix::fs::symlink(td.path().join("nowhere"), &dangling).unwrap();
        assert_eq!(error_kind(&ensure_folder(&dangling, false).unwrap_err()), FailureKind::TypeConflict);
        assert!(ensure_folder(&dangling, true).unwrap());
        assert!(fs::symlink_metadata(&dangling).unwrap().is_dir());
    }

    #[test]
    fn touch_creates_and_clears() {
        let td = tempdir().unwrap();
        let p = td.path().join("sub/file.txt");
        assert!(touch(&p, false, false).unwrap());
        fs::write(&p, "content").unwrap();
        assert!(!touch(&p, false, false).unwrap());
        assert_eq!(fs::read_to_string(&p).unwrap(), "content");
        assert!(!touch(&p, true, false).unwrap());
        assert_eq!(fs::read_to_string(&p).unwrap(), "");
    }

    #[test]
    fn touch_force_replaces_directory() {
        let td = tempdir().unwrap();
        let p = td.path().join("d");
        fs::create_dir_all(p.join("inner")).unwrap();
        assert_eq!(error_kind(&touch(&p, false, false).unwrap_err()), FailureKind::TypeConflict);
        assert!(touch(&p, false, true).unwrap());
        assert!(p.is_file());
    }
}
