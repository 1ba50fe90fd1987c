//! Path classification and lineage checks.
//! - Kinds come from `symlink_metadata`, so a symlink is never silently followed.
//! - Lineage checks work on absolute, lexically normalized paths (no filesystem access),
//!   which keeps them valid for destinations that do not exist yet.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// What currently sits at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Absent,
}

impl EntryKind {
    #[inline]
    pub fn exists(self) -> bool {
        self != EntryKind::Absent
    }

    #[inline]
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }

    pub fn describe(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Absent => "nothing",
        }
    }
}

/// Classify `path` without following a final symlink.
/// Anything that is neither a directory nor a symlink (fifos, sockets, devices) counts as a file.
pub fn classify(path: &Path) -> EntryKind {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let ft = meta.file_type();
            if ft.is_symlink() {
                EntryKind::Symlink
            } else if ft.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            }
        }
        Err(_) => EntryKind::Absent,
    }
}

/// Absolute, lexically normalized form of `path` (`.` dropped, `..` folded).
pub fn resolve(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for comp in abs.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root/prefix.
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    dunce::simplified(&out).to_path_buf()
}

/// True iff `b` is `a` or lives somewhere below `a`.
pub fn is_ancestor(a: &Path, b: &Path) -> bool {
    resolve(b).starts_with(resolve(a))
}

/// True iff `b` lives strictly below `a`.
pub fn is_strict_ancestor(a: &Path, b: &Path) -> bool {
    let (a, b) = (resolve(a), resolve(b));
    a != b && b.starts_with(&a)
}

/// Path of `child` relative to `parent`, if `child` is inside `parent`.
pub fn relative_to(child: &Path, parent: &Path) -> Option<PathBuf> {
    resolve(child)
        .strip_prefix(resolve(parent))
        .ok()
        .map(Path::to_path_buf)
}

/// Whether two existing paths share a storage volume.
#[cfg(unix)]
pub fn same_volume(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev(),
        _ => false,
    }
}

/// Whether two existing paths share a storage volume (drive prefix comparison).
#[cfg(not(unix))]
pub fn same_volume(a: &Path, b: &Path) -> bool {
    let prefix = |p: &Path| {
        resolve(p)
            .components()
            .next()
            .map(|c| c.as_os_str().to_ascii_lowercase())
    };
    a.exists() && b.exists() && prefix(a) == prefix(b)
}
