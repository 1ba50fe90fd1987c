//! Root-level clone and move.
//!
//! These decide what happens at the top-level pair (missing source, same path,
//! lineage conflicts, type mismatches gated by force) and hand directory
//! contents to the merger, whose per-entry failures come back in the result.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::classify::{EntryKind, classify, is_strict_ancestor, resolve, same_volume};
use super::create::ensure_folder;
use super::helpers::io_error_with_help;
use super::merge::{MergeOptions, merge_dirs, overwrite_file};
use super::tree::{copy_entry, relocate_entry, remove_entry};
use crate::errors::RelocateError;
use crate::failures::{FailureList, is_success};

/// Where a clone/move landed and what went wrong below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub path: PathBuf,
    pub failures: FailureList,
}

impl Relocation {
    fn clean(path: PathBuf) -> Self {
        Self {
            path,
            failures: FailureList::new(),
        }
    }

    pub fn success(&self) -> bool {
        is_success(&self.failures)
    }
}

/// `dst/<name of src>` when `into`, otherwise `dst` itself.
pub fn target_path(src: &Path, dst: &Path, into: bool) -> Result<PathBuf> {
    if !into {
        return Ok(dst.to_path_buf());
    }
    let abs = resolve(src);
    match abs.file_name() {
        Some(name) => Ok(dst.join(name)),
        None => Err(RelocateError::Usage(format!("'{}' has no final component to place into a folder", src.display())).into()),
    }
}

/// Checks shared by clone and move. `Ok(None)` means source and target are the same path.
fn prepare(src: &Path, dst: &Path, into: bool) -> Result<Option<(EntryKind, PathBuf)>> {
    let kind = classify(src);
    if !kind.exists() {
        return Err(RelocateError::NotFound(src.to_path_buf()).into());
    }
    let target = target_path(src, dst, into)?;
    let src_abs = resolve(src);
    let target_abs = resolve(&target);
    if src_abs == target_abs {
        debug!(path = %src_abs.display(), "source and destination are the same; nothing to do");
        return Ok(None);
    }
    if is_strict_ancestor(&src_abs, &target_abs) {
        return Err(RelocateError::AncestorConflict {
            src: src_abs,
            dest: target_abs,
            reason: "destination is inside the source".into(),
        }
        .into());
    }
    Ok(Some((kind, target)))
}

/// Root type mismatch: replace only when force is on, and never by deleting
/// a directory the source itself lives in.
fn clear_mismatch(src: &Path, src_kind: EntryKind, target: &Path, target_kind: EntryKind, force: bool) -> Result<()> {
    if !force {
        return Err(RelocateError::TypeConflict {
            dest: target.to_path_buf(),
            reason: format!(
                "cannot place a {} where a {} is",
                src_kind.describe(),
                target_kind.describe()
            ),
        }
        .into());
    }
    if is_strict_ancestor(&resolve(target), &resolve(src)) {
        return Err(RelocateError::AncestorConflict {
            src: src.to_path_buf(),
            dest: target.to_path_buf(),
            reason: "replacing the destination would delete the source".into(),
        }
        .into());
    }
    warn!(path = %target.display(), kind = target_kind.describe(), "replacing destination of a different type");
    remove_entry(target, target_kind)
}

fn ensure_parent(target: &Path, force: bool) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_folder(parent, force)?;
    }
    Ok(())
}

/// Duplicate `src` to `dst` (or into it). Existing directories are merged,
/// existing files and links overwritten.
pub fn clone_entry(src: &Path, dst: &Path, into: bool, force: bool, opts: MergeOptions) -> Result<Relocation> {
    let Some((kind, target)) = prepare(src, dst, into)? else {
        return Ok(Relocation::clean(target_path(src, dst, into)?));
    };

    let mut target_kind = classify(&target);
    if target_kind.exists() && target_kind != kind {
        clear_mismatch(src, kind, &target, target_kind, force)?;
        target_kind = EntryKind::Absent;
    }

    let mut failures = FailureList::new();
    match (kind, target_kind) {
        (EntryKind::Directory, _) => {
            ensure_folder(&target, force)?;
            failures = merge_dirs(src, &target, false, force, opts)?.failures;
        }
        (_, EntryKind::Absent) => {
            ensure_parent(&target, force)?;
            copy_entry(src, &target, kind, opts.preserve_metadata)?;
        }
        (EntryKind::File, _) => overwrite_file(src, &target, false, opts)?,
        _ => {
            remove_entry(&target, target_kind)?;
            copy_entry(src, &target, kind, opts.preserve_metadata)?;
        }
    }

    info!(src = %src.display(), dst = %target.display(), failures = failures.len(), "clone finished");
    Ok(Relocation { path: target, failures })
}

/// Move `src` to `dst` (or into it), renaming when possible.
pub fn move_entry(src: &Path, dst: &Path, into: bool, force: bool, opts: MergeOptions) -> Result<Relocation> {
    let Some((kind, target)) = prepare(src, dst, into)? else {
        return Ok(Relocation::clean(target_path(src, dst, into)?));
    };

    let mut target_kind = classify(&target);
    if target_kind.exists() && target_kind != kind {
        clear_mismatch(src, kind, &target, target_kind, force)?;
        target_kind = EntryKind::Absent;
    }

    let mut failures = FailureList::new();
    match (kind, target_kind) {
        (_, EntryKind::Absent) => {
            ensure_parent(&target, force)?;
            failures = place_moved(src, kind, &target, force, opts)?;
        }
        (EntryKind::Directory, _) => {
            failures = merge_dirs(src, &target, true, force, opts)?.failures;
        }
        (EntryKind::File, _) => overwrite_file(src, &target, true, opts)?,
        _ => {
            remove_entry(&target, target_kind)?;
            relocate_entry(src, &target, kind, opts.preserve_metadata)?;
        }
    }

    info!(src = %src.display(), dst = %target.display(), failures = failures.len(), "move finished");
    Ok(Relocation { path: target, failures })
}

/// Target is free: one rename on the same volume, otherwise copy + remove
/// (directories via the merger so each entry's failure is kept).
fn place_moved(src: &Path, kind: EntryKind, target: &Path, force: bool, opts: MergeOptions) -> Result<FailureList> {
    let src_parent = resolve(src).parent().map(Path::to_path_buf).unwrap_or_default();
    let target_parent = resolve(target).parent().map(Path::to_path_buf).unwrap_or_default();

    if same_volume(&src_parent, &target_parent) {
        debug!(src = %src.display(), dst = %target.display(), "same volume; renaming");
        fs::rename(src, target).map_err(io_error_with_help("rename", src))?;
        return Ok(FailureList::new());
    }

    warn!(src = %src.display(), dst = %target.display(), "different volumes; copying then removing source");
    if kind == EntryKind::Directory {
        ensure_folder(target, force)?;
        Ok(merge_dirs(src, target, true, force, opts)?.failures)
    } else {
        relocate_entry(src, target, kind, opts.preserve_metadata)?;
        Ok(FailureList::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FailureKind, error_kind};
    use tempfile::tempdir;

    fn opts() -> MergeOptions {
        MergeOptions::default()
    }

    #[test]
    fn clone_file_into_folder_creates_parents() {
        let td = tempdir().unwrap();
        let src = td.path().join("a.txt");
        fs::write(&src, "a").unwrap();
        let out = clone_entry(&src, &td.path().join("x/y"), true, false, opts()).unwrap();
        assert_eq!(out.path, td.path().join("x/y/a.txt"));
        assert_eq!(fs::read_to_string(&out.path).unwrap(), "a");
        assert!(src.exists());
    }

    #[test]
    fn clone_missing_source_is_not_found() {
        let td = tempdir().unwrap();
        let err = clone_entry(&td.path().join("nope"), td.path(), true, true, opts()).unwrap_err();
        assert_eq!(error_kind(&err), FailureKind::NotFound);
    }

    #[test]
    fn clone_into_own_subtree_is_rejected() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::create_dir_all(src.join("inner")).unwrap();
        let err = clone_entry(&src, &src.join("inner"), true, true, opts()).unwrap_err();
        assert_eq!(error_kind(&err), FailureKind::AncestorConflict);
        assert!(!src.join("inner/src").exists());
    }

    #[test]
    fn root_type_mismatch_is_gated_by_force() {
        let td = tempdir().unwrap();
        let src = td.path().join("f.txt");
        let dst = td.path().join("d");
        fs::write(&src, "file").unwrap();
        fs::create_dir(&dst).unwrap();

        let err = clone_entry(&src, &dst, false, false, opts()).unwrap_err();
        assert_eq!(error_kind(&err), FailureKind::TypeConflict);
        assert!(dst.is_dir());

        clone_entry(&src, &dst, false, true, opts()).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "file");
    }

    #[test]
    fn move_renames_directory_on_same_volume() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        fs::create_dir_all(src.join("deep")).unwrap();
        fs::write(src.join("deep/f"), "f").unwrap();
        let dst = td.path().join("dst");
        fs::create_dir(&dst).unwrap();

        let out = move_entry(&src, &dst, true, false, opts()).unwrap();
        assert!(out.success());
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("src/deep/f")).unwrap(), "f");
    }

    #[test]
    fn move_merges_into_existing_directory() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a"), "new").unwrap();
        fs::write(dst.join("a"), "old").unwrap();
        fs::write(dst.join("b"), "keep").unwrap();

        let out = move_entry(&src, &dst, false, false, opts()).unwrap();
        assert!(out.success());
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("a")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("b")).unwrap(), "keep");
    }

    #[test]
    fn move_onto_itself_is_noop() {
        let td = tempdir().unwrap();
        let f = td.path().join("f");
        fs::write(&f, "x").unwrap();
        let out = move_entry(&f, td.path(), true, false, opts()).unwrap();
        assert_eq!(out.path, td.path().join("f"));
        assert_eq!(fs::read_to_string(&f).unwrap(), "x");
    }
}
