//! Recursive tree merge.
//!
//! Merges the children of a source directory into an existing destination directory:
//! - missing in destination: the entry is placed wholesale (rename or full copy)
//! - directory on both sides: recurse
//! - anything else: the destination entry is overwritten / replaced
//!
//! Below the root every conflict is resolved by overwriting, whatever force flag the
//! caller passed; the flag only matters for root-level decisions made by the relocator.
//! A failing entry becomes a `FailureRecord` and the walk carries on with its siblings.

use anyhow::Result;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[cfg(windows)]
use super::atomic::try_atomic_move;
use super::classify::{EntryKind, classify, is_strict_ancestor, resolve};
use super::copy::safe_copy_and_rename_with_metadata;
use super::helpers::io_error_with_help;
use super::tree::{copy_entry, relocate_entry, remove_entry};
use super::util::{is_cross_device, unique_hidden_path};
use crate::errors::{FailureKind, RelocateError};
use crate::failures::{FailureList, FailureRecord, is_success};

/// Knobs that do not change merge semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    pub preserve_metadata: bool,
}

/// Outcome of a merge walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub failures: FailureList,
}

impl MergeReport {
    /// True unless a non-informational failure was recorded.
    pub fn success(&self) -> bool {
        is_success(&self.failures)
    }
}

/// Merge directory `src` into directory `dst`.
///
/// Errors are returned only for root preconditions: either side not a directory,
/// the destination inside the source, or a failure to detach a source that lives
/// inside the destination.
pub fn merge_dirs(src: &Path, dst: &Path, move_: bool, force: bool, opts: MergeOptions) -> Result<MergeReport> {
    if classify(src) != EntryKind::Directory {
        return Err(RelocateError::NotADirectory(src.to_path_buf()).into());
    }
    if classify(dst) != EntryKind::Directory {
        return Err(RelocateError::NotADirectory(dst.to_path_buf()).into());
    }

    let src = resolve(src);
    let dst = resolve(dst);
    if src == dst {
        debug!(path = %src.display(), "merge into itself; nothing to do");
        return Ok(MergeReport::default());
    }
    if is_strict_ancestor(&src, &dst) {
        return Err(RelocateError::AncestorConflict {
            src,
            dest: dst,
            reason: "destination is inside the source directory".into(),
        }
        .into());
    }

    debug!(src = %src.display(), dst = %dst.display(), move_, force, "merge start");
    let mut failures = FailureList::new();

    if is_strict_ancestor(&dst, &src) {
        merge_detached(&src, &dst, move_, opts, &mut failures)?;
    } else {
        merge_level(&src, &dst, move_, opts, &mut failures);
    }

    let report = MergeReport { failures };
    info!(
        src = %src.display(),
        dst = %dst.display(),
        move_,
        failures = report.failures.len(),
        success = report.success(),
        "merge finished"
    );
    Ok(report)
}

/// Source lives inside the destination: park it under a scratch name first so the
/// walk never writes into the tree it is reading.
fn merge_detached(src: &Path, dst: &Path, move_: bool, opts: MergeOptions, failures: &mut FailureList) -> Result<()> {
    let scratch = unique_hidden_path(dst, "detach");
    fs::rename(src, &scratch).map_err(io_error_with_help("detach source", src))?;
    debug!(src = %src.display(), scratch = %scratch.display(), "source detached");

    merge_level(&scratch, dst, move_, opts, failures);
    if move_ {
        // Entries that could not be moved go back under the original name.
        if classify(&scratch).exists() {
            restore_detached(&scratch, src, failures);
        }
        return Ok(());
    }

    // Copy mode: the original has to end up back where it was.
    match classify(src) {
        EntryKind::Absent => restore_detached(&scratch, src, failures),
        EntryKind::Directory => merge_level(&scratch, src, true, opts, failures),
        kind => {
            warn!(src = %src.display(), scratch = %scratch.display(), "cannot restore source; path now holds a {}", kind.describe());
            failures.push(FailureRecord::new(
                &scratch,
                true,
                FailureKind::TypeConflict,
                format!(
                    "original source could not be restored to '{}' (a {} now occupies it)",
                    src.display(),
                    kind.describe()
                ),
            ));
        }
    }
    Ok(())
}

fn restore_detached(scratch: &Path, src: &Path, failures: &mut FailureList) {
    match fs::rename(scratch, src) {
        Ok(()) => debug!(scratch = %scratch.display(), src = %src.display(), "detached source restored"),
        Err(e) => {
            warn!(scratch = %scratch.display(), src = %src.display(), error = %e, "detached source left under scratch name");
            let err = io_error_with_help("restore detached source", src)(e);
            failures.push(FailureRecord::from_error(scratch, true, &err));
        }
    }
}

/// Merge the children of `src` into `dst`; both are directories.
fn merge_level(src: &Path, dst: &Path, move_: bool, opts: MergeOptions, failures: &mut FailureList) {
    let before = failures.len();

    let read = match fs::read_dir(src) {
        Ok(rd) => rd,
        Err(e) => {
            let err = io_error_with_help("read directory", src)(e);
            failures.push(FailureRecord::from_error(src, true, &err));
            return;
        }
    };
    let mut names: Vec<OsString> = Vec::new();
    for entry in read {
        match entry {
            Ok(e) => names.push(e.file_name()),
            Err(e) => {
                let err = io_error_with_help("read directory entry", src)(e);
                failures.push(FailureRecord::from_error(src, true, &err));
            }
        }
    }
    names.sort();

    for name in names {
        let s = src.join(&name);
        let d = dst.join(&name);
        let kind = classify(&s);
        if let Err(err) = merge_entry(&s, kind, &d, move_, opts, failures) {
            warn!(path = %s.display(), error = %err, "entry failed during merge");
            failures.push(FailureRecord::from_error(&s, kind.is_dir(), &err));
        }
    }

    if move_ && failures.len() == before {
        if let Err(e) = fs::remove_dir(src) {
            warn!(path = %src.display(), error = %e, "could not remove emptied source directory");
            failures.push(FailureRecord::new(
                src,
                true,
                FailureKind::Cleanup,
                format!("remove emptied source directory: {e}"),
            ));
        }
    }
}

fn merge_entry(
    s: &Path,
    s_kind: EntryKind,
    d: &Path,
    move_: bool,
    opts: MergeOptions,
    failures: &mut FailureList,
) -> Result<()> {
    let d_kind = classify(d);
    match (s_kind, d_kind) {
        (EntryKind::Absent, _) => Err(RelocateError::NotFound(s.to_path_buf()).into()),
        (_, EntryKind::Absent) => place(s, s_kind, d, move_, opts),
        (EntryKind::Directory, EntryKind::Directory) => {
            merge_level(s, d, move_, opts, failures);
            Ok(())
        }
        (EntryKind::File, EntryKind::File) => overwrite_file(s, d, move_, opts),
        _ => {
            debug!(src = %s.display(), dst = %d.display(), s_kind = s_kind.describe(), d_kind = d_kind.describe(), "replacing destination entry");
            remove_entry(d, d_kind)?;
            place(s, s_kind, d, move_, opts)
        }
    }
}

fn place(s: &Path, kind: EntryKind, d: &Path, move_: bool, opts: MergeOptions) -> Result<()> {
    if move_ {
        relocate_entry(s, d, kind, opts.preserve_metadata)
    } else {
        copy_entry(s, d, kind, opts.preserve_metadata)
    }
}

pub(super) fn overwrite_file(s: &Path, d: &Path, move_: bool, opts: MergeOptions) -> Result<()> {
    if !move_ {
        return safe_copy_and_rename_with_metadata(s, d, opts.preserve_metadata);
    }
    match fs::rename(s, d) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            safe_copy_and_rename_with_metadata(s, d, opts.preserve_metadata)?;
            fs::remove_file(s).map_err(io_error_with_help("remove moved file", s))
        }
        #[cfg(windows)]
        Err(_) => try_atomic_move(s, d),
        #[cfg(not(windows))]
        Err(e) => Err(io_error_with_help("rename over file", d)(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::error_kind;
    use tempfile::tempdir;

    fn opts() -> MergeOptions {
        MergeOptions::default()
    }

    #[test]
    fn rejects_non_directories() {
        let td = tempdir().unwrap();
        let f = td.path().join("f");
        fs::write(&f, "x").unwrap();
        let err = merge_dirs(&f, td.path(), false, true, opts()).unwrap_err();
        assert_eq!(error_kind(&err), FailureKind::NotADirectory);
        let err = merge_dirs(td.path(), &td.path().join("missing"), false, true, opts()).unwrap_err();
        assert_eq!(error_kind(&err), FailureKind::NotADirectory);
    }

    #[test]
    fn self_merge_is_noop() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("a"), "a").unwrap();
        let report = merge_dirs(td.path(), &td.path().join("."), true, false, opts()).unwrap();
        assert!(report.success());
        assert!(report.failures.is_empty());
        assert!(td.path().join("a").exists());
    }

    #[test]
    fn move_merge_empties_and_removes_source() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::create_dir_all(dst.join("sub")).unwrap();
        fs::write(src.join("sub/a.txt"), "new").unwrap();
        fs::write(dst.join("sub/a.txt"), "old").unwrap();
        fs::write(dst.join("sub/keep.txt"), "keep").unwrap();

        let report = merge_dirs(&src, &dst, true, false, opts()).unwrap();
        assert!(report.success(), "{:?}", report.failures);
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("sub/a.txt")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("sub/keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn directory_replaces_file_below_root() {
        let td = tempdir().unwrap();
        let src = td.path().join("src");
        let dst = td.path().join("dst");
        fs::create_dir_all(src.join("thing")).unwrap();
        fs::write(src.join("thing/inner.txt"), "i").unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("thing"), "was a file").unwrap();

        let report = merge_dirs(&src, &dst, false, false, opts()).unwrap();
        assert!(report.success());
        assert!(dst.join("thing").is_dir());
        assert_eq!(fs::read_to_string(dst.join("thing/inner.txt")).unwrap(), "i");
        assert!(src.join("thing/inner.txt").exists());
    }
}
