//! The operation surface.
//!
//! A `Session` owns the force default, the clipboard and the failure sink. Every
//! batch-style call starts a fresh failure list for the calling thread and parks
//! the final list there, so `failed()` always describes the last call made on
//! this thread.

use anyhow::Result;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveFormat};
use crate::clipboard::{Clipboard, ClipboardMode, PathTree, flatten_paths};
use crate::config::Config;
use crate::failures::{FailureList, FailureRecord, FailureSink, is_success};
use crate::force::{ForceDefault, ForceMode, ForceSession};
use crate::fs_ops::{self, MergeOptions, classify, relative_to};

static GLOBAL: Lazy<Session> = Lazy::new(Session::new);

#[derive(Debug, Default)]
pub struct Session {
    force: ForceDefault,
    preserve_metadata: AtomicBool,
    clipboard: Mutex<Clipboard>,
    sink: FailureSink,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session seeded from configuration defaults.
    pub fn from_config(cfg: &Config) -> Self {
        let s = Self::new();
        s.force.set(cfg.default_force);
        s.preserve_metadata.store(cfg.preserve_metadata, Ordering::SeqCst);
        s
    }

    /// Process-wide session behind the crate-root functions.
    pub fn global() -> &'static Session {
        &GLOBAL
    }

    pub fn default_force(&self) -> bool {
        self.force.get()
    }

    pub fn set_default_force(&self, enabled: bool) {
        self.force.set(enabled);
    }

    /// Override the force default until the guard is dropped.
    pub fn force_session(&self, enabled: bool) -> ForceSession<'_> {
        self.force.scoped(enabled)
    }

    pub fn preserve_metadata(&self) -> bool {
        self.preserve_metadata.load(Ordering::SeqCst)
    }

    pub fn set_preserve_metadata(&self, enabled: bool) {
        self.preserve_metadata.store(enabled, Ordering::SeqCst);
    }

    fn opts(&self) -> MergeOptions {
        MergeOptions {
            preserve_metadata: self.preserve_metadata(),
        }
    }

    fn clipboard(&self) -> MutexGuard<'_, Clipboard> {
        self.clipboard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, failures: FailureList) -> bool {
        let ok = is_success(&failures);
        self.sink.store_current(failures);
        ok
    }

    // ---- failures ----

    /// Failures recorded by the last operation on the calling thread.
    pub fn failed(&self) -> FailureList {
        self.sink.current()
    }

    pub fn failed_for(&self, thread: ThreadId) -> FailureList {
        self.sink.get(thread)
    }

    // ---- relocation ----

    /// Merge directory `src` into directory `dst`. Returns true on complete success.
    pub fn merge(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>, move_: bool, force: impl Into<ForceMode>) -> Result<bool> {
        self.sink.reset_current();
        let force = self.force.resolve(force.into());
        let report = fs_ops::merge_dirs(src.as_ref(), dst.as_ref(), move_, force, self.opts())?;
        Ok(self.finish(report.failures))
    }

    pub fn clone(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>, into: bool, force: impl Into<ForceMode>) -> Result<PathBuf> {
        self.sink.reset_current();
        let force = self.force.resolve(force.into());
        let out = fs_ops::clone_entry(src.as_ref(), dst.as_ref(), into, force, self.opts())?;
        self.finish(out.failures);
        Ok(out.path)
    }

    pub fn move_(&self, src: impl AsRef<Path>, dst: impl AsRef<Path>, into: bool, force: impl Into<ForceMode>) -> Result<PathBuf> {
        self.sink.reset_current();
        let force = self.force.resolve(force.into());
        let out = fs_ops::move_entry(src.as_ref(), dst.as_ref(), into, force, self.opts())?;
        self.finish(out.failures);
        Ok(out.path)
    }

    // ---- clipboard ----

    /// Mark `paths` for a move on the next paste, replacing anything marked before.
    pub fn cut<T: PathTree + ?Sized>(&self, paths: &T) {
        self.clipboard().mark(ClipboardMode::Cut, flatten_paths(paths));
    }

    /// Mark `paths` for a copy on the next paste, replacing anything marked before.
    pub fn copy<T: PathTree + ?Sized>(&self, paths: &T) {
        self.clipboard().mark(ClipboardMode::Copy, flatten_paths(paths));
    }

    pub fn a_cut<T: PathTree + ?Sized>(&self, paths: &T) -> Result<()> {
        self.clipboard().extend(ClipboardMode::Cut, flatten_paths(paths))
    }

    pub fn a_copy<T: PathTree + ?Sized>(&self, paths: &T) -> Result<()> {
        self.clipboard().extend(ClipboardMode::Copy, flatten_paths(paths))
    }

    pub fn unmark(&self) {
        self.clipboard().unmark();
    }

    /// Snapshot of the marked paths and mode.
    pub fn marked(&self) -> Clipboard {
        self.clipboard().clone()
    }

    /// Move or copy everything marked into `dst`; the clipboard is emptied first.
    ///
    /// Items found under `root` keep their folder structure relative to it.
    /// Marked paths that no longer exist are skipped. Returns true on complete success.
    pub fn paste(&self, dst: impl AsRef<Path>, root: Option<&Path>, force: impl Into<ForceMode>) -> bool {
        self.sink.reset_current();
        let force = self.force.resolve(force.into());
        let dst = dst.as_ref();
        let taken = self.clipboard().take();
        let Some((mode, items)) = taken else {
            debug!("paste with an empty clipboard");
            return self.finish(FailureList::new());
        };

        let opts = self.opts();
        let me = thread::current().id();
        for item in &items {
            if !classify(item).exists() {
                debug!(path = %item.display(), "marked path vanished; skipping");
                continue;
            }
            let dest = match root.and_then(|r| relative_to(item, r)) {
                Some(rel) => match rel.parent() {
                    Some(parent) => dst.join(parent),
                    None => dst.to_path_buf(),
                },
                None => dst.to_path_buf(),
            };
            let result = match mode {
                ClipboardMode::Copy => fs_ops::clone_entry(item, &dest, true, force, opts),
                ClipboardMode::Cut => fs_ops::move_entry(item, &dest, true, force, opts),
            };
            match result {
                Ok(out) => out.failures.into_iter().for_each(|rec| self.sink.record(me, rec)),
                Err(err) => {
                    warn!(path = %item.display(), error = %err, "paste item failed");
                    self.sink.record(me, FailureRecord::from_error(item, classify(item).is_dir(), &err));
                }
            }
        }

        let failures = self.sink.current();
        info!(mode = mode.as_str(), items = items.len(), failures = failures.len(), dst = %dst.display(), "paste finished");
        is_success(&failures)
    }

    // ---- creation ----

    pub fn folder(&self, path: impl AsRef<Path>, force: impl Into<ForceMode>) -> Result<bool> {
        fs_ops::ensure_folder(path.as_ref(), self.force.resolve(force.into()))
    }

    pub fn touch(&self, path: impl AsRef<Path>, clear: bool, force: impl Into<ForceMode>) -> Result<bool> {
        fs_ops::touch(path.as_ref(), clear, self.force.resolve(force.into()))
    }

    // ---- deletion / renaming / content replacement ----

    /// Delete every path (directories recursively). Returns true if all were removed.
    pub fn delete<T: PathTree + ?Sized>(&self, paths: &T) -> bool {
        self.sink.reset_current();
        let paths = flatten_paths(paths);
        let failures = fs_ops::delete_paths(&paths);
        info!(count = paths.len(), failures = failures.len(), "delete finished");
        self.finish(failures)
    }

    pub fn rename(&self, src: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        self.sink.reset_current();
        fs_ops::rename_path(src.as_ref(), name)
    }

    /// Rename each path to `name` within its own folder; failed items keep their old path.
    pub fn rename_all<T: PathTree + ?Sized>(&self, paths: &T, name: &str) -> Result<Vec<PathBuf>> {
        self.sink.reset_current();
        let mut raw = Vec::new();
        paths.collect_paths(&mut raw);
        let (renamed, failures) = fs_ops::rename_paths(&raw, name)?;
        self.finish(failures);
        Ok(renamed)
    }

    pub fn replace(&self, path: impl AsRef<Path>, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>) -> Result<usize> {
        self.sink.reset_current();
        fs_ops::replace_in_file(path.as_ref(), old.as_ref(), new.as_ref())
    }

    pub fn replace_all<T: PathTree + ?Sized>(&self, paths: &T, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>) -> Result<bool> {
        self.sink.reset_current();
        let paths = flatten_paths(paths);
        let failures = fs_ops::replace_in_files(&paths, old.as_ref(), new.as_ref())?;
        Ok(self.finish(failures))
    }

    /// Rename `src` when its whole name matches `pattern`; `name` may use `$1` or
    /// `${group}`. A name that does not match is returned unchanged.
    pub fn rename_regex(&self, src: impl AsRef<Path>, pattern: &str, name: &str) -> Result<PathBuf> {
        self.sink.reset_current();
        let re = fs_ops::full_match(pattern)?;
        fs_ops::rename_matching(src.as_ref(), &re, name)
    }

    pub fn rename_all_regex<T: PathTree + ?Sized>(&self, paths: &T, pattern: &str, name: &str) -> Result<Vec<PathBuf>> {
        self.sink.reset_current();
        let re = fs_ops::full_match(pattern)?;
        let mut raw = Vec::new();
        paths.collect_paths(&mut raw);
        let (renamed, failures) = fs_ops::rename_paths_matching(&raw, &re, name);
        self.finish(failures);
        Ok(renamed)
    }

    pub fn replace_regex(&self, path: impl AsRef<Path>, pattern: &str, new: &str) -> Result<usize> {
        self.sink.reset_current();
        let re = fs_ops::search_pattern(pattern)?;
        fs_ops::replace_regex_in_file(path.as_ref(), &re, new)
    }

    pub fn replace_all_regex<T: PathTree + ?Sized>(&self, paths: &T, pattern: &str, new: &str) -> Result<bool> {
        self.sink.reset_current();
        let re = fs_ops::search_pattern(pattern)?;
        let paths = flatten_paths(paths);
        let failures = fs_ops::replace_regex_in_files(&paths, &re, new);
        Ok(self.finish(failures))
    }

    // ---- archives ----

    #[allow(clippy::too_many_arguments)]
    pub fn archive(
        &self,
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
        format: ArchiveFormat,
        into: bool,
        remove_src: bool,
        force: impl Into<ForceMode>,
    ) -> Result<PathBuf> {
        let force = self.force.resolve(force.into());
        archive::archive_dir(src.as_ref(), dst.as_ref(), format, into, remove_src, force, self.opts())
    }

    /// Unpack `archive` into `dst`. Returns true on complete success.
    pub fn extract(&self, archive: impl AsRef<Path>, dst: impl AsRef<Path>, remove_archive: bool, force: impl Into<ForceMode>) -> Result<bool> {
        self.sink.reset_current();
        let force = self.force.resolve(force.into());
        let failures = archive::extract_archive(archive.as_ref(), dst.as_ref(), remove_archive, force, self.opts())?;
        Ok(self.finish(failures))
    }
}
