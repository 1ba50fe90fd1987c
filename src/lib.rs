//! Core library for `relocator`.
//!
//! Merge-aware copy and move, clipboard-style cut/copy/paste, batch delete,
//! rename and replace (literal or regex), and tar / zip archives. Root-level
//! problems come back as errors; problems with individual entries inside a tree
//! are collected into a failure list that the caller can read with [`failed`].
//!
//! The functions at the crate root run on a process-wide [`Session`]. Create
//! your own `Session` to keep a separate force default and clipboard.

pub mod archive;
pub mod clipboard;
pub mod cli;
pub mod config;
pub mod errors;
pub mod failures;
pub mod force;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod session;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::thread::ThreadId;

pub use archive::ArchiveFormat;
pub use clipboard::{Clipboard, ClipboardMode, PathArg, PathTree};
pub use config::{Config, LogLevel};
pub use errors::{FailureKind, RelocateError, error_kind};
pub use failures::{FailureList, FailureRecord, is_success};
pub use force::{ForceMode, ForceSession};
pub use fs_ops::EntryKind;
pub use session::Session;

/// Convenient imports for callers.
pub mod prelude {
    pub use crate::{
        ArchiveFormat, ClipboardMode, EntryKind, FailureKind, FailureList, FailureRecord, ForceMode, PathArg,
        PathTree, RelocateError, Session, error_kind,
    };
}

fn global() -> &'static Session {
    Session::global()
}

/// Merge directory `src` into directory `dst`; see [`Session::merge`].
pub fn merge(src: impl AsRef<Path>, dst: impl AsRef<Path>, move_: bool, force: impl Into<ForceMode>) -> Result<bool> {
    global().merge(src, dst, move_, force)
}

/// Copy `src` to `dst` (or into it); see [`Session::clone`].
pub fn clone(src: impl AsRef<Path>, dst: impl AsRef<Path>, into: bool, force: impl Into<ForceMode>) -> Result<PathBuf> {
    global().clone(src, dst, into, force)
}

/// Move `src` to `dst` (or into it); see [`Session::move_`].
pub fn move_(src: impl AsRef<Path>, dst: impl AsRef<Path>, into: bool, force: impl Into<ForceMode>) -> Result<PathBuf> {
    global().move_(src, dst, into, force)
}

pub fn cut<T: PathTree + ?Sized>(paths: &T) {
    global().cut(paths)
}

pub fn copy<T: PathTree + ?Sized>(paths: &T) {
    global().copy(paths)
}

pub fn a_cut<T: PathTree + ?Sized>(paths: &T) -> Result<()> {
    global().a_cut(paths)
}

pub fn a_copy<T: PathTree + ?Sized>(paths: &T) -> Result<()> {
    global().a_copy(paths)
}

pub fn unmark() {
    global().unmark()
}

pub fn marked() -> Clipboard {
    global().marked()
}

/// Paste everything marked on the global clipboard into `dst`.
pub fn paste(dst: impl AsRef<Path>, root: Option<&Path>, force: impl Into<ForceMode>) -> bool {
    global().paste(dst, root, force)
}

/// Failures of the last operation on the calling thread.
pub fn failed() -> FailureList {
    global().failed()
}

pub fn failed_for(thread: ThreadId) -> FailureList {
    global().failed_for(thread)
}

/// Override the global force default until the guard is dropped.
pub fn force_session(enabled: bool) -> ForceSession<'static> {
    global().force_session(enabled)
}

pub fn default_force() -> bool {
    global().default_force()
}

pub fn set_default_force(enabled: bool) {
    global().set_default_force(enabled)
}

pub fn folder(path: impl AsRef<Path>, force: impl Into<ForceMode>) -> Result<bool> {
    global().folder(path, force)
}

pub fn touch(path: impl AsRef<Path>, clear: bool, force: impl Into<ForceMode>) -> Result<bool> {
    global().touch(path, clear, force)
}

pub fn delete<T: PathTree + ?Sized>(paths: &T) -> bool {
    global().delete(paths)
}

pub fn rename(src: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    global().rename(src, name)
}

pub fn rename_all<T: PathTree + ?Sized>(paths: &T, name: &str) -> Result<Vec<PathBuf>> {
    global().rename_all(paths, name)
}

pub fn replace(path: impl AsRef<Path>, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>) -> Result<usize> {
    global().replace(path, old, new)
}

pub fn replace_all<T: PathTree + ?Sized>(paths: &T, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>) -> Result<bool> {
    global().replace_all(paths, old, new)
}

pub fn rename_regex(src: impl AsRef<Path>, pattern: &str, name: &str) -> Result<PathBuf> {
    global().rename_regex(src, pattern, name)
}

pub fn rename_all_regex<T: PathTree + ?Sized>(paths: &T, pattern: &str, name: &str) -> Result<Vec<PathBuf>> {
    global().rename_all_regex(paths, pattern, name)
}

pub fn replace_regex(path: impl AsRef<Path>, pattern: &str, new: &str) -> Result<usize> {
    global().replace_regex(path, pattern, new)
}

pub fn replace_all_regex<T: PathTree + ?Sized>(paths: &T, pattern: &str, new: &str) -> Result<bool> {
    global().replace_all_regex(paths, pattern, new)
}

pub fn archive(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    format: ArchiveFormat,
    into: bool,
    remove_src: bool,
    force: impl Into<ForceMode>,
) -> Result<PathBuf> {
    global().archive(src, dst, format, into, remove_src, force)
}

pub fn extract(archive: impl AsRef<Path>, dst: impl AsRef<Path>, remove_archive: bool, force: impl Into<ForceMode>) -> Result<bool> {
    global().extract(archive, dst, remove_archive, force)
}
