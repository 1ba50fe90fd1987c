//! I/O error enrichment.
//!
//! Wraps `io::Error` into a `RelocateError` carrying the failed operation, the path and a
//! short platform-aware hint. The original error stays attached as the source.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create directory", dir))?;

use std::io;
use std::path::Path;

use crate::errors::{FailureKind, RelocateError};

fn hint_for(e: &io::Error) -> Option<&'static str> {
    #[cfg(unix)]
    {
        let hint = match e.raw_os_error().unwrap_or(0) {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
            libc::EXDEV => Some("cross-device; rename not possible, a copy is required"),
            libc::EBUSY => Some("resource busy; another process may be using it"),
            libc::ENOENT => Some("path not found; it may have been removed mid-operation"),
            libc::EEXIST => Some("already exists"),
            libc::ENOTEMPTY => Some("directory not empty"),
            libc::ENOTDIR => Some("a path component is not a directory"),
            libc::EISDIR => Some("target is a directory"),
            libc::ENOSPC => Some("insufficient space on device"),
            libc::EROFS => Some("read-only filesystem"),
            libc::ELOOP => Some("too many symbolic link levels"),
            libc::ENAMETOOLONG => Some("file name or path too long"),
            _ => None,
        };
        if hint.is_some() {
            return hint;
        }
    }
    #[cfg(windows)]
    {
        let hint = match e.raw_os_error().unwrap_or(0) {
            5 => Some("access denied; check permissions"),
            17 => Some("not same device; rename not possible, a copy is required"),
            32 => Some("sharing violation; file is in use"),
            2 | 3 => Some("path not found"),
            80 | 183 => Some("already exists"),
            145 => Some("directory not empty"),
            112 => Some("insufficient disk space"),
            _ => None,
        };
        if hint.is_some() {
            return hint;
        }
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found"),
        io::ErrorKind::AlreadyExists => Some("already exists"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    if let Some(hint) = hint_for(e) {
        msg.push_str(" (");
        msg.push_str(hint);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Adapter for `anyhow::Result` code: `io::Error` -> a typed `RelocateError`
/// (`PermissionDenied`, `CrossDevice`, otherwise `Io`) wrapped in anyhow.
pub fn io_error_with_help<'a>(op: &'a str, path: &'a Path) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| {
        let message = build_message(op, path, &e);
        let path = path.to_path_buf();
        let typed = match FailureKind::from_io(&e) {
            FailureKind::PermissionDenied => RelocateError::PermissionDenied { message, path, source: e },
            FailureKind::CrossDevice => RelocateError::CrossDevice { message, path, source: e },
            _ => RelocateError::Io { message, path, source: e },
        };
        anyhow::Error::from(typed)
    }
}
