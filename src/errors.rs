//! Typed error definitions for relocator.
//! Root-level conditions are raised as `RelocateError` (wrapped in anyhow) so callers
//! can downcast; per-entry problems are turned into `FailureRecord`s instead.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("Source path not found: {0}")]
    NotFound(PathBuf),

    #[error("{message}")]
    PermissionDenied {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Type conflict at {dest}: {reason} (force is off)")]
    TypeConflict { dest: PathBuf, reason: String },

    #[error("'{src}' and '{dest}' are on the same lineage: {reason}")]
    AncestorConflict {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    /// A rename that had no copy fallback crossed a filesystem boundary.
    #[error("{message}")]
    CrossDevice {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("{message}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RelocateError {
    /// Coarse classification used for failure records and CLI exit reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            RelocateError::NotFound(_) => FailureKind::NotFound,
            RelocateError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            RelocateError::TypeConflict { .. } => FailureKind::TypeConflict,
            RelocateError::AncestorConflict { .. } => FailureKind::AncestorConflict,
            RelocateError::CrossDevice { .. } => FailureKind::CrossDevice,
            RelocateError::Usage(_) => FailureKind::Usage,
            RelocateError::NotADirectory(_) => FailureKind::NotADirectory,
            RelocateError::Io { source, .. } => FailureKind::from_io(source),
        }
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            RelocateError::NotFound(p) | RelocateError::NotADirectory(p) => Some(p),
            RelocateError::TypeConflict { dest, .. } | RelocateError::AncestorConflict { dest, .. } => Some(dest),
            RelocateError::PermissionDenied { path, .. }
            | RelocateError::CrossDevice { path, .. }
            | RelocateError::Io { path, .. } => Some(path),
            RelocateError::Usage(_) => None,
        }
    }

    /// Stable numeric code (useful for scripted consumers of the CLI).
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}

/// Reason attached to a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    TypeConflict,
    AncestorConflict,
    CrossDevice,
    Usage,
    NotADirectory,
    /// Removing an emptied source container failed; content itself was relocated.
    Cleanup,
    Io,
}

impl FailureKind {
    pub fn from_io(e: &io::Error) -> Self {
        if crate::fs_ops::is_cross_device(e) {
            return FailureKind::CrossDevice;
        }
        match e.kind() {
            io::ErrorKind::NotFound => FailureKind::NotFound,
            io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
            io::ErrorKind::NotADirectory => FailureKind::NotADirectory,
            _ => FailureKind::Io,
        }
    }

    /// Informational kinds do not count against an operation's success.
    pub fn is_informational(self) -> bool {
        matches!(self, FailureKind::Cleanup)
    }

    pub fn code(self) -> i32 {
        match self {
            FailureKind::NotFound => 2,
            FailureKind::PermissionDenied => 3,
            FailureKind::TypeConflict => 4,
            FailureKind::AncestorConflict => 5,
            FailureKind::CrossDevice => 6,
            FailureKind::Usage => 7,
            FailureKind::NotADirectory => 8,
            FailureKind::Cleanup => 9,
            FailureKind::Io => 1,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::NotFound => "not_found",
            FailureKind::PermissionDenied => "permission_denied",
            FailureKind::TypeConflict => "type_conflict",
            FailureKind::AncestorConflict => "ancestor_conflict",
            FailureKind::CrossDevice => "cross_device",
            FailureKind::Usage => "usage",
            FailureKind::NotADirectory => "not_a_directory",
            FailureKind::Cleanup => "cleanup",
            FailureKind::Io => "io",
        };
        f.write_str(s)
    }
}

/// Classify any error produced by this crate.
/// Looks through the anyhow chain for a `RelocateError` first, then a raw `io::Error`.
pub fn error_kind(err: &anyhow::Error) -> FailureKind {
    for cause in err.chain() {
        if let Some(re) = cause.downcast_ref::<RelocateError>() {
            return re.kind();
        }
        if let Some(ioe) = cause.downcast_ref::<io::Error>() {
            return FailureKind::from_io(ioe);
        }
    }
    FailureKind::Io
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_finds_typed_error_through_context() {
        let err = anyhow::Error::from(RelocateError::TypeConflict {
            dest: PathBuf::from("/x"),
            reason: "file where a directory is".into(),
        })
        .context("clone /a -> /x");
        assert_eq!(error_kind(&err), FailureKind::TypeConflict);
    }

    #[test]
    fn error_kind_maps_raw_io() {
        let err = anyhow::Error::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(error_kind(&err), FailureKind::PermissionDenied);
    }

    #[test]
    fn only_cleanup_is_informational() {
        assert!(FailureKind::Cleanup.is_informational());
        assert!(!FailureKind::Io.is_informational());
        assert!(!FailureKind::TypeConflict.is_informational());
    }
}
