//! Per-call failure reporting.
//!
//! Tree walks never abort on a single bad entry; they push a `FailureRecord` and
//! keep going. The list produced by one public call is handed to the caller and
//! also parked in a `FailureSink` slot keyed by the calling thread, so `failed()`
//! keeps working for callers that prefer the "ask afterwards" style.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::errors::{FailureKind, error_kind};

/// One entry that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub is_dir: bool,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureRecord {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir,
            kind,
            message: message.into(),
        }
    }

    /// Build a record from an error, classifying it via the anyhow chain.
    pub fn from_error(path: &Path, is_dir: bool, err: &anyhow::Error) -> Self {
        Self::new(path, is_dir, error_kind(err), format!("{err:#}"))
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' [{}]: {}",
            if self.is_dir { "dir" } else { "file" },
            self.path.display(),
            self.kind,
            self.message
        )
    }
}

pub type FailureList = Vec<FailureRecord>;

/// True when a list holds nothing but informational records.
pub fn is_success(list: &[FailureRecord]) -> bool {
    list.iter().all(|r| r.kind.is_informational())
}

/// Thread-keyed store of the last failure list produced on each thread.
#[derive(Debug, Default)]
pub struct FailureSink {
    slots: Mutex<HashMap<ThreadId, FailureList>>,
}

impl FailureSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ThreadId, FailureList>> {
        // A panic while holding the lock cannot leave a slot half-written.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to `thread`'s current list.
    pub fn record(&self, thread: ThreadId, record: FailureRecord) {
        self.slots().entry(thread).or_default().push(record);
    }

    /// Start a fresh list for the calling thread.
    pub fn reset_current(&self) {
        self.slots().insert(thread::current().id(), FailureList::new());
    }

    /// Replace the calling thread's list with `list`.
    pub fn store_current(&self, list: FailureList) {
        self.slots().insert(thread::current().id(), list);
    }

    /// Copy of `thread`'s last list, or empty if that thread never ran an operation.
    pub fn get(&self, thread: ThreadId) -> FailureList {
        self.slots().get(&thread).cloned().unwrap_or_default()
    }

    pub fn current(&self) -> FailureList {
        self.get(thread::current().id())
    }
}
