//! Clipboard-style marking: pending paths plus a copy/cut mode, drained by paste.
//!
//! Path arguments go through [`PathTree`], so callers can pass a single path, a
//! vector, an array, a slice, or arbitrarily nested [`PathArg`] lists.

use anyhow::Result;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::RelocateError;
use crate::fs_ops::resolve;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

impl ClipboardMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClipboardMode::Copy => "copy",
            ClipboardMode::Cut => "cut",
        }
    }
}

/// Anything that can be flattened into a list of paths.
pub trait PathTree {
    fn collect_paths(&self, out: &mut Vec<PathBuf>);
}

impl PathTree for Path {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        out.push(self.to_path_buf());
    }
}

impl PathTree for PathBuf {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        out.push(self.clone());
    }
}

impl PathTree for str {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        out.push(PathBuf::from(self));
    }
}

impl PathTree for String {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        out.push(PathBuf::from(self));
    }
}

impl PathTree for OsStr {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        out.push(PathBuf::from(self));
    }
}

impl PathTree for OsString {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        out.push(PathBuf::from(self));
    }
}

impl<T: PathTree + ?Sized> PathTree for &T {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        (**self).collect_paths(out);
    }
}

impl<T: PathTree> PathTree for [T] {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        for item in self {
            item.collect_paths(out);
        }
    }
}

impl<T: PathTree, const N: usize> PathTree for [T; N] {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        self.as_slice().collect_paths(out);
    }
}

impl<T: PathTree> PathTree for Vec<T> {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        self.as_slice().collect_paths(out);
    }
}

impl<T: PathTree> PathTree for Option<T> {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        if let Some(inner) = self {
            inner.collect_paths(out);
        }
    }
}

/// Heterogeneous nesting of paths and path lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArg {
    Path(PathBuf),
    Nested(Vec<PathArg>),
}

impl PathTree for PathArg {
    fn collect_paths(&self, out: &mut Vec<PathBuf>) {
        match self {
            PathArg::Path(p) => out.push(p.clone()),
            PathArg::Nested(items) => items.collect_paths(out),
        }
    }
}

impl From<&str> for PathArg {
    fn from(s: &str) -> Self {
        PathArg::Path(PathBuf::from(s))
    }
}

impl From<&Path> for PathArg {
    fn from(p: &Path) -> Self {
        PathArg::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for PathArg {
    fn from(p: PathBuf) -> Self {
        PathArg::Path(p)
    }
}

impl<T: Into<PathArg>> From<Vec<T>> for PathArg {
    fn from(items: Vec<T>) -> Self {
        PathArg::Nested(items.into_iter().map(Into::into).collect())
    }
}

/// Flatten, make absolute, and drop repeats while keeping first-seen order.
pub fn flatten_paths<T: PathTree + ?Sized>(paths: &T) -> Vec<PathBuf> {
    let mut raw = Vec::new();
    paths.collect_paths(&mut raw);
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter().map(|p| resolve(&p)).filter(|p| seen.insert(p.clone())).collect()
}

/// Marked paths and the pending mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    items: Vec<PathBuf>,
    mode: Option<ClipboardMode>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn mode(&self) -> Option<ClipboardMode> {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the marked set.
    pub fn mark(&mut self, mode: ClipboardMode, items: Vec<PathBuf>) {
        debug!(mode = mode.as_str(), count = items.len(), "clipboard replaced");
        self.items = items;
        self.mode = Some(mode);
    }

    /// Add to the marked set. Mixing copy and cut is refused and leaves the set as it was.
    pub fn extend(&mut self, mode: ClipboardMode, items: Vec<PathBuf>) -> Result<()> {
        match self.mode {
            Some(current) if current != mode => {
                return Err(RelocateError::Usage(format!(
                    "clipboard holds {} items; cannot add {} items",
                    current.as_str(),
                    mode.as_str()
                ))
                .into());
            }
            _ => {}
        }
        let before = self.items.len();
        for p in items {
            if !self.items.contains(&p) {
                self.items.push(p);
            }
        }
        let added = self.items.len() - before;
        self.mode = Some(mode);
        debug!(mode = mode.as_str(), added, total = self.items.len(), "clipboard extended");
        Ok(())
    }

    pub fn unmark(&mut self) {
        self.items.clear();
        self.mode = None;
    }

    /// Drain everything, leaving the clipboard empty.
    pub fn take(&mut self) -> Option<(ClipboardMode, Vec<PathBuf>)> {
        let items = std::mem::take(&mut self.items);
        self.mode.take().map(|mode| (mode, items))
    }
}
