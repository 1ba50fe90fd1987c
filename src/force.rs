//! Force-mode resolution.
//! An explicit per-call flag wins; `Unset` falls back to the session default.
//! `ForceSession` temporarily overrides that default and restores it on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Per-call force flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceMode {
    /// Use the session default.
    #[default]
    Unset,
    On,
    Off,
}

impl ForceMode {
    #[inline]
    pub fn resolve(self, default: bool) -> bool {
        match self {
            ForceMode::Unset => default,
            ForceMode::On => true,
            ForceMode::Off => false,
        }
    }
}

impl From<bool> for ForceMode {
    fn from(b: bool) -> Self {
        if b { ForceMode::On } else { ForceMode::Off }
    }
}

impl From<Option<bool>> for ForceMode {
    fn from(b: Option<bool>) -> Self {
        b.map(ForceMode::from).unwrap_or(ForceMode::Unset)
    }
}

/// Mutable default shared by every operation on a session.
#[derive(Debug, Default)]
pub struct ForceDefault(AtomicBool);

impl ForceDefault {
    pub fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }

    /// Resolve `mode` against the current default; read once per public call.
    #[inline]
    pub fn resolve(&self, mode: ForceMode) -> bool {
        mode.resolve(self.get())
    }

    /// Override the default until the returned guard is dropped.
    pub fn scoped(&self, enabled: bool) -> ForceSession<'_> {
        let previous = self.0.swap(enabled, Ordering::SeqCst);
        trace!(enabled, previous, "force session entered");
        ForceSession { owner: self, previous }
    }
}

/// RAII guard returned by `Session::force_session`.
#[must_use = "the override ends as soon as the guard is dropped"]
pub struct ForceSession<'a> {
    owner: &'a ForceDefault,
    previous: bool,
}

impl ForceSession<'_> {
    /// Value that will be restored on drop.
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl Drop for ForceSession<'_> {
    fn drop(&mut self) {
        self.owner.set(self.previous);
        trace!(restored = self.previous, "force session exited");
    }
}
