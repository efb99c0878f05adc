// src/package/build_root.rs

//! Process-wide deployment root with scoped redirection
//!
//! Path-based packaging resolves sources under a deployment root. New code
//! should pass that root to [`PackageBuilder::new`](super::PackageBuilder::new)
//! directly. For callers that still rely on one shared root, [`BuildRoot`]
//! holds it and hands out [`BuildRootGuard`]s: while a guard is alive the
//! root points at the redirected directory and every other redirect waits;
//! dropping the guard restores the previous value, on error and panic paths
//! as well.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::debug;

/// Shared deployment root value
#[derive(Debug)]
pub struct BuildRoot {
    value: RwLock<Option<PathBuf>>,
    redirect_lock: Mutex<()>,
}

static GLOBAL: BuildRoot = BuildRoot::empty();

impl BuildRoot {
    /// A root with no value set
    pub const fn empty() -> Self {
        Self {
            value: RwLock::new(None),
            redirect_lock: Mutex::new(()),
        }
    }

    pub fn new(initial: impl Into<PathBuf>) -> Self {
        Self {
            value: RwLock::new(Some(initial.into())),
            redirect_lock: Mutex::new(()),
        }
    }

    /// The process-wide instance, seeded from configuration at startup
    pub fn global() -> &'static BuildRoot {
        &GLOBAL
    }

    /// Snapshot of the current root
    pub fn current(&self) -> Option<PathBuf> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the root outright
    ///
    /// Waits for any active redirect to finish first, otherwise the guard
    /// would overwrite this value when it restores.
    pub fn set(&self, root: Option<PathBuf>) {
        let _lock = self
            .redirect_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.replace(root);
    }

    /// Point the root at `dir` until the returned guard is dropped
    ///
    /// Blocks while another guard on this root is alive. Not reentrant: a
    /// thread holding a guard must not redirect the same root again.
    pub fn redirect(&self, dir: impl AsRef<Path>) -> BuildRootGuard<'_> {
        let lock = self
            .redirect_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let dir = dir.as_ref().to_path_buf();
        debug!("Redirecting build root to {}", dir.display());
        let previous = self.replace(Some(dir));

        BuildRootGuard {
            root: self,
            previous,
            _lock: lock,
        }
    }

    fn replace(&self, root: Option<PathBuf>) -> Option<PathBuf> {
        let mut value = self.value.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *value, root)
    }
}

impl Default for BuildRoot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Restores the previous build root when dropped
#[must_use = "the build root is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BuildRootGuard<'a> {
    root: &'a BuildRoot,
    previous: Option<PathBuf>,
    _lock: MutexGuard<'a, ()>,
}

impl BuildRootGuard<'_> {
    /// The directory this guard redirected to
    pub fn path(&self) -> Option<PathBuf> {
        self.root.current()
    }
}

impl Drop for BuildRootGuard<'_> {
    fn drop(&mut self) {
        // Restore before `_lock` is released so no other redirect sees the stale value
        let previous = self.previous.take();
        debug!("Restoring build root to {:?}", previous);
        self.root.replace(previous);
    }
}
