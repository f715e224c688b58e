use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use engine_logging::{engine_debug, engine_trace};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("output file {path:?} is in use ({count} lease(s) outstanding)")]
    InUse { path: PathBuf, count: usize },
}

/// Reference counts of output files that are being written or displayed.
///
/// Cloning yields another handle to the same table. Every operation takes the
/// one lock, so completion callbacks and close handlers may race freely.
#[derive(Debug, Clone, Default)]
pub struct OutputFileRegistry {
    counts: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl OutputFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut counts = self.lock();
        let count = counts.entry(path.to_path_buf()).or_insert(0);
        *count += 1;
        engine_trace!("Lease acquired on {:?} (count {})", path, count);
    }

    /// Drops one lease. Releasing an unleased path does nothing.
    pub fn release(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut counts = self.lock();
        match counts.get_mut(path) {
            Some(count) if *count > 1 => {
                *count -= 1;
                engine_trace!("Lease released on {:?} (count {})", path, count);
            }
            Some(_) => {
                counts.remove(path);
                engine_trace!("Last lease released on {:?}", path);
            }
            None => engine_debug!("Release of unleased path {:?} ignored", path),
        }
    }

    pub fn is_leased(&self, path: impl AsRef<Path>) -> bool {
        self.lease_count(path) > 0
    }

    pub fn lease_count(&self, path: impl AsRef<Path>) -> usize {
        self.lock().get(path.as_ref()).copied().unwrap_or(0)
    }

    /// Fails when `path` must not be deleted or reopened for writing.
    pub fn ensure_writable(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        match self.lease_count(path) {
            0 => Ok(()),
            count => Err(RegistryError::InUse {
                path: path.to_path_buf(),
                count,
            }),
        }
    }

    /// Checks for other holders and takes a lease under one lock.
    ///
    /// The lease is taken even when `InUse` is returned, so the caller
    /// releases it exactly once either way.
    pub fn try_acquire(&self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let mut counts = self.lock();
        let count = counts.entry(path.to_path_buf()).or_insert(0);
        let prior = *count;
        *count += 1;
        engine_trace!("Lease acquired on {:?} (count {})", path, count);
        match prior {
            0 => Ok(()),
            count => Err(RegistryError::InUse {
                path: path.to_path_buf(),
                count,
            }),
        }
    }

    /// Acquires a lease that is given back when the guard is dropped.
    pub fn lease(&self, path: impl AsRef<Path>) -> OutputFileLease {
        let path = path.as_ref().to_path_buf();
        self.acquire(&path);
        OutputFileLease {
            registry: self.clone(),
            path,
            released: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, usize>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One lease on one path, released at most once.
#[derive(Debug)]
pub struct OutputFileLease {
    registry: OutputFileRegistry,
    path: PathBuf,
    released: bool,
}

impl OutputFileLease {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if !std::mem::replace(&mut self.released, true) {
            self.registry.release(&self.path);
        }
    }
}

impl Drop for OutputFileLease {
    fn drop(&mut self) {
        self.release();
    }
}
