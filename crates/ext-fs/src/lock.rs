//! Advisory lock guards backed by a sidecar `.lock` file
//!
//! Data files are replaced by rename on every write, so locking the data
//! file itself would lock an inode that is about to disappear. Instead every
//! guarded path gets a stable sidecar (`registry.toml` -> `registry.toml.lock`)
//! that readers lock shared and writers lock exclusively for the whole
//! read-modify-write cycle.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// How a [`FileLock`] is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Held advisory lock; released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl FileLock {
    /// Block until a shared lock for `target` is held.
    pub fn shared(target: &Path) -> Result<Self> {
        Self::acquire(target, LockMode::Shared)
    }

    /// Block until an exclusive lock for `target` is held.
    pub fn exclusive(target: &Path) -> Result<Self> {
        Self::acquire(target, LockMode::Exclusive)
    }

    fn acquire(target: &Path, mode: LockMode) -> Result<Self> {
        let path = lock_path(target);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|_| Error::LockFailed { path: path.clone() })?;

        Ok(Self { file, path, mode })
    }

    /// Path of the sidecar lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), "Failed to release lock: {}", e);
        }
    }
}

/// Sidecar lock path for `target`.
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}
