//! TOML ledger backed extension store
//!
//! The ledger is a single TOML document:
//!
//! ```toml
//! version = "1.0"
//! next_id = 1
//!
//! [[extensions]]
//! id = 1
//! slug = "users"
//! name = "Users"
//! version = "1.0"
//! enabled = true
//! ```
//!
//! Reads happen under a shared lock. Every mutation holds an exclusive lock
//! across load, modify and the atomic rename so that concurrent installs in
//! separate processes cannot both claim the same slug or id.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ext_fs::{FileLock, io};
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::memory::replace_row;
use crate::record::{Extension, NewExtension};
use crate::store::ExtensionStore;
use crate::{Error, Result};

const LEDGER_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ledger {
    version: String,
    /// Highest id handed out so far.
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    extensions: Vec<Extension>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION.to_string(),
            next_id: 0,
            extensions: Vec::new(),
        }
    }
}

/// Store persisted to a TOML ledger file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_unlocked(&self) -> Result<Ledger> {
        let content = io::read_text(&self.path).map_err(|e| {
            if e.is_io_kind(ErrorKind::NotFound) {
                Error::NotPrepared {
                    path: self.path.clone(),
                }
            } else {
                Error::Fs(e)
            }
        })?;
        let mut ledger: Ledger = toml::from_str(&content)?;
        ledger.extensions.sort_by_key(|r| r.id);
        Ok(ledger)
    }

    /// Taking a lock creates the sidecar file, so an unprepared ledger is
    /// reported before locking.
    fn ensure_prepared(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(Error::NotPrepared {
                path: self.path.clone(),
            })
        }
    }

    fn read(&self) -> Result<Ledger> {
        self.ensure_prepared()?;
        let _lock = FileLock::shared(&self.path)?;
        self.load_unlocked()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        self.ensure_prepared()?;
        let _lock = FileLock::exclusive(&self.path)?;
        let mut ledger = self.load_unlocked()?;
        let out = f(&mut ledger)?;
        let content = toml::to_string_pretty(&ledger)?;
        io::write_atomic(&self.path, content.as_bytes())?;
        Ok(out)
    }
}

impl ExtensionStore for FileStore {
    fn prepare(&self) -> Result<()> {
        let _lock = FileLock::exclusive(&self.path)?;
        let content = toml::to_string_pretty(&Ledger::default())?;
        if io::create_new(&self.path, content.as_bytes())? {
            tracing::info!(path = %self.path.display(), "Created extension ledger");
        } else {
            tracing::debug!(path = %self.path.display(), "Extension ledger already exists");
        }
        Ok(())
    }

    fn create(&self, record: NewExtension) -> Result<Extension> {
        self.mutate(|ledger| {
            if ledger.extensions.iter().any(|r| r.slug == record.slug) {
                return Err(Error::DuplicateSlug { slug: record.slug });
            }
            // Guard against hand-edited ledgers whose counter fell behind.
            let highest = ledger.extensions.iter().map(|r| r.id).max().unwrap_or(0);
            ledger.next_id = ledger.next_id.max(highest) + 1;
            let created = record.into_record(ledger.next_id);
            ledger.extensions.push(created.clone());
            tracing::debug!(id = created.id, slug = %created.slug, "Created extension record");
            Ok(created)
        })
    }

    fn find(&self, id: i64) -> Result<Option<Extension>> {
        Ok(self.read()?.extensions.into_iter().find(|r| r.id == id))
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Extension>> {
        Ok(self.read()?.extensions.into_iter().find(|r| r.slug == slug))
    }

    fn all(&self, filter: &Filter) -> Result<Vec<Extension>> {
        Ok(filter.apply(&self.read()?.extensions))
    }

    fn save(&self, record: &Extension) -> Result<()> {
        self.mutate(|ledger| replace_row(&mut ledger.extensions, record))
    }
}
