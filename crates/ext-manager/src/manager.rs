//! The extension manager
//!
//! Ties discovery, persistence, ordering and the start protocol together.
//!
//! Every extension has two independent pieces of state:
//!
//! - persistent: not installed, or installed with `enabled` on or off
//! - per process: not started, or started
//!
//! Installing an extension always starts it, so that its code is available
//! to its migrations. Starting is idempotent: registration, activation and
//! hooks run at most once per slug for the lifetime of the manager.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use ext_store::{Extension, ExtensionStore, FileStore, Filter, NewExtension};
use parking_lot::ReentrantMutex;

use crate::code::{BundleRegistry, CodeLoader};
use crate::config::{ManagerConfig, StartOrder};
use crate::dependency::{DependencyMap, DependencyResolver};
use crate::descriptor::{ExtensionMetadata, MetadataLoader};
use crate::hooks::HookRegistry;
use crate::migration::{CommandMigrations, MigrationRunner, NoMigrations};
use crate::scanner::DirectoryScanner;
use crate::{Error, Lookup, Result};

/// What to start: a slug to look up in the store, or a record already loaded.
#[derive(Debug, Clone)]
pub enum StartTarget {
    Slug(String),
    Record(Extension),
}

impl From<&str> for StartTarget {
    fn from(slug: &str) -> Self {
        StartTarget::Slug(slug.to_string())
    }
}

impl From<String> for StartTarget {
    fn from(slug: String) -> Self {
        StartTarget::Slug(slug)
    }
}

impl From<&Extension> for StartTarget {
    fn from(record: &Extension) -> Self {
        StartTarget::Record(record.clone())
    }
}

impl From<Extension> for StartTarget {
    fn from(record: Extension) -> Self {
        StartTarget::Record(record)
    }
}

#[derive(Debug, Default)]
struct RuntimeRegistry {
    /// Started slugs, in start order.
    started: Vec<String>,
    /// Slugs whose start sequence is running on this thread.
    starting: HashSet<String>,
}

/// Marks a slug as starting until dropped, including when a hook panics.
struct StartingEntry<'a> {
    runtime: &'a RefCell<RuntimeRegistry>,
    slug: &'a str,
}

impl<'a> StartingEntry<'a> {
    fn claim(runtime: &'a RefCell<RuntimeRegistry>, slug: &'a str) -> Self {
        runtime.borrow_mut().starting.insert(slug.to_string());
        Self { runtime, slug }
    }
}

impl Drop for StartingEntry<'_> {
    fn drop(&mut self) {
        self.runtime.borrow_mut().starting.remove(self.slug);
    }
}

/// Manages installation, enablement and startup of extensions.
///
/// The manager is `Send + Sync`. Its runtime registry is guarded by a
/// re-entrant lock held for the whole start sequence, so a hook may start
/// another extension from the same thread while concurrent callers wait.
pub struct ExtensionManager {
    config: ManagerConfig,
    store: Arc<dyn ExtensionStore>,
    loader: MetadataLoader,
    code: Arc<dyn CodeLoader>,
    migrations: Arc<dyn MigrationRunner>,
    runtime: ReentrantMutex<RefCell<RuntimeRegistry>>,
}

impl ExtensionManager {
    /// Manager over `store`, with collaborators derived from `config`.
    ///
    /// Code is tracked by a fresh [`BundleRegistry`]. Migrations run
    /// `config.migrations.command` when one is set.
    pub fn new(config: ManagerConfig, store: Arc<dyn ExtensionStore>) -> Self {
        let scanner = DirectoryScanner::new(config.roots.clone(), config.descriptor.clone());
        let migrations: Arc<dyn MigrationRunner> = match &config.migrations.command {
            Some(command) => {
                let mut runner = CommandMigrations::new(command.clone(), config.root.clone());
                if let Some(prepare) = &config.migrations.prepare {
                    runner = runner.with_prepare(prepare.clone());
                }
                Arc::new(runner)
            }
            None => Arc::new(NoMigrations),
        };

        Self {
            loader: MetadataLoader::new(scanner, HookRegistry::new()),
            store,
            code: Arc::new(BundleRegistry::new()),
            migrations,
            runtime: ReentrantMutex::new(RefCell::new(RuntimeRegistry::default())),
            config,
        }
    }

    /// Manager over the TOML ledger at `config.store.path`.
    pub fn from_config(config: ManagerConfig) -> Self {
        let store = Arc::new(FileStore::new(config.store.path.clone()));
        Self::new(config, store)
    }

    /// Callbacks that descriptor hooks may name.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.loader.set_hooks(hooks);
        self
    }

    pub fn with_code_loader(mut self, code: Arc<dyn CodeLoader>) -> Self {
        self.code = code;
        self
    }

    pub fn with_migrations(mut self, migrations: Arc<dyn MigrationRunner>) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ExtensionStore {
        self.store.as_ref()
    }

    // ------------------------------------------------------------------
    // Persistent state
    // ------------------------------------------------------------------

    /// Install the extension found on disk under `slug`.
    ///
    /// The record is created from the descriptor's `[info]` table, the
    /// extension is started, and its migrations are run. Nothing is rolled
    /// back when a later step fails: a migration failure leaves the record
    /// persisted and the extension started.
    pub fn install(&self, slug: &str, enable: bool) -> Result<Extension> {
        let slug = slug.to_lowercase();
        let meta = self.loader.info(&slug)?;

        if let Some(declared) = &meta.info.slug
            && declared.to_lowercase() != slug
        {
            tracing::warn!(
                slug = %slug,
                declared = %declared,
                "Descriptor declares a different slug; using the directory name"
            );
        }

        let info = meta.info;
        let record = NewExtension {
            slug: slug.clone(),
            name: info.name.unwrap_or_default(),
            version: info.version.unwrap_or_default(),
            author: Some(info.author.unwrap_or_default()),
            description: Some(info.description.unwrap_or_default()),
            is_core: info.is_core,
            enabled: enable,
        };

        let created = self.store.create(record)?;
        tracing::info!(id = created.id, slug = %slug, enabled = enable, "Installed extension");

        self.start(&created)?;
        self.migrations.run_migrations(&slug)?;

        Ok(created)
    }

    /// Mark the record with `id` enabled. Takes effect at the next boot.
    pub fn enable(&self, id: i64) -> Result<Extension> {
        self.set_enabled(id, true)
    }

    /// Mark the record with `id` disabled. Already started code stays loaded.
    pub fn disable(&self, id: i64) -> Result<Extension> {
        self.set_enabled(id, false)
    }

    fn set_enabled(&self, id: i64, enabled: bool) -> Result<Extension> {
        let mut record = self
            .store
            .find(id)?
            .ok_or(Error::ExtensionNotFound(Lookup::Id(id)))?;
        record.enabled = enabled;
        self.store.save(&record)?;
        tracing::info!(id, slug = %record.slug, enabled, "Updated extension");
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Runtime state
    // ------------------------------------------------------------------

    /// Start one extension.
    ///
    /// A slug must belong to an installed record. Starting an extension that
    /// was already started by this manager does nothing.
    pub fn start(&self, target: impl Into<StartTarget>) -> Result<&Self> {
        let slug = match target.into() {
            StartTarget::Slug(slug) => {
                let slug = slug.to_lowercase();
                self.store
                    .find_by_slug(&slug)?
                    .ok_or(Error::ExtensionNotFound(Lookup::Slug(slug)))?
                    .slug
            }
            StartTarget::Record(record) => record.slug,
        };

        let guard = self.runtime.lock();
        {
            let runtime = guard.borrow();
            if runtime.started.contains(&slug) {
                tracing::debug!(slug = %slug, "Extension already started");
                return Ok(self);
            }
            if runtime.starting.contains(&slug) {
                tracing::debug!(slug = %slug, "Extension start already in progress");
                return Ok(self);
            }
        }

        let in_progress = StartingEntry::claim(&guard, &slug);
        let outcome = self.run_start_sequence(&slug);
        drop(in_progress);
        outcome?;

        guard.borrow_mut().started.push(slug.clone());
        tracing::info!(slug = %slug, "Started extension");
        Ok(self)
    }

    fn run_start_sequence(&self, slug: &str) -> Result<()> {
        let meta = self.loader.info(slug)?;

        if let Some(bundles) = &meta.bundles {
            self.code.register(slug, bundles)?;
        }
        self.code.activate(slug)?;

        if let Some(hook) = &meta.global_routes {
            hook.invoke(slug, "global_routes", meta.dir())?;
        }
        if let Some(hook) = &meta.listeners {
            hook.invoke(slug, "listeners", meta.dir())?;
        }
        Ok(())
    }

    /// Start every enabled extension, in the configured [`StartOrder`].
    pub fn start_extensions(&self) -> Result<&Self> {
        let enabled = self.enabled(None)?;
        tracing::debug!(count = enabled.len(), order = ?self.config.start_order, "Starting enabled extensions");

        match self.config.start_order {
            StartOrder::Store => {
                for record in &enabled {
                    self.start(record)?;
                }
            }
            StartOrder::Dependencies => {
                let slugs: Vec<String> = enabled.iter().map(|r| r.slug.clone()).collect();
                for slug in self.sort_dependencies(&slugs)? {
                    if let Some(record) = enabled.iter().find(|r| r.slug == slug) {
                        self.start(record)?;
                    }
                }
            }
        }
        Ok(self)
    }

    /// Whether `slug` was started by this manager.
    pub fn is_started(&self, slug: &str) -> bool {
        let slug = slug.to_lowercase();
        self.runtime.lock().borrow().started.contains(&slug)
    }

    /// Started slugs, in the order they were started.
    pub fn started(&self) -> Vec<String> {
        self.runtime.lock().borrow().started.clone()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn installed(&self, filter: Option<&Filter>) -> Result<Vec<Extension>> {
        match filter {
            Some(filter) => Ok(self.store.all(filter)?),
            None => Ok(self.store.all(&Filter::all())?),
        }
    }

    pub fn enabled(&self, filter: Option<&Filter>) -> Result<Vec<Extension>> {
        Ok(self.store.enabled(filter)?)
    }

    pub fn disabled(&self, filter: Option<&Filter>) -> Result<Vec<Extension>> {
        Ok(self.store.disabled(filter)?)
    }

    /// Slugs found on disk that have no record matching `filter`, in
    /// discovery order.
    pub fn uninstalled(&self, filter: Option<&Filter>) -> Result<Vec<String>> {
        let installed: HashSet<String> = self
            .installed(filter)?
            .into_iter()
            .map(|r| r.slug.to_lowercase())
            .collect();

        Ok(self
            .loader
            .scanner()
            .slugs()?
            .into_iter()
            .filter(|slug| !installed.contains(slug))
            .collect())
    }

    /// Order `slugs` so that every extension follows its dependencies.
    pub fn sort_dependencies(&self, slugs: &[String]) -> Result<Vec<String>> {
        let mut map = DependencyMap::new();
        for slug in slugs {
            let meta = self.loader.info(slug)?;
            map.insert(slug.to_lowercase(), meta.dependency_slugs().to_vec());
        }
        DependencyResolver::sort(&map)
    }

    // ------------------------------------------------------------------
    // Bootstrap and discovery
    // ------------------------------------------------------------------

    /// Create migration bookkeeping and the store if missing, then start every
    /// enabled extension.
    pub fn prepare(&self) -> Result<&Self> {
        self.migrations.prepare()?;
        self.store.prepare()?;
        tracing::debug!("Extension storage ready");
        self.start_extensions()
    }

    /// Descriptor metadata for `slug`, read fresh from disk.
    pub fn info(&self, slug: &str) -> Result<ExtensionMetadata> {
        self.loader.info(slug)
    }

    pub fn directories(&self) -> Result<Vec<PathBuf>> {
        self.loader.scanner().directories()
    }

    pub fn find_descriptor(&self, slug: &str) -> Result<Option<PathBuf>> {
        self.loader.scanner().find_descriptor(slug)
    }
}

impl std::fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionManager")
            .field("config", &self.config)
            .field("started", &self.started())
            .finish_non_exhaustive()
    }
}
