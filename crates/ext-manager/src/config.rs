//! Manager configuration
//!
//! Configuration is read from up to three TOML layers, later layers
//! overriding the fields they set:
//!
//! 1. Global defaults (`<config_dir>/extmgr/config.toml`)
//! 2. Project config (`<root>/extmgr.toml`)
//! 3. An explicit file passed by the caller
//!
//! ```toml
//! roots = ["extensions", "vendor/extensions"]
//! descriptor = "extension.toml"
//! start_order = "dependencies"
//!
//! [store]
//! path = ".extensions/registry.toml"
//!
//! [migrations]
//! command = "bin/migrate {slug}"
//! prepare = "bin/migrate --install"
//! ```
//!
//! Relative paths are resolved against the project root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{DESCRIPTOR_FILENAME, Error, Result};

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILENAME: &str = "extmgr.toml";

/// Order in which `start_extensions` starts enabled extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartOrder {
    /// The order the store returns records in.
    #[default]
    Store,
    /// Dependencies before dependents.
    Dependencies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Location of the TOML ledger.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".extensions/registry.toml"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Shell command run once per install; `{slug}` is substituted.
    pub command: Option<String>,
    /// Shell command run by `prepare`.
    pub prepare: Option<String>,
}

/// Effective configuration after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Project root; relative paths below were resolved against it.
    #[serde(skip)]
    pub root: PathBuf,
    pub roots: Vec<PathBuf>,
    pub descriptor: String,
    pub start_order: StartOrder,
    pub store: StoreConfig,
    pub migrations: MigrationConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            roots: vec![PathBuf::from("extensions")],
            descriptor: DESCRIPTOR_FILENAME.to_string(),
            start_order: StartOrder::default(),
            store: StoreConfig::default(),
            migrations: MigrationConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Defaults with paths anchored at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self {
            root: root.into(),
            ..Self::default()
        };
        config.anchor();
        config
    }

    /// Resolve relative paths against `self.root`.
    fn anchor(&mut self) {
        let root = self.root.clone();
        for dir in &mut self.roots {
            *dir = anchored(&root, dir);
        }
        self.store.path = anchored(&root, &self.store.path);
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(roots) = layer.roots {
            self.roots = roots;
        }
        if let Some(descriptor) = layer.descriptor {
            self.descriptor = descriptor;
        }
        if let Some(order) = layer.start_order {
            self.start_order = order;
        }
        if let Some(path) = layer.store.and_then(|s| s.path) {
            self.store.path = path;
        }
        if let Some(migrations) = layer.migrations {
            if migrations.command.is_some() {
                self.migrations.command = migrations.command;
            }
            if migrations.prepare.is_some() {
                self.migrations.prepare = migrations.prepare;
            }
        }
    }
}

fn anchored(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// A single config file; every field optional so layers can be partial.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    roots: Option<Vec<PathBuf>>,
    descriptor: Option<String>,
    start_order: Option<StartOrder>,
    store: Option<StoreLayer>,
    migrations: Option<MigrationConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct StoreLayer {
    path: Option<PathBuf>,
}

impl ConfigLayer {
    fn load(path: &Path) -> Result<Self> {
        let content = ext_fs::io::read_text(path)?;
        toml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolves [`ManagerConfig`] from the global, project and explicit layers.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    root: PathBuf,
    /// Replaces `dirs::config_dir()/extmgr` when set.
    global_config_dir_override: Option<PathBuf>,
    explicit: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
            explicit: None,
        }
    }

    /// Use `dir` instead of the platform config directory.
    pub fn with_global_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_config_dir_override = Some(dir.into());
        self
    }

    /// Add a final layer read from `path`. The file must exist.
    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("extmgr"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Merge every present layer over the defaults.
    ///
    /// Missing global and project files are skipped. Invalid TOML in any
    /// layer is an error.
    pub fn resolve(&self) -> Result<ManagerConfig> {
        let mut config = ManagerConfig {
            root: self.root.clone(),
            ..ManagerConfig::default()
        };

        if let Some(global_dir) = self.global_config_dir() {
            let global_config_path = global_dir.join("config.toml");
            if global_config_path.is_file() {
                tracing::debug!(?global_config_path, "Loading global config (layer 1)");
                config.apply(ConfigLayer::load(&global_config_path)?);
            } else {
                tracing::debug!(?global_config_path, "No global config found (layer 1), skipping");
            }
        }

        let project_config_path = self.root.join(PROJECT_CONFIG_FILENAME);
        if project_config_path.is_file() {
            tracing::debug!(?project_config_path, "Loading project config (layer 2)");
            config.apply(ConfigLayer::load(&project_config_path)?);
        }

        if let Some(ref explicit) = self.explicit {
            tracing::debug!(?explicit, "Loading explicit config (layer 3)");
            config.apply(ConfigLayer::load(explicit)?);
        }

        config.anchor();
        Ok(config)
    }
}
