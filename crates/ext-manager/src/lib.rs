//! Extension lifecycle management
//!
//! This crate discovers extension packages on disk, keeps their installed and
//! enabled state in an [`ExtensionStore`](ext_store::ExtensionStore), orders
//! them by declared dependencies and starts them at boot.
//!
//! An extension is a directory containing an `extension.toml` descriptor,
//! either directly under a root (`extensions/menus/extension.toml`) or one
//! level deeper inside a group (`extensions/platform/users/extension.toml`).
//! The directory name, lower-cased, is the extension's slug.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ext_manager::{ExtensionManager, ManagerConfig};
//! use ext_store::MemoryStore;
//!
//! let config = ManagerConfig::default();
//! let manager = ExtensionManager::new(config, Arc::new(MemoryStore::new()));
//!
//! manager.install("menus", true)?;
//! manager.start_extensions()?;
//! assert!(manager.is_started("menus"));
//! # Ok::<(), ext_manager::Error>(())
//! ```

pub mod code;
pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod migration;
pub mod scanner;

pub use code::{BundleRegistry, CodeError, CodeLoader};
pub use config::{ConfigResolver, ManagerConfig, MigrationConfig, StartOrder, StoreConfig};
pub use dependency::{DependencyMap, DependencyResolver};
pub use descriptor::{BundlePayload, ExtensionInfo, ExtensionMetadata, MetadataLoader};
pub use error::{Error, Lookup, Result};
pub use hooks::{Hook, HookFn, HookRegistry};
pub use manager::{ExtensionManager, StartTarget};
pub use migration::{CommandMigrations, MigrationError, MigrationRunner, NoMigrations};
pub use scanner::DirectoryScanner;

/// Default descriptor file name inside an extension directory.
pub const DESCRIPTOR_FILENAME: &str = "extension.toml";

/// Slugs that are never offered for discovery.
pub const EXEMPT_SLUGS: &[&str] = &["extensions", "installer"];
