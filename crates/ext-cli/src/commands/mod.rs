//! Command implementations for the extmgr CLI

pub mod extension;

use std::path::Path;

use ext_manager::{ConfigResolver, ExtensionManager};

use crate::error::Result;

pub use extension::{
    run_disable, run_enable, run_info, run_install, run_list, run_prepare, run_sort, run_start,
};

/// Resolve configuration for `root` and build a manager over its ledger.
pub fn open_manager(root: &Path, config: Option<&Path>) -> Result<ExtensionManager> {
    let mut resolver = ConfigResolver::new(root);
    if let Some(path) = config {
        resolver = resolver.with_explicit_file(path);
    }
    let config = resolver.resolve()?;
    tracing::debug!(?config, "Resolved manager configuration");
    Ok(ExtensionManager::from_config(config))
}
