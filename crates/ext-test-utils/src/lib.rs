//! Shared test utilities for the extension manager workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`ExtensionTree`] builder for on-disk extension layouts
//! - [`descriptor`]: [`Descriptor`] builder for `extension.toml` content
//! - [`hooks`]: counting callbacks for asserting hook invocation

pub mod descriptor;
pub mod hooks;
pub mod tree;

pub use descriptor::Descriptor;
pub use hooks::{CallLog, counting_hook};
pub use tree::ExtensionTree;
