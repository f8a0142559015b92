//! Extension Store
//!
//! Persistence for installed extension records. The [`ExtensionStore`] trait
//! is the contract the manager programs against; two implementations ship
//! with the crate:
//!
//! - [`MemoryStore`]: process-local table, used for tests and embedding
//! - [`FileStore`]: TOML ledger on disk with advisory locking, safe to share
//!   between processes
//!
//! # Example
//!
//! ```
//! use ext_store::{ExtensionStore, Filter, MemoryStore, NewExtension};
//!
//! let store = MemoryStore::new();
//! let menus = store.create(NewExtension::new("menus").with_name("Menus")).unwrap();
//! assert_eq!(menus.id, 1);
//!
//! let disabled = store.disabled(None).unwrap();
//! assert_eq!(disabled.len(), 1);
//! assert!(store.enabled(Some(&Filter::all())).unwrap().is_empty());
//! ```

pub mod error;
pub mod file;
pub mod filter;
pub mod memory;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use file::FileStore;
pub use filter::{Condition, Field, Filter, Value};
pub use memory::MemoryStore;
pub use record::{Extension, NewExtension};
pub use store::ExtensionStore;
