//! Filesystem layer for the extension manager
//!
//! Provides atomic writes, create-if-absent semantics and advisory
//! lock guards shared by the persistent store and the descriptor loader.

pub mod error;
pub mod io;
pub mod lock;

pub use error::{Error, Result};
pub use lock::{FileLock, LockMode};
