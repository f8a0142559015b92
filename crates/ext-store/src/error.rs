//! Error types for ext-store

use std::path::PathBuf;

/// Result type for ext-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ext-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another record already owns this slug
    #[error("an extension with slug '{slug}' is already installed")]
    DuplicateSlug { slug: String },

    /// `save` was called for a record the store does not hold
    #[error("no extension record with id {id}")]
    RecordNotFound { id: i64 },

    /// The backing storage has not been created yet
    #[error("extension store at {path} has not been prepared")]
    NotPrepared { path: PathBuf },

    /// Filesystem error from ext-fs
    #[error(transparent)]
    Fs(#[from] ext_fs::Error),

    /// TOML deserialization error
    #[error("corrupt extension ledger: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}
