//! Error types for ext-manager

use std::fmt;
use std::path::PathBuf;

use crate::code::CodeError;
use crate::migration::MigrationError;

/// Result type for ext-manager operations
pub type Result<T> = std::result::Result<T, Error>;

/// What was being looked up when an extension could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// No descriptor on disk for this slug.
    Descriptor(String),
    /// No installed record with this slug.
    Slug(String),
    /// No installed record with this id.
    Id(i64),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Descriptor(slug) => write!(f, "no descriptor found for '{slug}'"),
            Lookup::Slug(slug) => write!(f, "'{slug}' is not installed"),
            Lookup::Id(id) => write!(f, "no installed extension with id {id}"),
        }
    }
}

/// Errors that can occur in ext-manager operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Extension not found: {0}")]
    ExtensionNotFound(Lookup),

    /// A hook was declared but cannot be invoked
    #[error("Extension '{slug}' declares {hook} as {found}, which is not invokable")]
    InvalidHookType {
        slug: String,
        hook: &'static str,
        found: String,
    },

    #[error("Cyclic dependency between extensions: {}", participants.join(" -> "))]
    CyclicDependency { participants: Vec<String> },

    /// A command hook ran and failed
    #[error("Hook {hook} of extension '{slug}' failed: {message}")]
    HookFailed {
        slug: String,
        hook: &'static str,
        message: String,
    },

    #[error("Invalid descriptor {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid scan pattern: {0}")]
    Glob(#[from] glob::PatternError),

    // Transparent wrappers for underlying crate errors
    /// Store error from ext-store
    #[error(transparent)]
    Persistence(#[from] ext_store::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Code(#[from] CodeError),

    /// Filesystem error from ext-fs
    #[error(transparent)]
    Fs(#[from] ext_fs::Error),
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Self {
        let path = e.path().to_path_buf();
        Error::Fs(ext_fs::Error::io(path, e.into_error()))
    }
}
