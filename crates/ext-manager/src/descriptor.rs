//! Extension descriptor loading
//!
//! Descriptors are read from disk on every call; nothing is cached, so edits
//! made while the process runs are picked up by the next load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hooks::{Hook, HookRegistry};
use crate::scanner::DirectoryScanner;
use crate::{Error, Lookup, Result};

/// The `[info]` table of a descriptor. Every field is optional as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    /// Free-form; unquoted numbers such as `1.0` or `2` are kept as text.
    #[serde(default, deserialize_with = "version_text")]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_core: Option<bool>,
}

fn version_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<toml::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s)),
        Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
        Some(toml::Value::Float(f)) => Ok(Some(format!("{f:?}"))),
        Some(other) => Err(D::Error::custom(format!(
            "version must be a string or number, found {}",
            other.type_str()
        ))),
    }
}

/// Opaque code-registration payload from the `[bundles]` table.
#[derive(Debug, Clone, PartialEq)]
pub struct BundlePayload(toml::Value);

impl BundlePayload {
    pub fn new(value: toml::Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &toml::Value {
        &self.0
    }

    /// Look up a key when the payload is a table.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }
}

/// Everything a descriptor declares about one extension.
#[derive(Debug, Clone)]
pub struct ExtensionMetadata {
    /// Slug the descriptor was resolved for.
    pub slug: String,
    /// Location of the descriptor file.
    pub path: PathBuf,
    pub info: ExtensionInfo,
    pub dependencies: Option<Vec<String>>,
    pub bundles: Option<BundlePayload>,
    pub global_routes: Option<Hook>,
    pub listeners: Option<Hook>,
}

impl ExtensionMetadata {
    /// The extension directory.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Declared dependencies, empty when absent.
    pub fn dependency_slugs(&self) -> &[String] {
        self.dependencies.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    info: ExtensionInfo,
    dependencies: Option<toml::Value>,
    bundles: Option<toml::Value>,
    global_routes: Option<toml::Value>,
    listeners: Option<toml::Value>,
}

/// Resolves slugs to descriptors and parses them.
#[derive(Debug, Clone)]
pub struct MetadataLoader {
    scanner: DirectoryScanner,
    hooks: HookRegistry,
}

impl MetadataLoader {
    pub fn new(scanner: DirectoryScanner, hooks: HookRegistry) -> Self {
        Self { scanner, hooks }
    }

    pub fn scanner(&self) -> &DirectoryScanner {
        &self.scanner
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn set_hooks(&mut self, hooks: HookRegistry) {
        self.hooks = hooks;
    }

    /// Locate and parse the descriptor for `slug`.
    pub fn info(&self, slug: &str) -> Result<ExtensionMetadata> {
        let path = self
            .scanner
            .find_descriptor(slug)?
            .ok_or_else(|| Error::ExtensionNotFound(Lookup::Descriptor(slug.to_string())))?;
        self.load(slug, &path)
    }

    /// Parse the descriptor at `path` on behalf of `slug`.
    pub fn load(&self, slug: &str, path: &Path) -> Result<ExtensionMetadata> {
        tracing::debug!(slug, path = %path.display(), "Loading extension descriptor");
        let content = ext_fs::io::read_text(path)?;
        let raw: RawDescriptor = toml::from_str(&content).map_err(|source| Error::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })?;

        let slug = slug.to_lowercase();
        let dependencies = raw
            .dependencies
            .and_then(|value| dependency_list(&slug, value));

        Ok(ExtensionMetadata {
            path: path.to_path_buf(),
            info: raw.info,
            dependencies,
            bundles: raw.bundles.map(BundlePayload::new),
            global_routes: raw.global_routes.map(|v| Hook::resolve(&v, &self.hooks)),
            listeners: raw.listeners.map(|v| Hook::resolve(&v, &self.hooks)),
            slug,
        })
    }
}

fn dependency_list(slug: &str, value: toml::Value) -> Option<Vec<String>> {
    let items = match value {
        toml::Value::Array(items) => items,
        other => {
            tracing::warn!(
                slug,
                found = other.type_str(),
                "Ignoring `dependencies` that is not a list"
            );
            return None;
        }
    };

    let mut deps = Vec::with_capacity(items.len());
    for item in items {
        match item {
            toml::Value::String(dep) => deps.push(dep.to_lowercase()),
            other => tracing::warn!(
                slug,
                found = other.type_str(),
                "Skipping non-string dependency entry"
            ),
        }
    }
    Some(deps)
}
