//! [`ExtensionTree`] builder for on-disk extension layouts.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::descriptor::Descriptor;

/// A temporary project directory with an `extensions/` root.
///
/// # Example
///
/// ```rust,no_run
/// use ext_test_utils::{Descriptor, ExtensionTree};
///
/// let tree = ExtensionTree::new();
/// tree.add("menus", &Descriptor::new("Menus").dependencies(&["users"]));
/// tree.add_grouped("platform", "users", &Descriptor::new("Users"));
/// tree.assert_file_exists("extensions/platform/users/extension.toml");
/// ```
pub struct ExtensionTree {
    temp_dir: TempDir,
}

impl Default for ExtensionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionTree {
    /// Create a project directory with an empty `extensions/` root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("extensions")).unwrap();
        Self { temp_dir }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The `extensions/` directory that descriptors are written under.
    pub fn extensions_dir(&self) -> PathBuf {
        self.root().join("extensions")
    }

    /// Write `extensions/<slug>/extension.toml`. Returns the descriptor path.
    pub fn add(&self, slug: &str, descriptor: &Descriptor) -> PathBuf {
        self.write_descriptor(&self.extensions_dir().join(slug), &descriptor.to_toml())
    }

    /// Write `extensions/<group>/<slug>/extension.toml`.
    pub fn add_grouped(&self, group: &str, slug: &str, descriptor: &Descriptor) -> PathBuf {
        self.write_descriptor(
            &self.extensions_dir().join(group).join(slug),
            &descriptor.to_toml(),
        )
    }

    /// Write raw descriptor text for `slug`, valid or not.
    pub fn add_raw(&self, slug: &str, content: &str) -> PathBuf {
        self.write_descriptor(&self.extensions_dir().join(slug), content)
    }

    /// Write a file relative to the project root.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn write_descriptor(&self, dir: &Path, content: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("extension.toml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Assert that `path` (relative to the project root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }
}
