//! Extension directory discovery
//!
//! Every configured root is scanned in two layers:
//!
//! - top-level: `<root>/<slug>/<descriptor>`
//! - grouped:   `<root>/<group>/<slug>/<descriptor>`
//!
//! The top-level layer of all roots is merged before any grouped layer, so a
//! slug present in both places resolves to its top-level directory. Within a
//! layer, directories are sorted by path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::{EXEMPT_SLUGS, Result};

/// Finds extension directories under a set of roots.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    roots: Vec<PathBuf>,
    descriptor: String,
}

impl DirectoryScanner {
    pub fn new(roots: Vec<PathBuf>, descriptor: impl Into<String>) -> Self {
        Self {
            roots,
            descriptor: descriptor.into(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// File name of the per-extension descriptor.
    pub fn descriptor_name(&self) -> &str {
        &self.descriptor
    }

    /// Deduplicated extension directories, top-level layer first.
    ///
    /// Exempt slugs are dropped; an empty result is not an error.
    pub fn directories(&self) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();

        for dir in self.candidates()? {
            let Some(slug) = slug_of(&dir) else {
                continue;
            };
            if EXEMPT_SLUGS.contains(&slug.as_str()) {
                tracing::debug!(slug = %slug, "Skipping exempt extension directory");
                continue;
            }
            if seen.insert(slug.clone()) {
                dirs.push(dir);
            } else {
                tracing::debug!(slug = %slug, dir = %dir.display(), "Shadowed by an earlier directory");
            }
        }

        tracing::debug!(count = dirs.len(), "Scanned extension directories");
        Ok(dirs)
    }

    /// Slugs of [`directories`](Self::directories), in the same order.
    pub fn slugs(&self) -> Result<Vec<String>> {
        Ok(self
            .directories()?
            .iter()
            .filter_map(|d| slug_of(d))
            .collect())
    }

    /// Descriptor path for `slug`, searching the same layers in the same order.
    pub fn find_descriptor(&self, slug: &str) -> Result<Option<PathBuf>> {
        let wanted = slug.to_lowercase();
        let found = self
            .candidates()?
            .into_iter()
            .find(|dir| slug_of(dir).as_deref() == Some(wanted.as_str()))
            .map(|dir| dir.join(&self.descriptor));
        Ok(found)
    }

    /// Every directory holding a descriptor, top-level layer then grouped.
    fn candidates(&self) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for grouped in [false, true] {
            for root in &self.roots {
                out.extend(self.layer(root, grouped)?);
            }
        }
        Ok(out)
    }

    fn layer(&self, root: &Path, grouped: bool) -> Result<Vec<PathBuf>> {
        let mut pattern = Pattern::escape(&root.to_string_lossy());
        pattern.push_str("/*/");
        if grouped {
            pattern.push_str("*/");
        }
        pattern.push_str(&Pattern::escape(&self.descriptor));

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let mut dirs = Vec::new();
        for entry in glob::glob_with(&pattern, options)? {
            let descriptor = entry?;
            if !descriptor.is_file() {
                continue;
            }
            if let Some(dir) = descriptor.parent() {
                dirs.push(dir.to_path_buf());
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

/// Slug of an extension directory: its name, lower-cased.
pub fn slug_of(dir: &Path) -> Option<String> {
    match dir.file_name()?.to_str() {
        Some(name) => Some(name.to_lowercase()),
        None => {
            tracing::warn!(dir = %dir.display(), "Ignoring extension directory with a non UTF-8 name");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[info]\n").unwrap();
    }

    #[test]
    fn slug_is_lowercased_dir_name() {
        assert_eq!(slug_of(Path::new("/x/Menus")), Some("menus".to_string()));
    }

    #[test]
    fn top_level_precedes_grouped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "platform/alpha/extension.toml");
        touch(dir.path(), "zeta/extension.toml");

        let scanner = DirectoryScanner::new(vec![dir.path().to_path_buf()], "extension.toml");
        assert_eq!(scanner.slugs().unwrap(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn hidden_and_exempt_directories_are_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".cache/extension.toml");
        touch(dir.path(), "installer/extension.toml");
        touch(dir.path(), "extensions/extension.toml");
        touch(dir.path(), "menus/extension.toml");

        let scanner = DirectoryScanner::new(vec![dir.path().to_path_buf()], "extension.toml");
        assert_eq!(scanner.slugs().unwrap(), vec!["menus"]);
    }

    #[test]
    fn directories_without_descriptor_are_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        touch(dir.path(), "menus/README.md");

        let scanner = DirectoryScanner::new(vec![dir.path().to_path_buf()], "extension.toml");
        assert!(scanner.directories().unwrap().is_empty());
    }

    #[test]
    fn root_with_glob_characters_is_escaped() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("ext[1]");
        touch(&root, "menus/extension.toml");

        let scanner = DirectoryScanner::new(vec![root], "extension.toml");
        assert_eq!(scanner.slugs().unwrap(), vec!["menus"]);
    }

    #[test]
    fn find_descriptor_matches_case_insensitively() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "Menus/extension.toml");

        let scanner = DirectoryScanner::new(vec![dir.path().to_path_buf()], "extension.toml");
        let found = scanner.find_descriptor("menus").unwrap().unwrap();
        assert_eq!(found, dir.path().join("Menus").join("extension.toml"));
        assert_eq!(scanner.find_descriptor("missing").unwrap(), None);
    }
}
