//! Code loading collaborator
//!
//! Starting an extension first registers its code location (when the
//! descriptor has a `[bundles]` table) and then activates it. How code is
//! actually loaded belongs to the host; the manager only calls these two
//! primitives in that order.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::descriptor::BundlePayload;

/// Failure reported by a [`CodeLoader`].
#[derive(Debug, thiserror::Error)]
#[error("Code loader failed for '{slug}': {message}")]
pub struct CodeError {
    pub slug: String,
    pub message: String,
}

impl CodeError {
    pub fn new(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            message: message.into(),
        }
    }
}

/// Host hooks for registering and activating extension code.
pub trait CodeLoader: Send + Sync {
    /// Record where the code for `slug` lives.
    fn register(&self, slug: &str, payload: &BundlePayload) -> Result<(), CodeError>;

    /// Make the code for `slug` available.
    fn activate(&self, slug: &str) -> Result<(), CodeError>;
}

#[derive(Debug, Clone)]
struct BundleEntry {
    payload: Option<BundlePayload>,
    active: bool,
}

#[derive(Debug, Default)]
struct BundleState {
    entries: HashMap<String, BundleEntry>,
    activated: Vec<String>,
}

/// In-process [`CodeLoader`] that records what was registered and activated.
#[derive(Debug, Default)]
pub struct BundleRegistry {
    state: Mutex<BundleState>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, slug: &str) -> bool {
        self.state.lock().entries.contains_key(slug)
    }

    pub fn is_active(&self, slug: &str) -> bool {
        self.state
            .lock()
            .entries
            .get(slug)
            .is_some_and(|e| e.active)
    }

    /// Payload `slug` was registered with, if any.
    pub fn payload(&self, slug: &str) -> Option<BundlePayload> {
        self.state
            .lock()
            .entries
            .get(slug)
            .and_then(|e| e.payload.clone())
    }

    /// Slugs in the order they were first activated.
    pub fn activation_order(&self) -> Vec<String> {
        self.state.lock().activated.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CodeLoader for BundleRegistry {
    fn register(&self, slug: &str, payload: &BundlePayload) -> Result<(), CodeError> {
        tracing::debug!(slug, "Registering extension bundle");
        let mut state = self.state.lock();
        state
            .entries
            .entry(slug.to_string())
            .and_modify(|e| e.payload = Some(payload.clone()))
            .or_insert_with(|| BundleEntry {
                payload: Some(payload.clone()),
                active: false,
            });
        Ok(())
    }

    fn activate(&self, slug: &str) -> Result<(), CodeError> {
        let mut state = self.state.lock();
        let entry = state
            .entries
            .entry(slug.to_string())
            .or_insert(BundleEntry {
                payload: None,
                active: false,
            });
        if entry.active {
            return Ok(());
        }
        entry.active = true;
        state.activated.push(slug.to_string());
        tracing::debug!(slug, "Activated extension bundle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(handles: &str) -> BundlePayload {
        let table: toml::Table = toml::from_str(&format!("handles = \"{handles}\"")).unwrap();
        BundlePayload::new(toml::Value::Table(table))
    }

    #[test]
    fn register_then_activate() {
        let registry = BundleRegistry::new();
        registry.register("menus", &payload("admin/menus")).unwrap();

        assert!(registry.is_registered("menus"));
        assert!(!registry.is_active("menus"));

        registry.activate("menus").unwrap();
        assert!(registry.is_active("menus"));
        assert_eq!(registry.payload("menus"), Some(payload("admin/menus")));
    }

    #[test]
    fn activating_unregistered_slug_registers_it_without_payload() {
        let registry = BundleRegistry::new();
        registry.activate("users").unwrap();

        assert!(registry.is_registered("users"));
        assert_eq!(registry.payload("users"), None);
    }

    #[test]
    fn activation_order_ignores_repeats() {
        let registry = BundleRegistry::new();
        registry.activate("users").unwrap();
        registry.activate("menus").unwrap();
        registry.activate("users").unwrap();

        assert_eq!(registry.activation_order(), vec!["users", "menus"]);
        assert_eq!(registry.len(), 2);
    }
}
