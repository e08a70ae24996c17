//! Session storage adapters
//!
//! The browser runtime offers two key-value stores: an ephemeral, tab-scoped
//! one holding the current session, and a persistent, origin-scoped one used
//! only for form-draft retention. Both sit behind the `SessionStore` trait so
//! the codec and lifecycle guard never touch a concrete store directly, and
//! tests run against the in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Prefix shared by every key this application writes.
pub const NAMESPACE: &str = "diagnosis";

const RESULTS_SLOT: &str = "results";
const FORM_INPUT_SLOT: &str = "form_input";
const ERROR_SLOT: &str = "error";
const SESSION_ID_SLOT: &str = "session_id";
const FORM_DRAFT_SLOT: &str = "form_draft";

/// Key-value store with string keys and values.
///
/// Purges are synchronous: `clear_prefix` must have completed by the time it
/// returns, since it runs from unload handlers that get no second chance.
pub trait SessionStore: Send + Sync {
    fn put(&self, key: &str, value: &str);
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;

    /// Remove every key under the given namespace prefix, leaving foreign
    /// keys untouched.
    fn clear_prefix(&self, prefix: &str) {
        for key in self.keys() {
            if key.starts_with(prefix) {
                self.remove(&key);
            }
        }
    }
}

/// In-process store used both as the production stand-in for the browser
/// stores and as the test fake.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn put(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

/// The two stores one tab operates on.
#[derive(Clone)]
pub struct SessionStores {
    /// Tab-scoped; purged by the lifecycle guard, not the browser.
    pub ephemeral: Arc<dyn SessionStore>,
    /// Origin-scoped; holds only the wizard draft.
    pub persistent: Arc<dyn SessionStore>,
}

impl SessionStores {
    pub fn in_memory() -> Self {
        Self {
            ephemeral: Arc::new(MemoryStore::new()),
            persistent: Arc::new(MemoryStore::new()),
        }
    }
}

/// Concrete key names for one tab's session.
///
/// The shared variant keeps the historical fixed names; the per-tab variant
/// mixes a generated token into the prefix so concurrent tabs on the same
/// origin cannot clobber each other's session keys.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// Fixed key names shared by every tab on the origin.
    pub fn shared() -> Self {
        Self {
            prefix: format!("{NAMESPACE}_"),
        }
    }

    /// Key names scoped by a generated per-tab token.
    pub fn per_tab() -> Self {
        Self {
            prefix: format!("{NAMESPACE}_{}_", Uuid::new_v4().simple()),
        }
    }

    /// The prefix purge operations clear by.
    pub fn namespace(&self) -> &str {
        &self.prefix
    }

    pub fn results(&self) -> String {
        format!("{}{RESULTS_SLOT}", self.prefix)
    }

    pub fn form_input(&self) -> String {
        format!("{}{FORM_INPUT_SLOT}", self.prefix)
    }

    pub fn error(&self) -> String {
        format!("{}{ERROR_SLOT}", self.prefix)
    }

    pub fn session_id(&self) -> String {
        format!("{}{SESSION_ID_SLOT}", self.prefix)
    }

    pub fn form_draft(&self) -> String {
        format!("{}{FORM_DRAFT_SLOT}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = MemoryStore::new();
        store.put("diagnosis_results", "[]");
        assert_eq!(store.get("diagnosis_results").as_deref(), Some("[]"));
        store.remove("diagnosis_results");
        assert_eq!(store.get("diagnosis_results"), None);
    }

    #[test]
    fn test_clear_prefix_spares_foreign_keys() {
        let store = MemoryStore::new();
        store.put("diagnosis_results", "[]");
        store.put("diagnosis_error", "boom");
        store.put("other_app_state", "kept");

        store.clear_prefix("diagnosis_");

        assert_eq!(store.get("diagnosis_results"), None);
        assert_eq!(store.get("diagnosis_error"), None);
        assert_eq!(store.get("other_app_state").as_deref(), Some("kept"));
    }

    #[test]
    fn test_shared_key_space_uses_fixed_names() {
        let keys = KeySpace::shared();
        assert_eq!(keys.results(), "diagnosis_results");
        assert_eq!(keys.form_input(), "diagnosis_form_input");
        assert_eq!(keys.error(), "diagnosis_error");
        assert_eq!(keys.session_id(), "diagnosis_session_id");
        assert_eq!(keys.form_draft(), "diagnosis_form_draft");
    }

    #[test]
    fn test_per_tab_key_spaces_do_not_collide() {
        let a = KeySpace::per_tab();
        let b = KeySpace::per_tab();
        assert_ne!(a.results(), b.results());
        assert!(a.results().starts_with(a.namespace()));
        assert!(a.namespace().starts_with("diagnosis_"));
    }
}
