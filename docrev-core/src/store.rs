//! Flat, insertion-ordered registry of document versions.
//!
//! The store owns every [`Version`] of one session plus a single active
//! pointer. It is not a history graph: versions are independent snapshots.
//!
//! Keys of refined versions come from a creation counter that only ever
//! grows, so a key freed by `delete` is never handed out again within the
//! same store.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{normalize_label, Version, ORIGINAL_KEY, ORIGINAL_LABEL};

#[derive(Debug, Clone, Default)]
pub struct VersionStore {
    versions: Vec<Version>,
    active: Option<usize>,
    /// Number used for the next `"Version N"` key.
    next_index: usize,
}

impl VersionStore {
    /// Creates an empty store. Nothing is active until [`reset`](Self::reset).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `"Original"`.
    pub fn with_original(content: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.reset(content);
        store
    }

    /// Clears every version and seeds a fresh, active `"Original"`.
    pub fn reset(&mut self, content: impl Into<String>) {
        self.versions.clear();
        self.versions.push(Version {
            key: ORIGINAL_KEY.to_owned(),
            content: content.into(),
            label: ORIGINAL_LABEL.to_owned(),
        });
        self.active = Some(0);
        self.next_index = 1;
        debug!("version store reset");
    }

    /// Adds a new version and makes it active. Returns its key.
    ///
    /// A blank `label` becomes `"Refinement"`.
    pub fn create(&mut self, content: impl Into<String>, label: &str) -> String {
        let key = format!("Version {}", self.next_index);
        self.next_index += 1;
        self.versions.push(Version {
            key: key.clone(),
            content: content.into(),
            label: normalize_label(label),
        });
        self.active = Some(self.versions.len() - 1);
        info!(key = %key, "version created");
        key
    }

    /// Replaces the label of `key`. Content is untouched.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` for `"Original"` or an unknown key.
    pub fn rename(&mut self, key: &str, label: &str) -> Result<()> {
        let idx = self.mutable_index(key)?;
        self.versions[idx].label = normalize_label(label);
        info!(key, "version renamed");
        Ok(())
    }

    /// Removes `key` from the store.
    ///
    /// If `key` was active, the first remaining refined version (insertion
    /// order) becomes active; `"Original"` is chosen only when no refined
    /// version is left. Returns the new active key.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` for `"Original"` or an unknown key.
    pub fn delete(&mut self, key: &str) -> Result<Option<String>> {
        let idx = self.mutable_index(key)?;
        let was_active = self.active == Some(idx);
        self.versions.remove(idx);

        self.active = match self.active {
            _ if was_active => self
                .versions
                .iter()
                .position(|v| !v.is_original())
                .or_else(|| self.index_of(ORIGINAL_KEY)),
            Some(a) if a > idx => Some(a - 1),
            other => other,
        };
        info!(key, active = ?self.active_key(), "version deleted");
        Ok(self.active_key().map(str::to_owned))
    }

    /// Makes `key` active and returns its content.
    pub fn select(&mut self, key: &str) -> Result<&str> {
        let idx = self.require_index(key)?;
        self.active = Some(idx);
        Ok(&self.versions[idx].content)
    }

    /// Overwrites the content of `key` in place.
    pub fn edit(&mut self, key: &str, content: impl Into<String>) -> Result<()> {
        let idx = self.require_index(key)?;
        self.versions[idx].content = content.into();
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Version> {
        self.index_of(key)
            .map(|idx| &self.versions[idx])
            .ok_or_else(|| Error::NotFound { key: key.to_owned() })
    }

    /// The active version, or `None` while the store is empty.
    pub fn active(&self) -> Option<&Version> {
        self.active.map(|idx| &self.versions[idx])
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active().map(|v| v.key.as_str())
    }

    pub fn original(&self) -> Option<&Version> {
        self.get(ORIGINAL_KEY).ok()
    }

    /// Versions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    /// Position of `key` in insertion order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index_of(key)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.versions.iter().position(|v| v.key == key)
    }

    fn require_index(&self, key: &str) -> Result<usize> {
        self.index_of(key).ok_or_else(|| Error::NotFound { key: key.to_owned() })
    }

    /// Index of a key that rename/delete may touch.
    fn mutable_index(&self, key: &str) -> Result<usize> {
        match self.index_of(key) {
            Some(idx) if key != ORIGINAL_KEY => Ok(idx),
            _ => Err(Error::InvalidTarget { key: key.to_owned() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_LABEL;

    fn keys(store: &VersionStore) -> Vec<&str> {
        store.iter().map(|v| v.key.as_str()).collect()
    }

    #[test]
    fn empty_store_has_no_active_version() {
        let store = VersionStore::new();
        assert!(store.is_empty());
        assert!(store.active().is_none());
        assert!(store.original().is_none());
    }

    #[test]
    fn create_activates_and_keeps_original() {
        let mut store = VersionStore::with_original("base");
        let key = store.create("refined", "  Examples ");
        assert_eq!(key, "Version 1");
        assert_eq!(store.active_key(), Some("Version 1"));
        assert_eq!(store.get("Version 1").unwrap().label, "Examples");

        let original = store.original().unwrap();
        assert_eq!(original.content, "base");
        assert_eq!(original.label, ORIGINAL_LABEL);
    }

    #[test]
    fn blank_label_uses_default() {
        let mut store = VersionStore::with_original("base");
        let key = store.create("x", "   ");
        assert_eq!(store.get(&key).unwrap().label, DEFAULT_LABEL);
        store.rename(&key, "").unwrap();
        assert_eq!(store.get(&key).unwrap().label, DEFAULT_LABEL);
    }

    #[test]
    fn original_is_protected() {
        let mut store = VersionStore::with_original("base");
        store.create("x", "one");
        let before = store.clone();

        assert_eq!(
            store.delete(ORIGINAL_KEY),
            Err(Error::InvalidTarget { key: ORIGINAL_KEY.to_owned() })
        );
        assert_eq!(
            store.rename(ORIGINAL_KEY, "x"),
            Err(Error::InvalidTarget { key: ORIGINAL_KEY.to_owned() })
        );
        assert_eq!(keys(&store), keys(&before));
        assert_eq!(store.original(), before.original());
        assert_eq!(store.active_key(), before.active_key());
    }

    #[test]
    fn unknown_keys() {
        let mut store = VersionStore::with_original("base");
        let missing = Error::NotFound { key: "Version 9".to_owned() };
        assert_eq!(store.select("Version 9").unwrap_err(), missing);
        assert_eq!(store.edit("Version 9", "x").unwrap_err(), missing);
        assert_eq!(store.get("Version 9").unwrap_err(), missing);

        let invalid = Error::InvalidTarget { key: "Version 9".to_owned() };
        assert_eq!(store.rename("Version 9", "x").unwrap_err(), invalid);
        assert_eq!(store.delete("Version 9").unwrap_err(), invalid);
    }

    #[test]
    fn deleting_active_prefers_remaining_refinement() {
        let mut store = VersionStore::with_original("base");
        store.create("one", "a");
        store.create("two", "b");
        assert_eq!(store.active_key(), Some("Version 2"));

        let next = store.delete("Version 2").unwrap();
        assert_eq!(next.as_deref(), Some("Version 1"));
        assert_eq!(store.get(ORIGINAL_KEY).unwrap().content, "base");

        let next = store.delete("Version 1").unwrap();
        assert_eq!(next.as_deref(), Some(ORIGINAL_KEY));
        assert_eq!(store.select(ORIGINAL_KEY).unwrap(), "base");
    }

    #[test]
    fn deleting_inactive_keeps_selection() {
        let mut store = VersionStore::with_original("base");
        store.create("one", "a");
        store.create("two", "b");
        store.create("three", "c");
        store.select("Version 3").unwrap();

        store.delete("Version 1").unwrap();
        assert_eq!(store.active_key(), Some("Version 3"));
        assert_eq!(store.active().unwrap().content, "three");
    }

    #[test]
    fn keys_are_never_reused_after_delete() {
        let mut store = VersionStore::with_original("base");
        store.create("one", "a");
        store.create("two", "b");
        store.delete("Version 2").unwrap();
        let key = store.create("three", "c");
        assert_eq!(key, "Version 3");
        assert_eq!(keys(&store), vec![ORIGINAL_KEY, "Version 1", "Version 3"]);
    }

    #[test]
    fn select_and_edit() {
        let mut store = VersionStore::with_original("base");
        store.create("one", "a");
        assert_eq!(store.select(ORIGINAL_KEY).unwrap(), "base");
        assert_eq!(store.active_key(), Some(ORIGINAL_KEY));

        store.edit("Version 1", "one, edited").unwrap();
        let v1 = store.get("Version 1").unwrap();
        assert_eq!(v1.content, "one, edited");
        assert_eq!(v1.label, "a");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reset_starts_a_fresh_registry() {
        let mut store = VersionStore::with_original("base");
        store.create("one", "a");
        store.reset("regenerated");
        assert_eq!(keys(&store), vec![ORIGINAL_KEY]);
        assert_eq!(store.active().unwrap().content, "regenerated");
        assert_eq!(store.create("x", ""), "Version 1");
    }
}
