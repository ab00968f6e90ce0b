//! Namespaced property storage
//!
//! A node owns one [`PropertyStore`]. Node-level properties use bare names
//! (`"Name"`); capability properties are stored under
//! `"{capability_key}.{name}"`, so two capabilities using the same property
//! name never collide.

use crate::error::ArtifactError;
use indexmap::IndexMap;
use serde_json::Value;

/// Separator between capability key and property name
pub const SCOPE_SEPARATOR: char = '.';

/// Insertion-ordered key/value store shared by a node and its capabilities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyStore {
    values: IndexMap<String, Value>,
}

impl PropertyStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose the effective key of a capability-scoped property
    #[inline]
    #[must_use]
    pub fn scoped_key(capability_key: &str, name: &str) -> String {
        format!("{capability_key}{SCOPE_SEPARATOR}{name}")
    }

    /// Validate a capability key (non-empty, no separator)
    ///
    /// # Errors
    /// Returns `InvalidKey` if the key is empty or contains `.`
    pub fn validate_capability_key(key: &str) -> Result<(), ArtifactError> {
        if key.is_empty() || key.contains(SCOPE_SEPARATOR) {
            return Err(ArtifactError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Validate a property name (non-empty)
    ///
    /// # Errors
    /// Returns `InvalidKey` if the name is empty
    pub fn validate_name(name: &str) -> Result<(), ArtifactError> {
        if name.is_empty() {
            return Err(ArtifactError::InvalidKey(name.to_string()));
        }
        Ok(())
    }

    /// Get value by effective key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get string value by effective key
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Set value, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove value, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over one capability namespace, prefix stripped
    pub fn scoped<'a>(&'a self, capability_key: &str) -> impl Iterator<Item = (&'a str, &'a Value)> {
        let prefix = format!("{capability_key}{SCOPE_SEPARATOR}");
        self.values
            .iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix.as_str()).map(|name| (name, v)))
    }

    /// Remove every property of one capability namespace
    ///
    /// Returns the number of removed entries.
    pub fn remove_scope(&mut self, capability_key: &str) -> usize {
        let prefix = format!("{capability_key}{SCOPE_SEPARATOR}");
        let before = self.values.len();
        self.values.retain(|k, _| !k.starts_with(&prefix));
        before - self.values.len()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot as a JSON object (used as a template model)
    #[must_use]
    pub fn to_json_object(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl Extend<(String, Value)> for PropertyStore {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scoped_key_composition() {
        assert_eq!(PropertyStore::scoped_key("A", "Value"), "A.Value");
    }

    #[test]
    fn scoped_namespaces_are_isolated() {
        let mut store = PropertyStore::new();
        store.set(PropertyStore::scoped_key("A", "Value"), 1);
        store.set(PropertyStore::scoped_key("B", "Value"), 2);
        store.set("Value", 3);

        assert_eq!(store.get("A.Value"), Some(&json!(1)));
        assert_eq!(store.get("B.Value"), Some(&json!(2)));
        assert_eq!(store.get("Value"), Some(&json!(3)));

        let a: Vec<_> = store.scoped("A").collect();
        assert_eq!(a, vec![("Value", &json!(1))]);
    }

    #[test]
    fn remove_scope_only_touches_namespace() {
        let mut store = PropertyStore::new();
        store.set("A.x", 1);
        store.set("A.y", 2);
        store.set("AB.x", 3);
        store.set("Name", "n");

        assert_eq!(store.remove_scope("A"), 2);
        assert!(store.contains("AB.x"));
        assert!(store.contains("Name"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn set_returns_previous() {
        let mut store = PropertyStore::new();
        assert!(store.set("Name", "a").is_none());
        assert_eq!(store.set("Name", "b"), Some(json!("a")));
        assert_eq!(store.get_str("Name"), Some("b"));
    }

    #[test]
    fn capability_key_validation() {
        assert!(PropertyStore::validate_capability_key("FileProperties").is_ok());
        assert!(PropertyStore::validate_capability_key("").is_err());
        assert!(PropertyStore::validate_capability_key("a.b").is_err());
        assert!(PropertyStore::validate_name("").is_err());
    }

    #[test]
    fn remove_preserves_order() {
        let mut store = PropertyStore::new();
        store.set("a", 1);
        store.set("b", 2);
        store.set("c", 3);
        store.remove("b");
        let keys: Vec<_> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
