//! Multi-key operations
//!
//! Each applies the single-key operation independently, in input order.

use serde::Serialize;
use serde_json::Value;

use crate::cache::store::CacheStore;

/// Per-key outcome of a mutating bulk operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkResult {
    pub items: Vec<(String, bool)>,
}

impl BulkResult {
    /// True when every item succeeded (vacuously true when empty)
    pub fn success(&self) -> bool {
        self.items.iter().all(|(_, ok)| *ok)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CacheStore {
    pub fn get_multiple<I, S>(
        &mut self,
        keys: I,
        group: &str,
        force: bool,
    ) -> Vec<(String, Option<Value>)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                (key.to_string(), self.get_with(key, group, force))
            })
            .collect()
    }

    pub fn set_multiple<I, K, V>(&mut self, items: I, group: &str, expire_secs: i64) -> BulkResult
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let items = items
            .into_iter()
            .map(|(key, data)| {
                let key = key.into();
                let ok = self.set(&key, data, group, expire_secs);
                (key, ok)
            })
            .collect();
        BulkResult { items }
    }

    pub fn add_multiple<I, K, V>(&mut self, items: I, group: &str, expire_secs: i64) -> BulkResult
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let items = items
            .into_iter()
            .map(|(key, data)| {
                let key = key.into();
                let ok = self.add(&key, data, group, expire_secs);
                (key, ok)
            })
            .collect();
        BulkResult { items }
    }

    pub fn delete_multiple<I, S>(&mut self, keys: I, group: &str) -> BulkResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items = keys
            .into_iter()
            .map(|key| {
                let key = key.as_ref();
                (key.to_string(), self.delete(key, group))
            })
            .collect();
        BulkResult { items }
    }
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfig, CacheStore};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_get_multiple_preserves_order() {
        let temp = tempdir().unwrap();
        let mut store = CacheStore::open(CacheConfig::with_dir(temp.path())).unwrap();
        store.set("k1", 1, "g", 0);
        store.set("k3", 3, "g", 0);

        let results = store.get_multiple(["k3", "k2", "k1"], "g", false);
        assert_eq!(
            results,
            vec![
                ("k3".to_string(), Some(json!(3))),
                ("k2".to_string(), None),
                ("k1".to_string(), Some(json!(1))),
            ]
        );
        assert_eq!(store.hits(), 2);
        assert_eq!(store.misses(), 1);
    }

    #[test]
    fn test_set_multiple() {
        let temp = tempdir().unwrap();
        let mut store = CacheStore::open(CacheConfig::with_dir(temp.path())).unwrap();

        let result = store.set_multiple(vec![("a", json!(1)), ("b", json!("two"))], "g", 0);
        assert!(result.success());
        assert_eq!(result.len(), 2);

        store.flush_runtime();
        assert_eq!(store.get("b", "g"), Some(json!("two")));
    }

    #[test]
    fn test_add_multiple_reports_each_item() {
        let temp = tempdir().unwrap();
        let mut store = CacheStore::open(CacheConfig::with_dir(temp.path())).unwrap();
        store.set("b", "old", "g", 0);

        let result = store.add_multiple([("a", "new"), ("b", "new"), ("c", "new")], "g", 0);
        assert!(!result.success());
        assert_eq!(
            result.items,
            vec![
                ("a".to_string(), true),
                ("b".to_string(), false),
                ("c".to_string(), true),
            ]
        );
        assert_eq!(store.get("b", "g"), Some(json!("old")));
    }

    #[test]
    fn test_delete_multiple() {
        let temp = tempdir().unwrap();
        let mut store = CacheStore::open(CacheConfig::with_dir(temp.path())).unwrap();
        store.set("a", 1, "g", 0);

        let result = store.delete_multiple(["a", "missing"], "g");
        assert!(!result.success());
        assert_eq!(result.items[0], ("a".to_string(), true));
        assert_eq!(result.items[1], ("missing".to_string(), false));
    }

    #[test]
    fn test_empty_bulk_is_success() {
        let temp = tempdir().unwrap();
        let mut store = CacheStore::open(CacheConfig::with_dir(temp.path())).unwrap();
        let result = store.delete_multiple(Vec::<String>::new(), "g");
        assert!(result.success());
        assert!(result.is_empty());
    }
}
