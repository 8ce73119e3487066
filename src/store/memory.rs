//! In-memory document store

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::errors::StoreResult;
use super::{find_or_insert, list_collection, Collection, DocumentStore};

/// Process-local store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, |docs| docs.len())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_or_create(
        &self,
        collection: &str,
        id: &str,
        default: Value,
    ) -> StoreResult<(Value, bool)> {
        let mut collections = self.collections.lock().await;
        Ok(find_or_insert(&mut collections, collection, id, default))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> StoreResult<()> {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<(String, Value)>> {
        let collections = self.collections.lock().await;
        Ok(list_collection(&collections, collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_find_or_create_returns_existing() {
        let store = MemoryStore::new();

        let (doc, created) = store
            .find_or_create("_schema_data", "points", json!({"version": 1}))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(doc["version"], 1);

        let (doc, created) = store
            .find_or_create("_schema_data", "points", json!({"version": 2}))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(doc["version"], 1);
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_creates_once() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .find_or_create("_schema_data", "points", json!({"version": i}))
                    .await
                    .unwrap()
                    .1
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.count("_schema_data").await, 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = MemoryStore::new();
        store.put("c", "b", json!({})).await.unwrap();
        store.put("c", "a", json!({})).await.unwrap();

        let ids: Vec<_> = store
            .list("c")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(store.list("missing").await.unwrap().is_empty());
    }
}
