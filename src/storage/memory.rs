use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::storage::ObjectStore;
use crate::storage::traits::check_object_name;

/// In-process object store; clones share the same objects.
#[derive(Debug)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Names stored in `container`, sorted
    pub async fn names(&self, container: &str) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut names: Vec<String> = objects
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, n)| n.clone())
            .collect();
        names.sort();
        names
    }

    pub async fn clear(&self) {
        self.objects.write().await.clear();
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, container: &str, name: &str, bytes: Vec<u8>) -> Result<String> {
        check_object_name("container", container)?;
        check_object_name("object", name)?;
        let mut objects = self.objects.write().await;
        objects.insert((container.to_string(), name.to_string()), bytes);
        self.url(container, name)
    }

    async fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let objects = self.objects.read().await;
        Ok(objects
            .get(&(container.to_string(), name.to_string()))
            .cloned())
    }

    fn url(&self, container: &str, name: &str) -> Result<String> {
        Ok(format!("memory://{container}/{name}"))
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryObjectStore {
    fn clone(&self) -> Self {
        Self {
            objects: Arc::clone(&self.objects),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_and_overwrite() {
        let store = MemoryObjectStore::new();
        let url = store.put("bundles", "a.json", b"one".to_vec()).await.unwrap();
        assert_eq!(url, "memory://bundles/a.json");
        store.put("bundles", "a.json", b"two".to_vec()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("bundles", "a.json").await.unwrap().as_deref(),
            Some(&b"two"[..])
        );
        assert!(store.get("bundles", "b.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clones_share_objects() {
        let store = MemoryObjectStore::new();
        let other = store.clone();
        other.put("c", "x.json", vec![]).await.unwrap();
        assert_eq!(store.names("c").await, vec!["x.json".to_string()]);
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let store = MemoryObjectStore::new();
        assert!(store.put("c", "../x.json", vec![]).await.is_err());
        assert!(store.put("", "x.json", vec![]).await.is_err());
    }
}
