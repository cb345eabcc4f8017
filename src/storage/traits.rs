use async_trait::async_trait;

use crate::error::Result;

/// Opaque object persistence: named byte blobs grouped in containers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `container/name`, replacing any previous object; returns its URL
    async fn put(&self, container: &str, name: &str, bytes: Vec<u8>) -> Result<String>;

    async fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>>;

    /// URL an object has (or would have) in this store
    fn url(&self, container: &str, name: &str) -> Result<String>;
}

pub(crate) fn check_object_name(kind: &str, name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(crate::SynthBundleError::storage(format!(
            "Invalid {kind} name '{name}'"
        )));
    }
    Ok(())
}
