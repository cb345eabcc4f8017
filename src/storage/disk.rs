use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

use crate::error::{Result, SynthBundleError};
use crate::storage::ObjectStore;
use crate::storage::traits::check_object_name;

/// Filesystem object store writing `<root>/<container>/<name>`.
///
/// URLs are `file://` paths unless a public base URL is configured, in which
/// case they are `<base_url>/<container>/<name>`.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
    base_url: Option<Url>,
}

impl FileObjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, container: &str, name: &str) -> Result<PathBuf> {
        check_object_name("container", container)?;
        check_object_name("object", name)?;
        Ok(self.root.join(container).join(name))
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn put(&self, container: &str, name: &str, bytes: Vec<u8>) -> Result<String> {
        let path = self.object_path(container, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SynthBundleError::storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&path, bytes).await.map_err(|e| {
            SynthBundleError::storage(format!("Failed to write {}: {e}", path.display()))
        })?;
        tracing::debug!("Wrote object {}", path.display());
        self.url(container, name)
    }

    async fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(container, name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SynthBundleError::storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn url(&self, container: &str, name: &str) -> Result<String> {
        if let Some(base) = &self.base_url {
            return Ok(base.join(&format!("{container}/{name}"))?.to_string());
        }
        let path = std::path::absolute(self.object_path(container, name)?)?;
        Url::from_file_path(&path)
            .map(|u| u.to_string())
            .map_err(|()| {
                SynthBundleError::storage(format!("Cannot build file URL for {}", path.display()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_under_container_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path());
        let url = store
            .put("fhir", "bundle.json", b"{}".to_vec())
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/fhir/bundle.json"));
        let on_disk = std::fs::read(dir.path().join("fhir").join("bundle.json")).unwrap();
        assert_eq!(on_disk, b"{}");
        assert_eq!(
            store.get("fhir", "bundle.json").await.unwrap(),
            Some(b"{}".to_vec())
        );
        assert_eq!(store.get("fhir", "nope.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn base_url_controls_returned_urls() {
        let dir = TempDir::new().unwrap();
        let store = FileObjectStore::new(dir.path())
            .with_base_url("https://blobs.example.com/data")
            .unwrap();
        let url = store.put("fhir", "b.json", vec![]).await.unwrap();
        assert_eq!(url, "https://blobs.example.com/data/fhir/b.json");
    }
}
