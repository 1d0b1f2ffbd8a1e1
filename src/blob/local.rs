use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{content_type_for_key, validate_key, Blob, BlobError, BlobStore};

/// Filesystem-backed store rooted at a directory. Content type is derived
/// from the key's extension on read.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file first so readers never see a partial object
        let tmp = path.with_extension("partial");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            "Stored blob {} ({} bytes, {})",
            key,
            bytes.len(),
            content_type
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Blob {
                bytes,
                content_type: content_type_for_key(key).to_string(),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store
            .put("runner-signatures/event_1_bib_7_x.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert!(dir
            .path()
            .join("runner-signatures")
            .join("event_1_bib_7_x.png")
            .exists());

        let blob = store
            .get("runner-signatures/event_1_bib_7_x.png")
            .await
            .unwrap()
            .expect("blob present");
        assert_eq!(blob.bytes, vec![1, 2, 3]);
        assert_eq!(blob.content_type, "image/png");

        assert!(store.delete("runner-signatures/event_1_bib_7_x.png").await.unwrap());
        assert!(!store.delete("runner-signatures/event_1_bib_7_x.png").await.unwrap());
        assert!(store
            .get("runner-signatures/event_1_bib_7_x.png")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn traversal_keys_never_reach_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("blobs"));

        let err = store.get("../outside.jpg").await.unwrap_err();
        assert!(matches!(err, BlobError::InvalidKey(_)));
    }
}
