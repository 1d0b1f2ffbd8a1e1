use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{validate_key, Blob, BlobError, BlobStore};

/// In-process store, used by tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Blob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        validate_key(key)?;
        self.objects.lock().await.insert(
            key.to_string(),
            Blob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobError> {
        validate_key(key)?;
        Ok(self.objects.lock().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, BlobError> {
        validate_key(key)?;
        Ok(self.objects.lock().await.remove(key).is_some())
    }
}
