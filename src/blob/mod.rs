//! Blob storage for check-in photos and signatures.
//!
//! Keys are relative, `/`-separated paths such as
//! `runner-photos/event_4_bib_A12_<uuid>.jpg`. Every backend validates keys
//! with [`validate_key`] before touching storage.

pub mod data_uri;
pub mod local;
pub mod memory;

use async_trait::async_trait;

pub use data_uri::DataUri;
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

/// A stored object and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError>;

    async fn get(&self, key: &str) -> Result<Option<Blob>, BlobError>;

    /// Returns true if an object was removed.
    async fn delete(&self, key: &str) -> Result<bool, BlobError>;
}

/// Reject absolute paths, traversal segments and anything outside `[A-Za-z0-9._-]`.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let invalid = || BlobError::InvalidKey(key.to_string());

    if key.is_empty() || key.starts_with('/') || key.len() > 512 {
        return Err(invalid());
    }

    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(invalid());
        }
        let allowed = segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !allowed {
            return Err(invalid());
        }
    }

    Ok(())
}

/// Content type implied by a key's extension. Unknown extensions fall back to JPEG.
pub fn content_type_for_key(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

/// Make a bib number safe to embed in a blob key.
pub fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
