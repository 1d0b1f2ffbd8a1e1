use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::blob::{validate_key, BlobStore};
use crate::error::AppError;
use crate::extractors::Path;

/// GET /api/images/*key
/// Serve a stored photo or signature.
pub async fn get_image(
    State(blobs): State<Arc<dyn BlobStore>>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    validate_key(&key)?;

    let blob = blobs
        .get(&key)
        .await?
        .ok_or_else(|| AppError::ImageNotFound { key: key.clone() })?;

    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000".to_string(),
            ),
        ],
        blob.bytes,
    )
        .into_response())
}
