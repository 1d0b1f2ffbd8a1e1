use axum::extract::State;
use serde::Serialize;
use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::extractors::Json;

use super::DataResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
/// Liveness.
pub async fn health() -> Json<DataResponse<HealthResponse>> {
    Json(DataResponse {
        data: HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    })
}

/// GET /health/ready
/// Readiness, requires a working database connection.
pub async fn ready(
    State(pool): State<PgPool>,
) -> Result<Json<DataResponse<HealthResponse>>, AppError> {
    db::ping(&pool).await.map_err(|e| {
        tracing::warn!("Readiness check failed: {}", e);
        AppError::Unavailable
    })?;

    Ok(Json(DataResponse {
        data: HealthResponse {
            status: "ready",
            version: env!("CARGO_PKG_VERSION"),
        },
    }))
}
