use axum::extract::State;
use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::extractors::{Json, Query};
use crate::models::stats::{EventIdQuery, StatsResponse};

use super::DataResponse;

/// GET /api/stats?event_id=
/// Check-in progress for an event. Unknown events report zero counts.
pub async fn get_stats(
    State(pool): State<PgPool>,
    Query(query): Query<EventIdQuery>,
) -> Result<Json<DataResponse<StatsResponse>>, AppError> {
    let event_id = query
        .event_id
        .ok_or_else(|| AppError::validation("Event ID is required"))?;

    let stats = db::event_stats(&pool, event_id).await?;

    Ok(Json(DataResponse { data: stats.into() }))
}
