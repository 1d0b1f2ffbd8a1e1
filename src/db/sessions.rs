use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::user::SessionUserRow;

pub async fn create_session(
    pool: &PgPool,
    token: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Resolve a bearer token to its user. Expired sessions and inactive users resolve to `None`.
pub async fn find_session_user(
    pool: &PgPool,
    token: &str,
) -> Result<Option<SessionUserRow>, AppError> {
    let row = sqlx::query_as::<_, SessionUserRow>(
        r#"
        SELECT s.user_id, u.user_name, u.role, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1
          AND s.expires_at > now()
          AND u.is_active = true
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_user_sessions(pool: &PgPool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_expired_sessions(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
