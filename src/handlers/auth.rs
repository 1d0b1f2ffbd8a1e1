use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::auth::{generate_token, verify_password, AuthContext};
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::extractors::Json;
use crate::metrics;
use crate::models::user::{LoginRequest, LoginResponse, UserResponse};

use super::DataResponse;

/// POST /api/auth/login
/// Exchange credentials for a session token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Arc<Config>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<DataResponse<LoginResponse>>, AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.trim().is_empty() {
        return Err(AppError::validation("Username and password are required"));
    }

    let Some(user) = db::get_active_user_by_name(&pool, username).await? else {
        metrics::record_login(false);
        tracing::info!("Login failed for unknown user {}", username);
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash).await? {
        metrics::record_login(false);
        tracing::info!("Login failed for {}: bad password", username);
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(config.session_ttl_hours);
    db::create_session(&pool, &token, user.id, expires_at).await?;

    metrics::record_login(true);
    tracing::info!("User {} logged in", user.user_name);

    Ok(Json(DataResponse {
        data: LoginResponse {
            token,
            expires_at,
            user: user.into(),
        },
    }))
}

/// POST /api/auth/logout
/// Revoke the caller's session.
pub async fn logout(
    State(pool): State<PgPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    db::delete_session(&pool, &auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
/// The authenticated user.
pub async fn me(
    State(pool): State<PgPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<DataResponse<UserResponse>>, AppError> {
    let user = db::get_active_user(&pool, auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(DataResponse { data: user.into() }))
}
