use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use sqlx::PgPool;

use crate::auth::{hash_password, AuthContext};
use crate::db;
use crate::db::users::UserChanges;
use crate::error::AppError;
use crate::extractors::{Json, Path};
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserResponse, UserRole};

use super::DataResponse;

const MIN_PASSWORD_LEN: usize = 8;

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// GET /api/users
/// List active users (admin).
pub async fn list_users(
    State(pool): State<PgPool>,
) -> Result<Json<DataResponse<Vec<UserResponse>>>, AppError> {
    let users = db::list_active_users(&pool).await?;

    Ok(Json(DataResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/users
/// Create a staff or admin account (admin).
pub async fn create_user(
    State(pool): State<PgPool>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<DataResponse<UserResponse>>), AppError> {
    let user_name = req.user_name.trim();
    if user_name.is_empty() {
        return Err(AppError::validation("User name is required"));
    }
    validate_password(&req.password)?;

    let hash = hash_password(&req.password).await?;
    let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let role = req.role.unwrap_or(UserRole::Staff);

    let user = db::create_user(&pool, user_name, &hash, email, role).await?;
    tracing::info!("Created {:?} user {}", user.role, user.user_name);

    Ok((StatusCode::CREATED, Json(DataResponse { data: user.into() })))
}

/// PUT /api/users/:id
/// Update name, email, role or password (admin).
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<DataResponse<UserResponse>>, AppError> {
    let user_name = req.user_name.as_deref().map(str::trim);
    if user_name == Some("") {
        return Err(AppError::validation("User name cannot be empty"));
    }

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password).await?)
        }
        None => None,
    };

    let email = req
        .email
        .as_deref()
        .map(|e| Some(e.trim()).filter(|e| !e.is_empty()));

    let changes = UserChanges {
        user_name,
        email,
        role: req.role,
        password_hash: password_hash.as_deref(),
    };

    let user = db::update_user(&pool, id, &changes)
        .await?
        .ok_or(AppError::UserNotFound { id })?;

    // A new password invalidates existing sessions
    if changes.password_hash.is_some() {
        db::delete_user_sessions(&pool, id).await?;
    }

    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/users/:id
/// Deactivate a user and revoke their sessions (admin).
pub async fn deactivate_user(
    State(pool): State<PgPool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if id == auth.user_id {
        return Err(AppError::validation("You cannot deactivate your own account"));
    }

    if !db::deactivate_user(&pool, id).await? {
        return Err(AppError::UserNotFound { id });
    }

    let revoked = db::delete_user_sessions(&pool, id).await?;
    tracing::info!(
        "User {} deactivated by {} ({} sessions revoked)",
        id,
        auth.user_name,
        revoked
    );

    Ok(StatusCode::NO_CONTENT)
}
