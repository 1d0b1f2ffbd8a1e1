use sqlx::PgPool;

use crate::error::AppError;
use crate::models::user::{UserRole, UserRow};

/// Look up an active user for login.
pub async fn get_active_user_by_name(
    pool: &PgPool,
    user_name: &str,
) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, user_name, password_hash, email, role, is_active, created_at, updated_at
        FROM users
        WHERE user_name = $1 AND is_active = true
        "#,
    )
    .bind(user_name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn get_active_user(pool: &PgPool, id: i64) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, user_name, password_hash, email, role, is_active, created_at, updated_at
        FROM users
        WHERE id = $1 AND is_active = true
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_active_users(pool: &PgPool) -> Result<Vec<UserRow>, AppError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, user_name, password_hash, email, role, is_active, created_at, updated_at
        FROM users
        WHERE is_active = true
        ORDER BY user_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_users(pool: &PgPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

pub async fn create_user(
    pool: &PgPool,
    user_name: &str,
    password_hash: &str,
    email: Option<&str>,
    role: UserRole,
) -> Result<UserRow, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (user_name, password_hash, email, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_name, password_hash, email, role, is_active, created_at, updated_at
        "#,
    )
    .bind(user_name)
    .bind(password_hash)
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fields to change on an existing user. `None` leaves a column untouched.
pub struct UserChanges<'a> {
    pub user_name: Option<&'a str>,
    /// `Some(None)` clears the email.
    pub email: Option<Option<&'a str>>,
    pub role: Option<UserRole>,
    pub password_hash: Option<&'a str>,
}

pub async fn update_user(
    pool: &PgPool,
    id: i64,
    changes: &UserChanges<'_>,
) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users SET
            user_name = COALESCE($2, user_name),
            email = CASE WHEN $3::boolean THEN $4 ELSE email END,
            role = COALESCE($5, role),
            password_hash = COALESCE($6, password_hash),
            updated_at = now()
        WHERE id = $1 AND is_active = true
        RETURNING id, user_name, password_hash, email, role, is_active, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(changes.user_name)
    // email: outer Some means "set this", None means "don't touch"
    .bind(changes.email.is_some())
    .bind(changes.email.flatten())
    .bind(changes.role)
    .bind(changes.password_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deactivate a user. Returns false if no active user has this id.
pub async fn deactivate_user(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE users SET is_active = false, updated_at = now() WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
