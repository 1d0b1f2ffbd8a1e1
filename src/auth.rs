use axum::{
    extract::{Extension, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::models::user::UserRole;

/// Authenticated caller, inserted as a request extension by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub user_name: String,
    pub role: UserRole,
    pub token: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Middleware: resolve the bearer token to a live session or reject with 401.
pub async fn require_auth(
    State(pool): State<PgPool>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let session = db::find_session_user(&pool, &token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    req.extensions_mut().insert(AuthContext {
        user_id: session.user_id,
        user_name: session.user_name,
        role: session.role,
        token,
    });

    Ok(next.run(req).await)
}

/// Middleware: admin role required. Must run inside [`require_auth`].
pub async fn require_admin(
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !auth.is_admin() {
        tracing::warn!("User {} denied admin route {}", auth.user_name, req.uri().path());
        return Err(AppError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Malformed hashes verify as false.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = tokio::task::spawn_blocking(|| bcrypt::hash("s3cret", 4).unwrap())
            .await
            .unwrap();
        assert!(verify_password("s3cret", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("s3cret", "not-a-hash").await.unwrap());
    }

    fn context(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: 7,
            user_name: "desk-1".to_string(),
            role,
            token: "t".to_string(),
        }
    }

    fn admin_only_app(caller: AuthContext) -> axum_test::TestServer {
        let app = axum::Router::new()
            .route("/api/users", axum::routing::get(|| async { "users" }))
            .route_layer(axum::middleware::from_fn(require_admin))
            .layer(Extension(caller));
        axum_test::TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn staff_is_forbidden_from_admin_routes() {
        let server = admin_only_app(context(UserRole::Staff));

        let response = server.get("/api/users").await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn admin_passes_admin_routes() {
        let server = admin_only_app(context(UserRole::Admin));

        let response = server.get("/api/users").await;
        response.assert_status_ok();
        response.assert_text("users");
    }
}
