pub mod auth;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod roster;
pub mod state;
pub mod tasks;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue},
    middleware,
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::*;
use crate::state::AppState;

const APP_VERSION_HEADER: HeaderName = HeaderName::from_static("x-app-version");

/// API responses must never be served from a browser or proxy cache.
async fn no_store(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(
        APP_VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", put(update_user).delete(deactivate_user))
        .route_layer(middleware::from_fn(auth::require_admin));

    let protected = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(archive_event),
        )
        .route(
            "/api/events/:id/manage",
            put(update_event).delete(archive_event),
        )
        .route("/api/participants", post(create_participant))
        .route("/api/participants/search", get(search_participants))
        .route("/api/participants/export", get(export_participants))
        .route("/api/participants/:id", get(get_participant))
        .route("/api/export-participants", get(export_participants))
        .route("/api/checkin", post(check_in))
        .route("/api/stats", get(get_stats))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let api = Router::new()
        .route("/api/auth/login", post(login))
        .merge(protected)
        .layer(middleware::map_response(no_store));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/metrics", get(metrics::render_metrics))
        .route("/api/images/*key", get(get_image))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        );

    if let Some(dir) = &state.config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.with_state(state)
}
