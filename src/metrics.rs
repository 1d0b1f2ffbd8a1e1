use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub const LOGINS_TOTAL: &str = "checkin_logins_total";
pub const CHECKINS_TOTAL: &str = "checkin_checkins_total";
pub const PARTICIPANTS_CREATED_TOTAL: &str = "checkin_participants_created_total";
pub const ROSTER_ROW_ERRORS_TOTAL: &str = "checkin_roster_row_errors_total";
pub const BLOB_UPLOADS_TOTAL: &str = "checkin_blob_uploads_total";

/// Install the global Prometheus recorder. Call once at startup.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(LOGINS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_checkin(source: &'static str) {
    metrics::counter!(CHECKINS_TOTAL, "source" => source).increment(1);
}

pub fn record_participants_created(source: &'static str, count: usize) {
    metrics::counter!(PARTICIPANTS_CREATED_TOTAL, "source" => source).increment(count as u64);
}

pub fn record_roster_errors(count: usize) {
    metrics::counter!(ROSTER_ROW_ERRORS_TOTAL).increment(count as u64);
}

pub fn record_blob_upload(kind: &'static str) {
    metrics::counter!(BLOB_UPLOADS_TOTAL, "kind" => kind).increment(1);
}

/// GET /metrics
/// Prometheus text exposition, 404 when metrics are disabled.
pub async fn render_metrics(State(handle): State<Option<PrometheusHandle>>) -> Response {
    match handle {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
