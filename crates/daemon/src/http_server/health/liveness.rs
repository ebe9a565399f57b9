use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Always answers `ok`. Used by external healthchecks to see whether the
/// process is alive at all.
#[tracing::instrument]
pub async fn handler() -> Response {
    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg)).into_response()
}
