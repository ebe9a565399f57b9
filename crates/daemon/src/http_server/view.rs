use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use common::ViewResponse;

use crate::ServiceState;

/// Answer requests inside the view namespace from the cache; pass
/// everything else on.
pub async fn intercept(State(state): State<ServiceState>, request: Request, next: Next) -> Response {
    match state.cache().intercept(request.uri().path()) {
        Some(view) => view_response(view),
        None => next.run(request).await,
    }
}

fn view_response(view: ViewResponse) -> Response {
    match view {
        ViewResponse::Found {
            content_type,
            bytes,
            ..
        } => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            Body::from(bytes),
        )
            .into_response(),
        ViewResponse::NotFound { path } => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("File not found in cache: {}", path),
        )
            .into_response(),
    }
}
