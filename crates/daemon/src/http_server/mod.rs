use std::convert::Infallible;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Router};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::ServiceState;

pub mod control;
pub mod health;
pub mod view;

pub const CONTROL_PATH: &str = "/_control";
pub const STATUS_PREFIX: &str = "/_status";

/// Build the daemon router.
///
/// The view interceptor wraps every route and the fallback, so any request
/// whose path contains the view marker is answered from the cache before
/// routing has a say.
pub fn router(state: ServiceState, max_payload_bytes: usize) -> Router {
    let control = post(control::handler)
        .layer::<_, Infallible>(DefaultBodyLimit::disable())
        .layer::<_, Infallible>(RequestBodyLimitLayer::new(max_payload_bytes));

    Router::new()
        .route(CONTROL_PATH, control)
        .nest(STATUS_PREFIX, health::router())
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            view::intercept,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}
