use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use common::ControlCommand;

use crate::ServiceState;

/// Apply a control command.
///
/// Always accepted once it parses; durable store outcomes are only visible
/// in logs and `/_status/cache`.
#[tracing::instrument(skip_all)]
pub async fn handler(
    State(state): State<ServiceState>,
    Json(command): Json<ControlCommand>,
) -> StatusCode {
    state.cache().handle(command);
    StatusCode::ACCEPTED
}
