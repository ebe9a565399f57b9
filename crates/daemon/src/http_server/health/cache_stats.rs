use axum::extract::State;
use axum::Json;

use common::CacheStats;

use crate::ServiceState;

pub async fn handler(State(state): State<ServiceState>) -> Json<CacheStats> {
    Json(state.cache().stats())
}
