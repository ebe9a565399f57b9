use axum::routing::get;
use axum::Router;

use crate::ServiceState;

mod cache_stats;
mod liveness;
mod readiness;

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(liveness::handler))
        .route("/readyz", get(readiness::handler))
        .route("/cache", get(cache_stats::handler))
}
