use super::AppState;
use crate::{features::get_features, layers::get_layer};
use axum::{
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    routing::get,
    BoxError, Json, Router,
};
use serde::Serialize;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/tiles/:z/:x/:y_ext", get(get_layer))
        .route("/features/:table_name", get(get_features))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(request_timeout),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A request that outlives the timeout was held up by the store, so it is
/// reported as a gateway timeout.
async fn handle_timeout_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("request exceeded the configured timeout");
        (
            StatusCode::GATEWAY_TIMEOUT,
            "Request took too long".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", err),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    #[serde(rename = "data-present")]
    pub data_present: bool,
}

/// Liveness plus a check that the railway tables are in place. An
/// unreachable store reports `data-present: false` rather than failing.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let data_present = match state.store.data_present().await {
        Ok(present) => present,
        Err(e) => {
            warn!(error = %e, "store unavailable during health check");
            false
        }
    };

    Json(HealthStatus {
        status: "healthy",
        data_present,
    })
}
