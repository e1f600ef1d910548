use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use pipeline::KvStore;
use serde::Serialize;

use crate::server::app::AppState;

/// Key probed to check the summary store answers.
const PROBE_KEY: &str = "__health_probe__";

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    store: StoreHealth,
    queue: String,
}

#[derive(Serialize)]
pub struct StoreHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Returns 200 OK when the summary store answers a lookup within 5s,
/// 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let store = match tokio::time::timeout(
        Duration::from_secs(5),
        state.deps.cache.get(PROBE_KEY),
    )
    .await
    {
        Ok(Ok(_)) => StoreHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => StoreHealth {
            status: "error".to_string(),
            error: Some(format!("Lookup failed: {}", e)),
        },
        Err(_) => StoreHealth {
            status: "error".to_string(),
            error: Some("Lookup timeout (>5s)".to_string()),
        },
    };

    let is_healthy = store.status == "ok";
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "ok" } else { "unhealthy" }.to_string(),
            store,
            queue: state.deps.controller.config().queue_name.clone(),
        }),
    )
}
