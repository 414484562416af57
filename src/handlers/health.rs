use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::dto::{ReadyzChecks, ReadyzResponse};
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "journal-insights-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Only the store gates readiness; cache and analysis are reported.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyzResponse>) {
    let store = match state.store.get() {
        Ok(store) => match store.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "Readiness probe: store ping failed");
                "failed"
            }
        },
        Err(_) => "not_configured",
    };
    let cache = if state.cache.is_enabled() { "configured" } else { "disabled" };
    let analysis = if state.gateway.is_configured() { "configured" } else { "not_configured" };

    let (status, label) = if store == "ok" {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(ReadyzResponse {
            status: label,
            checks: ReadyzChecks {
                store,
                cache,
                analysis,
            },
        }),
    )
}
