//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use super::AppState;
use crate::store::tables;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = match state.board.store().select(tables::ORGANIZATIONS, None).await {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Health check could not reach the store: {e}");
            false
        }
    };

    let status = if store_ok { "healthy" } else { "degraded" };
    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "okrserver",
            "version": env!("CARGO_PKG_VERSION"),
            "store": store_ok
        })),
    )
}

pub async fn health_check_simple() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "okrserver",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
