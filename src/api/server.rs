use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::state::AppState;

/// GET /api/health - health check / ヘルスチェック
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": env!("BUILD_TIME"),
    }))
}

/// Schema generation the process is serving / 稼働中のスキーマ世代
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub schema_generation: String,
}

pub async fn get_server_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<ServerStatus>> {
    Json(ApiResponse::success(ServerStatus {
        schema_generation: format!("{:?}", state.generation),
    }))
}
