//! Building endpoints / 建築物API

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use archimap_backend::error::SearchError;
use archimap_backend::models::{Building, Lang};

use crate::api::ApiResponse;
use crate::state::AppState;

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub lang: Lang,
}

/// GET /api/buildings/recent - newest buildings / 新着
pub async fn recent_buildings(
    State(state): State<Arc<AppState>>,
    Query(req): Query<RecentQuery>,
) -> Json<ApiResponse<Vec<Building>>> {
    match state.service.recent_buildings(req.limit, req.lang).await {
        Ok(buildings) => Json(ApiResponse::success(buildings)),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    #[serde(default)]
    pub lang: Lang,
}

/// GET /api/buildings/:slug - one building by slug or uid / 個別取得
pub async fn building_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(req): Query<DetailQuery>,
) -> Json<ApiResponse<Building>> {
    match state.service.building_by_slug(&slug, req.lang).await {
        Ok(Some(building)) => Json(ApiResponse::success(building)),
        Ok(None) => Json(ApiResponse::error("building not found")),
        Err(e) => error_response(e),
    }
}

fn error_response<T>(e: SearchError) -> Json<ApiResponse<T>> {
    match e {
        SearchError::InvalidInput(msg) => Json(ApiResponse::error(&msg)),
        SearchError::Storage(e) => {
            tracing::error!("Building lookup storage failure: {}", e);
            Json(ApiResponse::internal_error("search backend unavailable"))
        }
    }
}
