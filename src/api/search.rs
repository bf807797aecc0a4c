//! Search endpoints / 検索API
//!
//! Thin JSON layer over the SearchService: deserialize + default the
//! request, run the operation, record deduplicated history, wrap the
//! result. Invalid input maps to a 400 envelope, a storage failure to a
//! 500 envelope; empty results are plain success.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use archimap_backend::config;
use archimap_backend::error::SearchError;
use archimap_backend::models::{Lang, PopularSearch, SearchResult};
use archimap_backend::search::{SearchKind, SearchService};

use crate::api::ApiResponse;
use crate::state::AppState;

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub has_photos: bool,
    #[serde(default)]
    pub has_videos: bool,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/search - keyword search / キーワード検索
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResult>> {
    let outcome = state
        .service
        .search(&req.query, req.page, req.has_photos, req.has_videos, req.lang, req.page_size)
        .await;

    match outcome {
        Ok(result) => {
            record_history(&state, req.session_id, &req.query, SearchKind::Keyword).await;
            Json(ApiResponse::success(result))
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct MultiSearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub completion_year: Option<i64>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub has_photos: bool,
    #[serde(default)]
    pub has_videos: bool,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/search/multi - faceted search / 複数条件検索
pub async fn search_multi(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MultiSearchRequest>,
) -> Json<ApiResponse<SearchResult>> {
    let outcome = state
        .service
        .search_multi_criteria(
            &req.query,
            req.completion_year,
            req.prefecture.as_deref(),
            req.building_type.as_deref(),
            req.has_photos,
            req.has_videos,
            req.page,
            req.lang,
            req.page_size,
        )
        .await;

    match outcome {
        Ok(result) => {
            record_history(&state, req.session_id, &req.query, SearchKind::Multi).await;
            Json(ApiResponse::success(result))
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationSearchRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub radius_km: Option<f64>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub has_photos: bool,
    #[serde(default)]
    pub has_videos: bool,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/search/location - "near me" search / 周辺検索
pub async fn search_location(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LocationSearchRequest>,
) -> Json<ApiResponse<SearchResult>> {
    let radius_km = req
        .radius_km
        .unwrap_or_else(|| config::config().search.default_radius_km);

    let outcome = state
        .service
        .search_by_location(
            req.lat,
            req.lng,
            radius_km,
            req.page,
            req.has_photos,
            req.has_videos,
            req.lang,
            req.page_size,
        )
        .await;

    match outcome {
        Ok(result) => {
            let query = format!("{:.4},{:.4}", req.lat, req.lng);
            record_history(&state, req.session_id, &query, SearchKind::Location).await;
            Json(ApiResponse::success(result))
        }
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ArchitectBuildingsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub completion_year: Option<i64>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// GET /api/architects/:slug/buildings - architect page / 建築家別
pub async fn architect_buildings(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(req): Query<ArchitectBuildingsQuery>,
) -> Json<ApiResponse<SearchResult>> {
    let outcome = state
        .service
        .search_by_architect_slug(
            &slug,
            req.page,
            req.lang,
            req.page_size,
            req.completion_year,
            req.prefecture.as_deref(),
            req.q.as_deref(),
        )
        .await;

    match outcome {
        Ok(result) => {
            record_history(&state, req.session_id, &slug, SearchKind::Architect).await;
            Json(ApiResponse::success(result))
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/search/popular - popular searches / 人気検索
pub async fn popular_searches() -> Json<ApiResponse<Vec<PopularSearch>>> {
    Json(ApiResponse::success(SearchService::popular_searches()))
}

/// Record the executed search, deduplicated per session. Anonymous
/// requests get a throwaway session id; the insert still happens, only
/// the dedup window is lost.
async fn record_history(
    state: &AppState,
    session_id: Option<String>,
    query: &str,
    kind: SearchKind,
) {
    let session = session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    state.history.record(&state.db, &session, query, kind).await;
}

fn error_response<T>(e: SearchError) -> Json<ApiResponse<T>> {
    match e {
        SearchError::InvalidInput(msg) => Json(ApiResponse::error(&msg)),
        SearchError::Storage(e) => {
            tracing::error!("Search storage failure: {}", e);
            Json(ApiResponse::internal_error("search backend unavailable"))
        }
    }
}
