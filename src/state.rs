use archimap_backend::repo::SchemaGeneration;
use archimap_backend::search::{SearchHistory, SearchService};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state / アプリ状態
///
/// The schema generation is probed once at startup and fixed for the
/// process lifetime; the history component is an explicit field, never a
/// global.
pub struct AppState {
    pub db: SqlitePool,
    pub generation: SchemaGeneration,
    pub service: SearchService,
    pub history: Arc<SearchHistory>,
}
