//! Storage repositories / ストレージ層
//!
//! One repository implementation per schema generation, behind a single
//! trait. The generation is probed ONCE at startup from sqlite_master and
//! never re-detected per call; the old code path that sniffed tables on
//! every request is gone.

pub mod legacy;
pub mod normalized;

pub use legacy::LegacyRepo;
pub use normalized::NormalizedRepo;

use crate::models::{ArchitectInfo, ArchitectRef, BuildingRow};
use crate::search::filter::FilterSpec;
use crate::search::paginate::PageRequest;
use crate::search::predicate::SqlValue;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

/// Run a row query with a predicate's parameters bound in order.
pub(crate) async fn fetch_rows<O>(
    pool: &SqlitePool,
    sql: &str,
    params: &[SqlValue],
) -> Result<Vec<O>, sqlx::Error>
where
    O: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
{
    let mut query = sqlx::query_as::<_, O>(sql);
    for param in params {
        query = match param {
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Real(f) => query.bind(*f),
        };
    }
    query.fetch_all(pool).await
}

/// Run a COUNT query with a predicate's parameters bound in order.
pub(crate) async fn fetch_count(
    pool: &SqlitePool,
    sql: &str,
    params: &[SqlValue],
) -> Result<i64, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    for param in params {
        query = match param {
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Real(f) => query.bind(*f),
        };
    }
    query.fetch_one(pool).await
}

/// Which storage schema generation this process talks to / スキーマ世代
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGeneration {
    /// Current schema: join tables + normalized text columns.
    Normalized,
    /// Old single-table schema with parallel architect strings.
    Legacy,
}

impl SchemaGeneration {
    /// Capability probe, run once at startup / 起動時に一度だけ実行
    pub async fn probe(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let has_normalized: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'individual_architects'",
        )
        .fetch_one(pool)
        .await?;
        if has_normalized > 0 {
            return Ok(Self::Normalized);
        }

        let has_legacy: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'buildings_legacy'",
        )
        .fetch_one(pool)
        .await?;
        if has_legacy > 0 {
            Ok(Self::Legacy)
        } else {
            // Fresh database: migrations create the normalized schema.
            Ok(Self::Normalized)
        }
    }
}

/// Build the repository matching a probed generation.
pub fn make_repository(pool: SqlitePool, generation: SchemaGeneration) -> Arc<dyn BuildingRepository> {
    match generation {
        SchemaGeneration::Normalized => Arc::new(NormalizedRepo::new(pool)),
        SchemaGeneration::Legacy => Arc::new(LegacyRepo::new(pool)),
    }
}

/// Narrow storage contract the search core consumes: given a predicate and
/// ordering, return building rows and ordered architect data. Any store
/// that can answer these is acceptable.
#[async_trait]
pub trait BuildingRepository: Send + Sync {
    fn generation(&self) -> SchemaGeneration;

    /// Total count plus the exact page slice for one FilterSpec. Count and
    /// rows are computed over the same filter state; implementations that
    /// must post-filter in memory paginate after that filter.
    async fn count_and_page(
        &self,
        filter: &FilterSpec,
        page: PageRequest,
    ) -> Result<(Vec<BuildingRow>, i64), sqlx::Error>;

    /// Every candidate row for the predicate, unpaginated. Geo search cuts
    /// and orders these by distance before paginating.
    async fn candidates(&self, filter: &FilterSpec) -> Result<Vec<BuildingRow>, sqlx::Error>;

    /// Ordered architect lists for the given building ids.
    async fn architects_for(
        &self,
        building_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<ArchitectRef>>, sqlx::Error>;

    /// Architect profile by slug, `None` when unknown.
    async fn architect_by_slug(&self, slug: &str) -> Result<Option<ArchitectInfo>, sqlx::Error>;

    /// One building by slug or uid.
    async fn building_by_slug(&self, slug: &str) -> Result<Option<BuildingRow>, sqlx::Error>;

    /// Newest buildings, id descending.
    async fn recent(&self, limit: i64) -> Result<Vec<BuildingRow>, sqlx::Error>;
}
