//! Repository for the legacy single-table schema generation.
//!
//! The old table has no normalized text columns, so a free-text query
//! cannot be pushed down without reintroducing the width-mismatch bug.
//! Instead the SQL side applies every pushable facet, the normalized text
//! match runs in memory over the full candidate set, and pagination runs
//! AFTER that post-filter. Count and slice therefore always agree.

use crate::models::{ArchitectInfo, ArchitectRef, BuildingRow, LegacyBuildingRow};
use crate::repo::{fetch_count, fetch_rows, BuildingRepository, SchemaGeneration};
use crate::search::aggregate;
use crate::search::filter::FilterSpec;
use crate::search::paginate::{self, PageRequest};
use crate::search::predicate::{PredicateBuilder, SqlValue};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;

const LEGACY_COLUMNS: &str = "b.building_id, b.uid, b.slug, b.title, b.title_en, \
    b.location, b.location_en, b.prefecture, b.prefecture_en, \
    b.building_type, b.building_type_en, b.completion_year, \
    b.lat, b.lng, b.thumbnail_url, b.youtube_url, b.created_at, b.updated_at, \
    b.architect_names_ja, b.architect_names_en, b.architect_ids, b.architect_slugs";

const DEFAULT_ORDER: &str = "ORDER BY (CASE WHEN b.thumbnail_url IS NOT NULL \
    AND b.thumbnail_url != '' THEN 1 ELSE 0 END) DESC, b.building_id DESC";

pub struct LegacyRepo {
    pool: SqlitePool,
}

impl LegacyRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_filtered(&self, filter: &FilterSpec) -> Result<Vec<LegacyBuildingRow>, sqlx::Error> {
        let pred = PredicateBuilder::build_legacy(filter);
        let sql = format!(
            "SELECT {} FROM buildings_legacy b {} {}",
            LEGACY_COLUMNS,
            pred.where_clause(),
            DEFAULT_ORDER,
        );
        let rows: Vec<LegacyBuildingRow> = fetch_rows(&self.pool, &sql, &pred.params).await?;

        let keywords = filter.keywords();
        if keywords.is_empty() {
            return Ok(rows);
        }

        Ok(rows
            .into_iter()
            .filter(|row| {
                crate::search::predicate::matches_keywords(
                    &keywords,
                    &row.title,
                    row.title_en.as_deref().unwrap_or(""),
                    row.building_type.as_deref().unwrap_or(""),
                    row.building_type_en.as_deref().unwrap_or(""),
                )
            })
            .collect())
    }
}

#[async_trait]
impl BuildingRepository for LegacyRepo {
    fn generation(&self) -> SchemaGeneration {
        SchemaGeneration::Legacy
    }

    async fn count_and_page(
        &self,
        filter: &FilterSpec,
        page: PageRequest,
    ) -> Result<(Vec<BuildingRow>, i64), sqlx::Error> {
        if filter.keywords().is_empty() {
            // Fully pushable: count and page in SQL, sharing the WHERE.
            let pred = PredicateBuilder::build_legacy(filter);

            let count_sql = format!(
                "SELECT COUNT(*) FROM buildings_legacy b {}",
                pred.where_clause()
            );
            let total = fetch_count(&self.pool, &count_sql, &pred.params).await?;

            let sql = format!(
                "SELECT {} FROM buildings_legacy b {} {} LIMIT ? OFFSET ?",
                LEGACY_COLUMNS,
                pred.where_clause(),
                DEFAULT_ORDER,
            );
            let mut params = pred.params.clone();
            params.push(SqlValue::Int(page.limit()));
            params.push(SqlValue::Int(page.offset()));
            let rows: Vec<LegacyBuildingRow> = fetch_rows(&self.pool, &sql, &params).await?;

            return Ok((
                rows.into_iter().map(LegacyBuildingRow::into_building_row).collect(),
                total,
            ));
        }

        // Text post-filter first, pagination second.
        let filtered = self.fetch_filtered(filter).await?;
        let (page_rows, total) = paginate::paginate(filtered, page);
        Ok((
            page_rows
                .into_iter()
                .map(LegacyBuildingRow::into_building_row)
                .collect(),
            total,
        ))
    }

    async fn candidates(&self, filter: &FilterSpec) -> Result<Vec<BuildingRow>, sqlx::Error> {
        let rows = self.fetch_filtered(filter).await?;
        Ok(rows.into_iter().map(LegacyBuildingRow::into_building_row).collect())
    }

    async fn architects_for(
        &self,
        building_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<ArchitectRef>>, sqlx::Error> {
        if building_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; building_ids.len()].join(", ");
        let sql = format!(
            "SELECT building_id, architect_names_ja, architect_names_en, architect_ids, architect_slugs \
             FROM buildings_legacy WHERE building_id IN ({})",
            placeholders,
        );

        let mut query = sqlx::query_as::<
            _,
            (i64, Option<String>, Option<String>, Option<String>, Option<String>),
        >(&sql);
        for id in building_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut grouped = HashMap::new();
        for (building_id, names_ja, names_en, ids, slugs) in rows {
            let split = aggregate::split_parallel_lists(
                names_ja.as_deref(),
                names_en.as_deref(),
                ids.as_deref(),
                slugs.as_deref(),
            );
            if split.length_mismatch {
                tracing::warn!("building {}: architect lists truncated", building_id);
            }
            grouped.insert(building_id, split.architects);
        }

        Ok(grouped)
    }

    async fn architect_by_slug(&self, slug: &str) -> Result<Option<ArchitectInfo>, sqlx::Error> {
        // No architect table in this generation; recover the profile from
        // the first building crediting the slug.
        let row: Option<(Option<String>, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT architect_names_ja, architect_names_en, architect_ids, architect_slugs \
                 FROM buildings_legacy \
                 WHERE instr(',' || IFNULL(architect_slugs, '') || ',', ?) > 0 LIMIT 1",
            )
            .bind(format!(",{},", slug))
            .fetch_optional(&self.pool)
            .await?;

        let Some((names_ja, names_en, ids, slugs)) = row else {
            return Ok(None);
        };

        let split = aggregate::split_parallel_lists(
            names_ja.as_deref(),
            names_en.as_deref(),
            ids.as_deref(),
            slugs.as_deref(),
        );
        Ok(split
            .architects
            .into_iter()
            .find(|a| a.slug == slug)
            .map(|a| ArchitectInfo {
                architect_id: a.architect_id,
                name_native: a.name_native,
                name_translated: a.name_translated,
                slug: a.slug,
                website: None,
            }))
    }

    async fn building_by_slug(&self, slug: &str) -> Result<Option<BuildingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM buildings_legacy b WHERE b.slug = ? OR b.uid = ? LIMIT 1",
            LEGACY_COLUMNS,
        );
        let row = sqlx::query_as::<_, LegacyBuildingRow>(&sql)
            .bind(slug)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LegacyBuildingRow::into_building_row))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<BuildingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM buildings_legacy b ORDER BY b.building_id DESC LIMIT ?",
            LEGACY_COLUMNS,
        );
        let rows = sqlx::query_as::<_, LegacyBuildingRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LegacyBuildingRow::into_building_row).collect())
    }
}

#[cfg(test)]
pub(crate) async fn create_legacy_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS buildings_legacy (
            building_id INTEGER PRIMARY KEY AUTOINCREMENT,
            uid TEXT NOT NULL UNIQUE,
            slug TEXT,
            title TEXT NOT NULL,
            title_en TEXT,
            location TEXT,
            location_en TEXT,
            prefecture TEXT,
            prefecture_en TEXT,
            building_type TEXT,
            building_type_en TEXT,
            completion_year INTEGER,
            lat REAL,
            lng REAL,
            thumbnail_url TEXT,
            youtube_url TEXT,
            created_at TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL DEFAULT '',
            architect_names_ja TEXT,
            architect_names_en TEXT,
            architect_ids TEXT,
            architect_slugs TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
