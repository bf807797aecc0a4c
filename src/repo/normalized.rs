//! Repository for the current (normalized) schema generation.
//!
//! Every filter the predicate names is pushable here, so count and page
//! run as two SQL queries sharing one WHERE clause. Architect data comes
//! back as one row per (building, credited individual), ordered by the
//! query, and is grouped in memory; no GROUP_CONCAT anywhere.

use crate::models::{ArchitectInfo, ArchitectLinkRow, ArchitectRef, BuildingRow};
use crate::repo::{fetch_count, fetch_rows, BuildingRepository, SchemaGeneration};
use crate::search::aggregate;
use crate::search::filter::FilterSpec;
use crate::search::paginate::PageRequest;
use crate::search::predicate::{PredicateBuilder, SqlValue};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;

const BUILDING_COLUMNS: &str = "b.building_id, b.uid, b.slug, b.title, b.title_en, \
    b.location, b.location_en, b.prefecture, b.prefecture_en, \
    b.building_type, b.building_type_en, b.completion_year, \
    b.lat, b.lng, b.thumbnail_url, b.youtube_url, b.created_at, b.updated_at";

/// Default ordering: buildings with a photo first, newest id next.
const DEFAULT_ORDER: &str = "ORDER BY (CASE WHEN b.thumbnail_url IS NOT NULL \
    AND b.thumbnail_url != '' THEN 1 ELSE 0 END) DESC, b.building_id DESC";

pub struct NormalizedRepo {
    pool: SqlitePool,
}

impl NormalizedRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuildingRepository for NormalizedRepo {
    fn generation(&self) -> SchemaGeneration {
        SchemaGeneration::Normalized
    }

    async fn count_and_page(
        &self,
        filter: &FilterSpec,
        page: PageRequest,
    ) -> Result<(Vec<BuildingRow>, i64), sqlx::Error> {
        let pred = PredicateBuilder::build(filter);

        let count_sql = format!("SELECT COUNT(*) FROM buildings b {}", pred.where_clause());
        let total = fetch_count(&self.pool, &count_sql, &pred.params).await?;

        let sql = format!(
            "SELECT {} FROM buildings b {} {} LIMIT ? OFFSET ?",
            BUILDING_COLUMNS,
            pred.where_clause(),
            DEFAULT_ORDER,
        );
        let mut params = pred.params.clone();
        params.push(SqlValue::Int(page.limit()));
        params.push(SqlValue::Int(page.offset()));
        let rows: Vec<BuildingRow> = fetch_rows(&self.pool, &sql, &params).await?;

        Ok((rows, total))
    }

    async fn candidates(&self, filter: &FilterSpec) -> Result<Vec<BuildingRow>, sqlx::Error> {
        let pred = PredicateBuilder::build(filter);
        let sql = format!(
            "SELECT {} FROM buildings b {} {}",
            BUILDING_COLUMNS,
            pred.where_clause(),
            DEFAULT_ORDER,
        );
        fetch_rows(&self.pool, &sql, &pred.params).await
    }

    async fn architects_for(
        &self,
        building_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<ArchitectRef>>, sqlx::Error> {
        if building_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; building_ids.len()].join(", ");
        // The ORDER BY here IS the credit ordering; the aggregator groups
        // without re-sorting.
        let sql = format!(
            "SELECT ba.building_id, ba.architect_order, ac.order_index, \
                    ia.individual_architect_id, ia.name_ja, ia.name_en, ia.slug \
             FROM building_architects ba \
             JOIN architect_compositions ac ON ba.architect_id = ac.architect_id \
             JOIN individual_architects ia ON ac.individual_architect_id = ia.individual_architect_id \
             WHERE ba.building_id IN ({}) \
             ORDER BY ba.building_id, ba.architect_order, ac.order_index",
            placeholders,
        );

        let mut query = sqlx::query_as::<_, ArchitectLinkRow>(&sql);
        for id in building_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(aggregate::group_architect_rows(rows))
    }

    async fn architect_by_slug(&self, slug: &str) -> Result<Option<ArchitectInfo>, sqlx::Error> {
        let row: Option<(i64, String, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT individual_architect_id, name_ja, name_en, slug, website \
                 FROM individual_architects WHERE slug = ?",
            )
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, name_ja, name_en, slug, website)| ArchitectInfo {
            architect_id: id,
            name_translated: name_en
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| name_ja.clone()),
            name_native: name_ja,
            slug: slug.unwrap_or_default(),
            website,
        }))
    }

    async fn building_by_slug(&self, slug: &str) -> Result<Option<BuildingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM buildings b WHERE b.slug = ? OR b.uid = ? LIMIT 1",
            BUILDING_COLUMNS,
        );
        sqlx::query_as::<_, BuildingRow>(&sql)
            .bind(slug)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn recent(&self, limit: i64) -> Result<Vec<BuildingRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM buildings b ORDER BY b.building_id DESC LIMIT ?",
            BUILDING_COLUMNS,
        );
        sqlx::query_as::<_, BuildingRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::models::Lang;

    async fn seeded() -> (SqlitePool, NormalizedRepo) {
        let pool = fixtures::memory_pool().await;

        let forum = fixtures::insert_building(
            &pool, "b-forum", "東京国際フォーラム", Some("Tokyo International Forum"),
            Some("東京都"), Some("ホール"), Some(1996),
            Some(35.6767), Some(139.7638), Some("forum.jpg"), None,
        )
        .await;
        let museum = fixtures::insert_building(
            &pool, "b-21c", "金沢21世紀美術館", Some("21st Century Museum"),
            Some("石川県"), Some("美術館"), Some(2004),
            Some(36.5606), Some(136.6587), Some("21c.jpg"), Some("https://youtu.be/x"),
        )
        .await;
        let church = fixtures::insert_building(
            &pool, "b-light", "光の教会", Some("Church of the Light"),
            Some("大阪府"), Some("教会"), Some(1989),
            Some(34.8164), Some(135.5468), None, None,
        )
        .await;

        // SANAA is a two-member unit credited as one party on the museum.
        let sejima = fixtures::insert_individual(&pool, "妹島和世", Some("Kazuyo Sejima"), "kazuyo-sejima", None).await;
        let nishizawa =
            fixtures::insert_individual(&pool, "西沢立衛", Some("Ryue Nishizawa"), "ryue-nishizawa", None).await;
        let ando = fixtures::insert_individual(
            &pool, "安藤忠雄", Some("Tadao Ando"), "tadao-ando", Some("https://example.com/ando"),
        )
        .await;

        fixtures::add_composition_member(&pool, 100, sejima, 0).await;
        fixtures::add_composition_member(&pool, 100, nishizawa, 1).await;
        fixtures::add_composition_member(&pool, 200, ando, 0).await;

        fixtures::credit_building(&pool, museum, 100, 0).await;
        fixtures::credit_building(&pool, church, 200, 0).await;
        let _ = forum;

        (pool.clone(), NormalizedRepo::new(pool))
    }

    #[tokio::test]
    async fn test_count_and_page_share_filter_state() {
        let (_pool, repo) = seeded().await;
        let filter = FilterSpec::keyword("美術館", 1, false, false, Lang::Ja, None);
        let (rows, total) = repo
            .count_and_page(&filter, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "金沢21世紀美術館");
    }

    #[tokio::test]
    async fn test_text_match_is_width_insensitive() {
        let (_pool, repo) = seeded().await;
        // half-width katakana query against a full-width title
        let filter = FilterSpec::keyword("ﾌｫｰﾗﾑ", 1, false, false, Lang::Ja, None);
        let (rows, total) = repo
            .count_and_page(&filter, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].title, "東京国際フォーラム");
    }

    #[tokio::test]
    async fn test_empty_filter_matches_everything() {
        let (_pool, repo) = seeded().await;
        let filter = FilterSpec::keyword("", 1, false, false, Lang::Ja, None);
        let (rows, total) = repo
            .count_and_page(&filter, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 3);
        // photo rows first, then id descending
        assert!(rows[0].has_photo());
        assert!(rows[1].has_photo());
        assert!(!rows[2].has_photo());
    }

    #[tokio::test]
    async fn test_architect_slug_resolves_through_composition() {
        let (_pool, repo) = seeded().await;
        // Sejima is credited only through the SANAA composition.
        let filter = FilterSpec::architect("kazuyo-sejima", 1, Lang::Ja, None);
        let (rows, total) = repo
            .count_and_page(&filter, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].title, "金沢21世紀美術館");
    }

    #[tokio::test]
    async fn test_architects_for_orders_by_credit() {
        let (_pool, repo) = seeded().await;
        let filter = FilterSpec::keyword("美術館", 1, false, false, Lang::Ja, None);
        let (rows, _) = repo
            .count_and_page(&filter, PageRequest::new(1, 10))
            .await
            .unwrap();
        let grouped = repo.architects_for(&[rows[0].building_id]).await.unwrap();
        let list = &grouped[&rows[0].building_id];
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name_native, "妹島和世");
        assert_eq!(list[1].name_native, "西沢立衛");
        assert_eq!(list[1].slug, "ryue-nishizawa");
    }

    #[tokio::test]
    async fn test_architect_by_slug_profile() {
        let (_pool, repo) = seeded().await;
        let info = repo.architect_by_slug("tadao-ando").await.unwrap().unwrap();
        assert_eq!(info.name_native, "安藤忠雄");
        assert_eq!(info.name_translated, "Tadao Ando");
        assert_eq!(info.website.as_deref(), Some("https://example.com/ando"));

        assert!(repo.architect_by_slug("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_building_by_slug_falls_back_to_uid() {
        let (_pool, repo) = seeded().await;
        let row = repo.building_by_slug("b-light").await.unwrap().unwrap();
        assert_eq!(row.title, "光の教会");
        assert!(repo.building_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_is_id_descending() {
        let (_pool, repo) = seeded().await;
        let rows = repo.recent(2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].building_id > rows[1].building_id);
    }
}
