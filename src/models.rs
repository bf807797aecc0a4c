//! Domain types shared by the search core and the API layer.

use serde::{Deserialize, Serialize};

/// Result language / 表示言語
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ja,
    En,
}

/// One credited architect on a building, in credit order / 建築家クレジット
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectRef {
    pub architect_id: i64,
    pub name_native: String,
    pub name_translated: String,
    pub slug: String,
}

/// Architect profile returned by slug search / 建築家プロフィール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectInfo {
    pub architect_id: i64,
    pub name_native: String,
    pub name_translated: String,
    pub slug: String,
    pub website: Option<String>,
}

/// One building in a search result / 建築物
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub building_id: i64,
    pub uid: String,
    pub slug: String,
    pub title: String,
    pub title_en: String,
    pub location: String,
    pub location_en: String,
    pub prefecture: String,
    pub prefecture_en: String,
    pub building_types: Vec<String>,
    pub building_types_en: Vec<String>,
    pub completion_year: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub has_photo: bool,
    pub has_video: bool,
    pub thumbnail_url: String,
    pub youtube_url: String,
    /// Distance from the query point in km, geo search only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub architects: Vec<ArchitectRef>,
    pub created_at: String,
    pub updated_at: String,
}

/// Unified search result shape for every entry mode / 検索結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub buildings: Vec<Building>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    /// Present only for architect-slug search. `Some(None)` means the slug
    /// was unknown and serializes as an explicit null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architect_info: Option<Option<ArchitectInfo>>,
}

/// Popular search entry / 人気検索
#[derive(Debug, Clone, Serialize)]
pub struct PopularSearch {
    pub query: String,
    pub count: u32,
}

/// Raw building row as stored / DB上の建築物行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BuildingRow {
    pub building_id: i64,
    pub uid: String,
    pub slug: Option<String>,
    pub title: String,
    pub title_en: Option<String>,
    pub location: Option<String>,
    pub location_en: Option<String>,
    pub prefecture: Option<String>,
    pub prefecture_en: Option<String>,
    pub building_type: Option<String>,
    pub building_type_en: Option<String>,
    pub completion_year: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BuildingRow {
    pub fn has_photo(&self) -> bool {
        self.thumbnail_url.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }

    pub fn has_video(&self) -> bool {
        self.youtube_url.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }
}

/// One (building, credited individual) join row, pre-ordered by the query's
/// ORDER BY (building_id, architect_order, order_index).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArchitectLinkRow {
    pub building_id: i64,
    pub architect_order: i64,
    pub order_index: i64,
    pub individual_architect_id: i64,
    pub name_ja: String,
    pub name_en: Option<String>,
    pub slug: Option<String>,
}

/// Legacy-generation building row carrying the denormalized parallel
/// architect strings / 旧スキーマの行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LegacyBuildingRow {
    pub building_id: i64,
    pub uid: String,
    pub slug: Option<String>,
    pub title: String,
    pub title_en: Option<String>,
    pub location: Option<String>,
    pub location_en: Option<String>,
    pub prefecture: Option<String>,
    pub prefecture_en: Option<String>,
    pub building_type: Option<String>,
    pub building_type_en: Option<String>,
    pub completion_year: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub architect_names_ja: Option<String>,
    pub architect_names_en: Option<String>,
    pub architect_ids: Option<String>,
    pub architect_slugs: Option<String>,
}

impl LegacyBuildingRow {
    pub fn into_building_row(self) -> BuildingRow {
        BuildingRow {
            building_id: self.building_id,
            uid: self.uid,
            slug: self.slug,
            title: self.title,
            title_en: self.title_en,
            location: self.location,
            location_en: self.location_en,
            prefecture: self.prefecture,
            prefecture_en: self.prefecture_en,
            building_type: self.building_type,
            building_type_en: self.building_type_en,
            completion_year: self.completion_year,
            lat: self.lat,
            lng: self.lng,
            thumbnail_url: self.thumbnail_url,
            youtube_url: self.youtube_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Building {
    /// Assemble the output shape from a stored row plus its reconstructed
    /// architect list. Translated fields fall back to the native value, and
    /// the slash-joined type strings become arrays, the way the site has
    /// always served them.
    pub fn assemble(
        row: BuildingRow,
        architects: Vec<ArchitectRef>,
        distance: Option<f64>,
    ) -> Self {
        let has_photo = row.has_photo();
        let has_video = row.has_video();

        let title = row.title;
        let title_en = row.title_en.filter(|s| !s.is_empty()).unwrap_or_else(|| title.clone());
        let location = row.location.unwrap_or_default();
        let location_en = row
            .location_en
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| location.clone());
        let prefecture = row.prefecture.unwrap_or_default();
        let prefecture_en = row
            .prefecture_en
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| prefecture.clone());

        Self {
            building_id: row.building_id,
            slug: row.slug.filter(|s| !s.is_empty()).unwrap_or_else(|| row.uid.clone()),
            uid: row.uid,
            title,
            title_en,
            location,
            location_en,
            prefecture,
            prefecture_en,
            building_types: split_types(row.building_type.as_deref()),
            building_types_en: split_types(row.building_type_en.as_deref()),
            completion_year: row.completion_year,
            lat: row.lat,
            lng: row.lng,
            has_photo,
            has_video,
            thumbnail_url: row.thumbnail_url.unwrap_or_default(),
            youtube_url: row.youtube_url.unwrap_or_default(),
            distance,
            architects,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Split a slash-joined building-type string into clean parts.
fn split_types(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split('/')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> BuildingRow {
        BuildingRow {
            building_id: 1,
            uid: "bldg-0001".to_string(),
            slug: None,
            title: "東京文化会館".to_string(),
            title_en: None,
            location: Some("台東区上野公園".to_string()),
            location_en: None,
            prefecture: Some("東京都".to_string()),
            prefecture_en: Some("Tokyo".to_string()),
            building_type: Some("ホール / 劇場".to_string()),
            building_type_en: Some("hall / theater".to_string()),
            completion_year: Some(1961),
            lat: Some(35.7159),
            lng: Some(139.7745),
            thumbnail_url: Some("https://img.example.com/1.jpg".to_string()),
            youtube_url: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_assemble_fallbacks() {
        let b = Building::assemble(row(), vec![], None);
        // slug falls back to uid, translated fields to native
        assert_eq!(b.slug, "bldg-0001");
        assert_eq!(b.title_en, "東京文化会館");
        assert_eq!(b.location_en, "台東区上野公園");
        assert!(b.has_photo);
        assert!(!b.has_video);
        assert_eq!(b.building_types, vec!["ホール", "劇場"]);
        assert_eq!(b.building_types_en, vec!["hall", "theater"]);
    }

    #[test]
    fn test_empty_type_segments_dropped() {
        let mut r = row();
        r.building_type = Some("/住宅//".to_string());
        let b = Building::assemble(r, vec![], None);
        assert_eq!(b.building_types, vec!["住宅"]);
    }
}
