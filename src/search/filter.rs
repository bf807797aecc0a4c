//! FilterSpec - immutable description of one search request / 検索条件
//!
//! Constructed once per request through the mode constructors below and
//! never mutated afterwards. Empty optional fields stay `None` so the
//! predicate layer can tell "no filter" from "filter on empty string".

use crate::error::SearchError;
use crate::models::Lang;
use crate::search::geo::GeoPoint;
use crate::utils::parse_keywords;

/// Page size used when a request omits or zeroes it / デフォルト件数
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound a single request may ask for / 件数上限
pub const MAX_PAGE_SIZE: u32 = 100;

/// Geo scope of a "near me" request / 位置検索条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoQuery {
    pub center: GeoPoint,
    pub radius_km: f64,
}

/// Immutable value object describing one search request.
///
/// At most one of `query` / `architect_slug` drives the join strategy;
/// every other populated field narrows the result with an AND predicate.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub query: Option<String>,
    pub architect_slug: Option<String>,
    pub prefecture: Option<String>,
    pub building_type: Option<String>,
    pub completion_year: Option<i64>,
    pub has_photos: bool,
    pub has_videos: bool,
    pub geo: Option<GeoQuery>,
    pub lang: Lang,
    pub page: u32,
    pub page_size: u32,
}

impl FilterSpec {
    fn base(page: u32, lang: Lang, page_size: Option<u32>) -> Self {
        Self {
            query: None,
            architect_slug: None,
            prefecture: None,
            building_type: None,
            completion_year: None,
            has_photos: false,
            has_videos: false,
            geo: None,
            lang,
            page: page.max(1),
            page_size: clamp_page_size(page_size),
        }
    }

    /// Plain keyword search / キーワード検索
    pub fn keyword(
        query: &str,
        page: u32,
        has_photos: bool,
        has_videos: bool,
        lang: Lang,
        page_size: Option<u32>,
    ) -> Self {
        let mut spec = Self::base(page, lang, page_size);
        spec.query = non_empty(query);
        spec.has_photos = has_photos;
        spec.has_videos = has_videos;
        spec
    }

    /// Multi-criteria search / 複数条件検索
    #[allow(clippy::too_many_arguments)]
    pub fn multi(
        query: &str,
        completion_year: Option<i64>,
        prefecture: Option<&str>,
        building_type: Option<&str>,
        has_photos: bool,
        has_videos: bool,
        page: u32,
        lang: Lang,
        page_size: Option<u32>,
    ) -> Self {
        let mut spec = Self::keyword(query, page, has_photos, has_videos, lang, page_size);
        spec.completion_year = completion_year;
        spec.prefecture = prefecture.and_then(non_empty);
        spec.building_type = building_type.and_then(non_empty);
        spec
    }

    /// Geo-radius search. The geo point was explicitly requested, so a
    /// malformed one is rejected rather than defaulted.
    #[allow(clippy::too_many_arguments)]
    pub fn location(
        lat: f64,
        lng: f64,
        radius_km: f64,
        page: u32,
        has_photos: bool,
        has_videos: bool,
        lang: Lang,
        page_size: Option<u32>,
    ) -> Result<Self, SearchError> {
        let center = GeoPoint::validated(lat, lng).ok_or_else(|| {
            SearchError::InvalidInput(format!("invalid coordinates: ({}, {})", lat, lng))
        })?;
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(SearchError::InvalidInput(format!(
                "invalid radius: {}",
                radius_km
            )));
        }

        let mut spec = Self::base(page, lang, page_size);
        spec.has_photos = has_photos;
        spec.has_videos = has_videos;
        spec.geo = Some(GeoQuery { center, radius_km });
        Ok(spec)
    }

    /// Architect-slug search / 建築家別検索
    pub fn architect(slug: &str, page: u32, lang: Lang, page_size: Option<u32>) -> Self {
        let mut spec = Self::base(page, lang, page_size);
        spec.architect_slug = non_empty(slug);
        spec
    }

    /// Additional narrowing for architect pages / 建築家ページの絞り込み
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.and_then(non_empty);
        self
    }

    pub fn with_completion_year(mut self, year: Option<i64>) -> Self {
        self.completion_year = year;
        self
    }

    pub fn with_prefecture(mut self, prefecture: Option<&str>) -> Self {
        self.prefecture = prefecture.and_then(non_empty);
        self
    }

    /// Normalized keywords of the free-text query, empty when absent.
    pub fn keywords(&self) -> Vec<String> {
        self.query.as_deref().map(parse_keywords).unwrap_or_default()
    }
}

fn clamp_page_size(requested: Option<u32>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(n) => n.min(MAX_PAGE_SIZE),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_stay_none() {
        let spec = FilterSpec::multi("  ", None, Some(""), Some("  "), false, false, 1, Lang::Ja, None);
        assert!(spec.query.is_none());
        assert!(spec.prefecture.is_none());
        assert!(spec.building_type.is_none());
        assert!(spec.keywords().is_empty());
    }

    #[test]
    fn test_page_and_size_clamped() {
        let spec = FilterSpec::keyword("a", 0, false, false, Lang::Ja, Some(0));
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);

        let spec = FilterSpec::keyword("a", 3, false, false, Lang::Ja, Some(5000));
        assert_eq!(spec.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_location_rejects_bad_input() {
        assert!(FilterSpec::location(f64::NAN, 139.0, 5.0, 1, false, false, Lang::Ja, None).is_err());
        assert!(FilterSpec::location(91.0, 139.0, 5.0, 1, false, false, Lang::Ja, None).is_err());
        assert!(FilterSpec::location(35.0, 181.0, 5.0, 1, false, false, Lang::Ja, None).is_err());
        assert!(FilterSpec::location(35.0, 139.0, -1.0, 1, false, false, Lang::Ja, None).is_err());
        assert!(FilterSpec::location(35.0, 139.0, 0.0, 1, false, false, Lang::Ja, None).is_ok());
    }

    #[test]
    fn test_keywords_normalized() {
        let spec = FilterSpec::keyword("ﾀﾜｰ　Ｔｏｋｙｏ", 1, false, false, Lang::Ja, None);
        assert_eq!(spec.keywords(), vec!["タワー", "tokyo"]);
    }
}
