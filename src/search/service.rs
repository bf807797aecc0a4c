//! SearchService - one operation per entry mode / 検索サービス
//!
//! Every operation validates its inputs into a FilterSpec, delegates to
//! the repository, reconstructs architect lists, paginates and returns the
//! single SearchResult shape. A storage failure propagates as a typed
//! error; an empty result set never does.

use crate::error::SearchError;
use crate::models::{Building, BuildingRow, Lang, PopularSearch, SearchResult};
use crate::repo::BuildingRepository;
use crate::search::filter::FilterSpec;
use crate::search::geo;
use crate::search::paginate::{self, PageRequest};
use std::sync::Arc;

pub struct SearchService {
    repo: Arc<dyn BuildingRepository>,
}

impl SearchService {
    pub fn new(repo: Arc<dyn BuildingRepository>) -> Self {
        Self { repo }
    }

    /// Plain keyword search / キーワード検索
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        has_photos: bool,
        has_videos: bool,
        lang: Lang,
        page_size: Option<u32>,
    ) -> Result<SearchResult, SearchError> {
        let filter = FilterSpec::keyword(query, page, has_photos, has_videos, lang, page_size);
        self.run_paged(&filter).await
    }

    /// Multi-criteria search / 複数条件検索
    #[allow(clippy::too_many_arguments)]
    pub async fn search_multi_criteria(
        &self,
        query: &str,
        completion_year: Option<i64>,
        prefecture: Option<&str>,
        building_type: Option<&str>,
        has_photos: bool,
        has_videos: bool,
        page: u32,
        lang: Lang,
        page_size: Option<u32>,
    ) -> Result<SearchResult, SearchError> {
        let filter = FilterSpec::multi(
            query,
            completion_year,
            prefecture,
            building_type,
            has_photos,
            has_videos,
            page,
            lang,
            page_size,
        );
        self.run_paged(&filter).await
    }

    /// Geo-radius search, distance ascending / 周辺検索
    #[allow(clippy::too_many_arguments)]
    pub async fn search_by_location(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        page: u32,
        has_photos: bool,
        has_videos: bool,
        lang: Lang,
        page_size: Option<u32>,
    ) -> Result<SearchResult, SearchError> {
        let filter =
            FilterSpec::location(lat, lng, radius_km, page, has_photos, has_videos, lang, page_size)?;
        let geo_query = match filter.geo {
            Some(g) => g,
            None => return Err(SearchError::InvalidInput("geo point required".to_string())),
        };

        // Bounding box ran in SQL; exact cut, ordering and pagination over
        // the candidate set happen here, in that order.
        let candidates = self.repo.candidates(&filter).await?;
        let hits = geo::filter_and_sort(geo_query.center, geo_query.radius_km, candidates);

        let request = PageRequest::new(filter.page, filter.page_size);
        let (page_hits, total) = paginate::paginate(hits, request);

        let with_distance: Vec<(BuildingRow, Option<f64>)> = page_hits
            .into_iter()
            .map(|(row, distance)| (row, Some(distance)))
            .collect();
        let buildings = self.attach_architects(with_distance).await?;

        Ok(self.result(&filter, buildings, total, None))
    }

    /// Architect-slug search. An unknown slug is an empty result with a
    /// null profile, not an error.
    #[allow(clippy::too_many_arguments)]
    pub async fn search_by_architect_slug(
        &self,
        slug: &str,
        page: u32,
        lang: Lang,
        page_size: Option<u32>,
        completion_year: Option<i64>,
        prefecture: Option<&str>,
        query: Option<&str>,
    ) -> Result<SearchResult, SearchError> {
        let architect_info = self.repo.architect_by_slug(slug).await?;

        let filter = FilterSpec::architect(slug, page, lang, page_size)
            .with_completion_year(completion_year)
            .with_prefecture(prefecture)
            .with_query(query);

        if architect_info.is_none() {
            return Ok(self.result(&filter, Vec::new(), 0, Some(None)));
        }

        let request = PageRequest::new(filter.page, filter.page_size);
        let (rows, total) = self.repo.count_and_page(&filter, request).await?;
        let buildings = self
            .attach_architects(rows.into_iter().map(|r| (r, None)).collect())
            .await?;

        Ok(self.result(&filter, buildings, total, Some(architect_info)))
    }

    /// Newest buildings for the landing page / 新着
    pub async fn recent_buildings(&self, limit: i64, _lang: Lang) -> Result<Vec<Building>, SearchError> {
        let rows = self.repo.recent(limit.clamp(1, 100)).await?;
        let buildings = self
            .attach_architects(rows.into_iter().map(|r| (r, None)).collect())
            .await?;
        Ok(buildings)
    }

    /// Single building by slug or uid / 個別取得
    pub async fn building_by_slug(&self, slug: &str, _lang: Lang) -> Result<Option<Building>, SearchError> {
        let Some(row) = self.repo.building_by_slug(slug).await? else {
            return Ok(None);
        };
        let mut buildings = self.attach_architects(vec![(row, None)]).await?;
        Ok(buildings.pop())
    }

    /// Fixed popular-search list, as the site has always served it.
    pub fn popular_searches() -> Vec<PopularSearch> {
        [
            ("安藤忠雄", 45),
            ("美術館", 38),
            ("東京", 32),
            ("現代建築", 28),
        ]
        .into_iter()
        .map(|(query, count)| PopularSearch {
            query: query.to_string(),
            count,
        })
        .collect()
    }

    /// Shared non-geo pipeline: SQL count + page, then architects.
    async fn run_paged(&self, filter: &FilterSpec) -> Result<SearchResult, SearchError> {
        let request = PageRequest::new(filter.page, filter.page_size);
        let (rows, total) = self.repo.count_and_page(filter, request).await?;
        let buildings = self
            .attach_architects(rows.into_iter().map(|r| (r, None)).collect())
            .await?;
        Ok(self.result(filter, buildings, total, None))
    }

    async fn attach_architects(
        &self,
        rows: Vec<(BuildingRow, Option<f64>)>,
    ) -> Result<Vec<Building>, SearchError> {
        let ids: Vec<i64> = rows.iter().map(|(row, _)| row.building_id).collect();
        let mut grouped = self.repo.architects_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|(row, distance)| {
                let architects = grouped.remove(&row.building_id).unwrap_or_default();
                Building::assemble(row, architects, distance)
            })
            .collect())
    }

    fn result(
        &self,
        filter: &FilterSpec,
        buildings: Vec<Building>,
        total: i64,
        architect_info: Option<Option<crate::models::ArchitectInfo>>,
    ) -> SearchResult {
        SearchResult {
            buildings,
            total,
            page: filter.page,
            page_size: filter.page_size,
            total_pages: paginate::total_pages(total, filter.page_size),
            architect_info,
        }
    }
}
