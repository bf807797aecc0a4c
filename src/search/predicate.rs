//! PredicateBuilder - FilterSpec to named SQL conditions / 述語構築
//!
//! A `Predicate` is backend-agnostic: an ordered list of named conditions
//! plus the positional parameter values in bind order. Absent filter
//! fields contribute nothing, so combining filters always narrows and an
//! empty spec means "match everything".

use crate::models::Lang;
use crate::search::filter::FilterSpec;
use crate::search::geo;
use crate::utils::{normalize_text, normalized_contains};

/// One positional SQL parameter / SQLパラメータ
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Real(f64),
}

/// One named condition / 条件
#[derive(Debug, Clone)]
pub struct Condition {
    pub name: &'static str,
    pub sql: String,
}

/// Ordered condition set with parameters in bind order / 述語
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
    pub params: Vec<SqlValue>,
}

impl Predicate {
    /// Render the WHERE clause, empty string when unfiltered.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let joined = self
            .conditions
            .iter()
            .map(|c| c.sql.as_str())
            .collect::<Vec<_>>()
            .join(" AND ");
        format!("WHERE {}", joined)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        self.conditions.iter().any(|c| c.name == name)
    }

    fn push(&mut self, name: &'static str, sql: String) {
        self.conditions.push(Condition { name, sql });
    }
}

pub struct PredicateBuilder;

impl PredicateBuilder {
    /// Predicate for the normalized schema generation: every filter is
    /// pushable, text matching runs over the `*_norm` shadow columns.
    pub fn build(filter: &FilterSpec) -> Predicate {
        let mut pred = Predicate::default();

        Self::push_text_match(&mut pred, filter);
        Self::push_architect_slug_normalized(&mut pred, filter);
        Self::push_facets(&mut pred, filter, true);
        Self::push_media(&mut pred, filter);
        Self::push_geo_bounds(&mut pred, filter);

        pred
    }

    /// Predicate for the legacy schema generation. The legacy table has no
    /// normalized columns, so the text match is left out here and applied
    /// in memory by the legacy repository, before pagination.
    pub fn build_legacy(filter: &FilterSpec) -> Predicate {
        let mut pred = Predicate::default();

        Self::push_architect_slug_legacy(&mut pred, filter);
        Self::push_facets(&mut pred, filter, false);
        Self::push_media(&mut pred, filter);
        Self::push_geo_bounds(&mut pred, filter);

        pred
    }

    fn push_text_match(pred: &mut Predicate, filter: &FilterSpec) {
        let keywords = filter.keywords();
        if keywords.is_empty() {
            return;
        }

        // Each keyword is an OR-group over the four text columns; the
        // groups are AND-ed so every keyword must hit somewhere.
        let group = "(b.title_norm LIKE ? OR b.title_en_norm LIKE ? \
                     OR b.building_type_norm LIKE ? OR b.building_type_en_norm LIKE ?)";
        let sql = keywords
            .iter()
            .map(|_| group)
            .collect::<Vec<_>>()
            .join(" AND ");
        pred.push("textMatch", format!("({})", sql));

        for keyword in &keywords {
            let like = format!("%{}%", keyword);
            for _ in 0..4 {
                pred.params.push(SqlValue::Text(like.clone()));
            }
        }
    }

    /// The slug resolves through the composition layer: an architect row on
    /// a building may stand for a joint-credit group, never assume it is an
    /// individual.
    fn push_architect_slug_normalized(pred: &mut Predicate, filter: &FilterSpec) {
        let Some(slug) = filter.architect_slug.as_deref() else {
            return;
        };
        pred.push(
            "architectSlug",
            "b.building_id IN (\
                SELECT ba.building_id \
                FROM building_architects ba \
                JOIN architect_compositions ac ON ba.architect_id = ac.architect_id \
                JOIN individual_architects ia ON ac.individual_architect_id = ia.individual_architect_id \
                WHERE ia.slug = ?)"
                .to_string(),
        );
        pred.params.push(SqlValue::Text(slug.to_string()));
    }

    fn push_architect_slug_legacy(pred: &mut Predicate, filter: &FilterSpec) {
        let Some(slug) = filter.architect_slug.as_deref() else {
            return;
        };
        // The legacy table stores slugs as a comma-joined list.
        pred.push(
            "architectSlug",
            "instr(',' || IFNULL(b.architect_slugs, '') || ',', ?) > 0".to_string(),
        );
        pred.params.push(SqlValue::Text(format!(",{},", slug)));
    }

    fn push_facets(pred: &mut Predicate, filter: &FilterSpec, normalized: bool) {
        if let Some(prefecture) = filter.prefecture.as_deref() {
            let column = match filter.lang {
                Lang::Ja => "b.prefecture",
                Lang::En => "b.prefecture_en",
            };
            pred.push("prefecture", format!("{} LIKE ?", column));
            pred.params.push(SqlValue::Text(format!("%{}%", prefecture)));
        }

        if let Some(building_type) = filter.building_type.as_deref() {
            let (column, value) = if normalized {
                let column = match filter.lang {
                    Lang::Ja => "b.building_type_norm",
                    Lang::En => "b.building_type_en_norm",
                };
                (column, normalize_text(building_type))
            } else {
                let column = match filter.lang {
                    Lang::Ja => "b.building_type",
                    Lang::En => "b.building_type_en",
                };
                (column, building_type.to_string())
            };
            pred.push("buildingType", format!("{} LIKE ?", column));
            pred.params.push(SqlValue::Text(format!("%{}%", value)));
        }

        if let Some(year) = filter.completion_year {
            pred.push("completionYear", "b.completion_year = ?".to_string());
            pred.params.push(SqlValue::Int(year));
        }
    }

    fn push_media(pred: &mut Predicate, filter: &FilterSpec) {
        if filter.has_photos {
            pred.push(
                "hasPhoto",
                "b.thumbnail_url IS NOT NULL AND b.thumbnail_url != ''".to_string(),
            );
        }
        if filter.has_videos {
            pred.push(
                "hasVideo",
                "b.youtube_url IS NOT NULL AND b.youtube_url != ''".to_string(),
            );
        }
    }

    /// Coarse bounding box; the exact haversine cut runs after fetch.
    fn push_geo_bounds(pred: &mut Predicate, filter: &FilterSpec) {
        let Some(geo_query) = filter.geo else {
            return;
        };
        let bbox = geo::bounding_box(geo_query.center, geo_query.radius_km);
        pred.push(
            "geoBounds",
            "b.lat IS NOT NULL AND b.lng IS NOT NULL \
             AND b.lat BETWEEN ? AND ? AND b.lng BETWEEN ? AND ?"
                .to_string(),
        );
        pred.params.push(SqlValue::Real(bbox.min_lat));
        pred.params.push(SqlValue::Real(bbox.max_lat));
        pred.params.push(SqlValue::Real(bbox.min_lng));
        pred.params.push(SqlValue::Real(bbox.max_lng));
    }
}

/// In-memory text match used where the storage side cannot run the
/// normalized comparison (legacy schema). Must agree with the SQL side:
/// every keyword has to hit one of the same four fields.
pub fn matches_keywords(
    keywords: &[String],
    title: &str,
    title_en: &str,
    building_type: &str,
    building_type_en: &str,
) -> bool {
    keywords.iter().all(|keyword| {
        normalized_contains(title, keyword)
            || normalized_contains(title_en, keyword)
            || normalized_contains(building_type, keyword)
            || normalized_contains(building_type_en, keyword)
    })
}
