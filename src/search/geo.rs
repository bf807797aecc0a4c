//! GeoFilter - great-circle distance filtering / 距離検索
//!
//! Pure functions over (lat, lng) pairs. The repository applies only a
//! coarse bounding box in SQL; the exact haversine cut, the distance sort
//! and the pagination that follows all run here so the result is identical
//! to an in-storage plan.

use crate::models::BuildingRow;
use std::cmp::Ordering;

/// Mean Earth radius in km / 地球半径
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated coordinate pair / 座標
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Accepts only finite, in-range coordinates.
    pub fn validated(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

/// Haversine great-circle distance in km / 大円距離
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Coordinates acceptable as a distance candidate: present, finite,
/// in range, and not the (0, 0) placeholder rows carry when geocoding
/// never ran. Anything else is excluded, never given a made-up distance.
pub fn candidate_point(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    let point = GeoPoint::validated(lat?, lng?)?;
    if point.lat == 0.0 && point.lng == 0.0 {
        return None;
    }
    Some(point)
}

/// Coarse prefilter box for the SQL side / SQL用バウンディングボックス
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

pub fn bounding_box(center: GeoPoint, radius_km: f64) -> BoundingBox {
    let lat_delta = (radius_km / EARTH_RADIUS_KM).to_degrees();

    // Longitude degrees shrink with latitude; near the poles the box
    // simply covers the full range.
    let cos_lat = center.lat.to_radians().cos();
    let lng_delta = if cos_lat > 1e-6 {
        lat_delta / cos_lat
    } else {
        360.0
    };

    BoundingBox {
        min_lat: (center.lat - lat_delta).max(-90.0),
        max_lat: (center.lat + lat_delta).min(90.0),
        min_lng: (center.lng - lng_delta).max(-180.0),
        max_lng: (center.lng + lng_delta).min(180.0),
    }
}

/// Exact radius cut and distance ordering over fetched candidates.
///
/// The boundary is inclusive (`distance <= radius`), and ties fall back to
/// the non-geo default ordering: has-photo first, then newest id.
pub fn filter_and_sort(
    center: GeoPoint,
    radius_km: f64,
    rows: Vec<BuildingRow>,
) -> Vec<(BuildingRow, f64)> {
    let mut hits: Vec<(BuildingRow, f64)> = rows
        .into_iter()
        .filter_map(|row| {
            let point = candidate_point(row.lat, row.lng)?;
            Some((row, haversine_km(center, point)))
        })
        .filter(|(_, distance)| *distance <= radius_km)
        .collect();

    hits.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.0.has_photo().cmp(&a.0.has_photo()))
            .then_with(|| b.0.building_id.cmp(&a.0.building_id))
    });

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_at(id: i64, lat: Option<f64>, lng: Option<f64>, photo: bool) -> BuildingRow {
        BuildingRow {
            building_id: id,
            uid: format!("b{}", id),
            slug: None,
            title: format!("building {}", id),
            title_en: None,
            location: None,
            location_en: None,
            prefecture: None,
            prefecture_en: None,
            building_type: None,
            building_type_en: None,
            completion_year: None,
            lat,
            lng,
            thumbnail_url: photo.then(|| "x.jpg".to_string()),
            youtube_url: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // Tokyo station to Osaka station is roughly 400 km
        let tokyo = GeoPoint { lat: 35.6812, lng: 139.7671 };
        let osaka = GeoPoint { lat: 34.7025, lng: 135.4959 };
        let d = haversine_km(tokyo, osaka);
        assert!((d - 400.0).abs() < 10.0, "got {}", d);

        let zero = haversine_km(tokyo, tokyo);
        assert!(zero.abs() < 1e-9);
    }

    #[test]
    fn test_radius_scenario_three_candidates() {
        // Pure-latitude offsets so the distances come out at 1, 4.9 and
        // 5.1 km from the center.
        let center = GeoPoint { lat: 35.1496, lng: 137.0355 };
        let km = (1.0_f64 / EARTH_RADIUS_KM).to_degrees();
        let rows = vec![
            row_at(1, Some(center.lat + 5.1 * km), Some(center.lng), false),
            row_at(2, Some(center.lat + 1.0 * km), Some(center.lng), false),
            row_at(3, Some(center.lat + 4.9 * km), Some(center.lng), false),
        ];

        let hits = filter_and_sort(center, 5.0, rows);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.building_id, 2);
        assert_eq!(hits[1].0.building_id, 3);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert!((hits[1].1 - 4.9).abs() < 1e-6);
        // non-decreasing in distance
        assert!(hits[0].1 <= hits[1].1);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let center = GeoPoint { lat: 35.0, lng: 137.0 };
        let point = GeoPoint { lat: 35.02, lng: 137.0 };
        let exact = haversine_km(center, point);

        let hits = filter_and_sort(center, exact, vec![row_at(1, Some(point.lat), Some(point.lng), false)]);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_bad_coordinates_excluded() {
        let center = GeoPoint { lat: 35.0, lng: 137.0 };
        let rows = vec![
            row_at(1, None, Some(137.0), false),
            row_at(2, Some(0.0), Some(0.0), false),
            row_at(3, Some(135.0), Some(137.0), false), // out of range
            row_at(4, Some(35.001), Some(137.0), false),
        ];
        let hits = filter_and_sort(center, 100.0, rows);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.building_id, 4);
    }

    #[test]
    fn test_tie_break_matches_default_ordering() {
        let center = GeoPoint { lat: 35.0, lng: 137.0 };
        // identical coordinates, so identical distances
        let rows = vec![
            row_at(10, Some(35.01), Some(137.0), false),
            row_at(11, Some(35.01), Some(137.0), true),
            row_at(12, Some(35.01), Some(137.0), false),
        ];
        let hits = filter_and_sort(center, 10.0, rows);
        let ids: Vec<i64> = hits.iter().map(|(r, _)| r.building_id).collect();
        // photo first, then descending id
        assert_eq!(ids, vec![11, 12, 10]);
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let center = GeoPoint { lat: 35.1496, lng: 137.0355 };
        let bbox = bounding_box(center, 5.0);
        let km = (1.0_f64 / EARTH_RADIUS_KM).to_degrees();
        // a point 4.9 km north sits inside the box
        assert!(center.lat + 4.9 * km <= bbox.max_lat);
        assert!(center.lat - 4.9 * km >= bbox.min_lat);
        assert!(bbox.min_lng < center.lng && center.lng < bbox.max_lng);
    }
}
