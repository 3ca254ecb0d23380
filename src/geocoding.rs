//! Geocoding provider client and result shaping
//!
//! The provider's direct-lookup endpoint returns raw place entries with
//! inconsistent country fields and frequent duplicates. This module turns
//! them into a unique, alphabetically sorted, paginated candidate list and
//! carries the small fallback-city table used when a country-only search
//! comes back empty.

use crate::countries;
use crate::error::SkycastError;
use crate::upstream::UpstreamClient;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Fixed page size for search results
pub const PAGE_SIZE: usize = 100;

/// Per-country backup city for country-only searches that return nothing
const FALLBACK_CITIES: &[(&str, &str)] = &[
    ("AL", "Tirana"),
    ("EE", "Tallinn"),
    ("US", "New York"),
    ("AS", "Pago Pago"),
    ("BZ", "Belize City"),
    ("BS", "Nassau"),
];

/// Backup city for `country`, if one is configured
#[must_use]
pub fn fallback_city(country: &str) -> Option<&'static str> {
    FALLBACK_CITIES
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, city)| *city)
}

/// Raw geocoding entry as the provider sends it
///
/// Every field is optional on the wire; [`dedup_and_map`] drops entries
/// missing the parts we need.
#[derive(Debug, Deserialize)]
pub struct RawGeoEntry {
    pub name: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub state: Option<String>,
}

/// One resolved place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoCandidate {
    pub name: String,
    /// ISO 3166-1 alpha-2 code
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// Administrative region label, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Identity of a place for deduplication: lower-cased name, country code,
/// and exact coordinate bits
pub type SeenSet = HashSet<(String, String, u64, u64)>;

/// Convert raw entries into unique candidates
///
/// Drops entries missing name, country, or coordinates. Country fields
/// longer than two characters go through the fuzzy country lookup and the
/// entry is dropped when resolution fails. `seen` carries dedup state
/// across calls so a fallback re-query only contributes new places.
pub fn dedup_and_map(entries: Vec<RawGeoEntry>, seen: &mut SeenSet) -> Vec<GeoCandidate> {
    let mut results = Vec::new();
    for entry in entries {
        let (Some(name), Some(raw_country)) = (entry.name, entry.country) else {
            continue;
        };
        if name.is_empty() || raw_country.is_empty() {
            continue;
        }
        let country = if raw_country.chars().count() > 2 {
            let code = countries::resolve_code(&raw_country);
            if code == countries::UNRESOLVED {
                continue;
            }
            code
        } else {
            raw_country
        };
        let (Some(lat), Some(lon)) = (entry.lat, entry.lon) else {
            continue;
        };
        let key = (name.to_lowercase(), country.clone(), lat.to_bits(), lon.to_bits());
        if !seen.insert(key) {
            continue;
        }
        results.push(GeoCandidate {
            name,
            country,
            lat,
            lon,
            state: entry.state,
        });
    }
    results
}

/// Sort candidates alphabetically by name (default string order)
pub fn sort_by_name(results: &mut [GeoCandidate]) {
    results.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Slice `results` into the 1-based page of [`PAGE_SIZE`] entries
#[must_use]
pub fn paginate(results: Vec<GeoCandidate>, page: usize) -> Vec<GeoCandidate> {
    let page = page.max(1);
    results
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect()
}

/// Client for the geocoding provider's direct-lookup endpoint
pub struct GeoClient {
    http: Arc<UpstreamClient>,
    base_url: String,
    api_key: String,
}

impl GeoClient {
    pub fn new(http: Arc<UpstreamClient>, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Direct lookup: free-text `query` (`city,,CC`, bare city, or bare
    /// country) with a result limit
    pub async fn direct(&self, query: &str, limit: usize) -> Result<Vec<RawGeoEntry>, SkycastError> {
        tracing::debug!("Geocoding request: q='{query}', limit={limit}");
        let url = format!(
            "{}/direct?q={}&limit={}&appid={}&lang=en",
            self.base_url,
            urlencoding::encode(query),
            limit,
            self.api_key
        );
        self.http.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, country: &str, lat: f64, lon: f64, state: Option<&str>) -> RawGeoEntry {
        RawGeoEntry {
            name: Some(name.to_string()),
            country: Some(country.to_string()),
            lat: Some(lat),
            lon: Some(lon),
            state: state.map(str::to_string),
        }
    }

    #[test]
    fn test_dedup_ignores_region_label() {
        // Same (name-lower, country, lat, lon), different state: one result
        let entries = vec![
            raw("Tallinn", "EE", 59.437, 24.754, Some("Harjumaa")),
            raw("tallinn", "EE", 59.437, 24.754, None),
        ];
        let mut seen = SeenSet::new();
        let results = dedup_and_map(entries, &mut seen);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].state.as_deref(), Some("Harjumaa"));
    }

    #[test]
    fn test_distinct_coordinates_are_kept() {
        let entries = vec![
            raw("Springfield", "US", 39.8, -89.6, Some("IL")),
            raw("Springfield", "US", 42.1, -72.6, Some("MA")),
        ];
        let mut seen = SeenSet::new();
        assert_eq!(dedup_and_map(entries, &mut seen).len(), 2);
    }

    #[test]
    fn test_long_country_field_is_resolved() {
        let entries = vec![raw("Tallinn", "Estonia", 59.437, 24.754, None)];
        let mut seen = SeenSet::new();
        let results = dedup_and_map(entries, &mut seen);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].country, "EE");
    }

    #[test]
    fn test_unresolvable_country_is_dropped() {
        let entries = vec![raw("Somewhere", "Atlantisland", 0.0, 0.0, None)];
        let mut seen = SeenSet::new();
        assert!(dedup_and_map(entries, &mut seen).is_empty());
    }

    #[test]
    fn test_incomplete_entries_are_dropped() {
        let entries = vec![
            RawGeoEntry {
                name: None,
                country: Some("EE".into()),
                lat: Some(1.0),
                lon: Some(2.0),
                state: None,
            },
            RawGeoEntry {
                name: Some("Tallinn".into()),
                country: None,
                lat: Some(1.0),
                lon: Some(2.0),
                state: None,
            },
            RawGeoEntry {
                name: Some("Tallinn".into()),
                country: Some("EE".into()),
                lat: None,
                lon: Some(2.0),
                state: None,
            },
        ];
        let mut seen = SeenSet::new();
        assert!(dedup_and_map(entries, &mut seen).is_empty());
    }

    #[test]
    fn test_seen_set_spans_calls() {
        let mut seen = SeenSet::new();
        let first = dedup_and_map(vec![raw("Tallinn", "EE", 59.4, 24.7, None)], &mut seen);
        assert_eq!(first.len(), 1);
        // A later fallback query returning the same place adds nothing
        let second = dedup_and_map(vec![raw("Tallinn", "EE", 59.4, 24.7, None)], &mut seen);
        assert!(second.is_empty());
    }

    #[test]
    fn test_pagination_slices_sorted_results() {
        let entries: Vec<RawGeoEntry> = (0..250)
            .rev() // provider order is not alphabetical
            .map(|i| raw(&format!("City-{i:03}"), "US", f64::from(i), 0.0, None))
            .collect();
        let mut seen = SeenSet::new();
        let mut results = dedup_and_map(entries, &mut seen);
        sort_by_name(&mut results);

        let page2 = paginate(results.clone(), 2);
        assert_eq!(page2.len(), 100);
        assert_eq!(page2.first().map(|c| c.name.as_str()), Some("City-100"));
        assert_eq!(page2.last().map(|c| c.name.as_str()), Some("City-199"));

        let page3 = paginate(results.clone(), 3);
        assert_eq!(page3.len(), 50);

        assert!(paginate(results, 4).is_empty());
    }

    #[test]
    fn test_page_zero_is_treated_as_first() {
        let mut seen = SeenSet::new();
        let results = dedup_and_map(vec![raw("Tallinn", "EE", 59.4, 24.7, None)], &mut seen);
        assert_eq!(paginate(results, 0).len(), 1);
    }

    #[test]
    fn test_fallback_city_table() {
        assert_eq!(fallback_city("EE"), Some("Tallinn"));
        assert_eq!(fallback_city("US"), Some("New York"));
        assert_eq!(fallback_city("DE"), None);
    }
}
