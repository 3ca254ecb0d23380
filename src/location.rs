//! Location input validation and normalization
//!
//! Callers submit free text in the form `city,COUNTRY_CODE`. Both checks
//! here run before any upstream call: [`validate_location`] is the loose
//! shape pre-check, [`normalize_location`] produces the canonical
//! [`LocationKey`] used as cache key and provider query.

use crate::countries;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SHAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^,]+,[A-Z]{2}$").expect("location shape pattern is valid")
});
// The provider echoes Estonian queries with a trailing "linn" ("city"),
// which then fails the round trip. Strip the standalone word.
static CITY_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blinn\b").expect("city word pattern is valid"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static HYPHEN_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("hyphen run pattern is valid"));

/// Canonical location key: hyphen-joined city slug plus alpha-2 country code
///
/// Renders as `city-slug,CC` (e.g. `new-york,US`). Never outlives the
/// request that built it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationKey {
    /// Hyphen-joined, whitespace-collapsed city token (length >= 2)
    pub city: String,
    /// Validated ISO 3166-1 alpha-2 country code, upper case
    pub country: String,
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.city, self.country)
    }
}

/// Loose pre-check on raw location input
///
/// Rejects empty input, anything containing the literal phrase
/// "unknown city", input that does not match `<city>,<CC>` with an
/// upper-case two-letter code, a city shorter than two characters, and
/// unknown country codes.
#[must_use]
pub fn validate_location(location: &str) -> bool {
    if location.is_empty() {
        tracing::warn!("Location is empty");
        return false;
    }
    if location.to_lowercase().contains("unknown city") {
        tracing::warn!("Location contains 'unknown city': {location}");
        return false;
    }
    if !SHAPE_RE.is_match(location) {
        tracing::warn!("Location does not match expected format 'city,country_code': {location}");
        return false;
    }
    let Some((city, country_code)) = location.split_once(',') else {
        return false;
    };
    if city.trim().chars().count() < 2 {
        tracing::warn!("City name too short: {city}");
        return false;
    }
    if !countries::is_valid(country_code.trim()) {
        tracing::warn!("Invalid country code: {country_code}");
        return false;
    }
    true
}

/// Normalize raw `city,country_code` input into a [`LocationKey`]
///
/// Splits on the single comma, trims both parts, upper-cases the country,
/// strips the standalone word "linn" from the city, collapses whitespace
/// runs, hyphenates, and collapses/trims hyphen runs. Returns `None` when
/// the country code is unknown or the city token ends up shorter than two
/// characters.
#[must_use]
pub fn normalize_location(location: &str) -> Option<LocationKey> {
    let mut parts = location.split(',');
    let (Some(city), Some(country_code), None) = (parts.next(), parts.next(), parts.next()) else {
        tracing::warn!("Location must be in 'city,country_code' format, got: {location}");
        return None;
    };

    let country_code = country_code.trim().to_uppercase();
    let city = city.trim();
    let city = CITY_WORD_RE.replace_all(city, "");
    let city = WHITESPACE_RE.replace_all(city.trim(), " ");
    let city = city.replace(' ', "-");
    let city = HYPHEN_RUN_RE.replace_all(&city, "-");
    let city = city.trim_matches('-').to_string();

    if !countries::is_valid(&country_code) {
        tracing::warn!("Invalid country code: {country_code}");
        return None;
    }
    if city.chars().count() < 2 {
        tracing::warn!("City name too short after normalization: {city}");
        return None;
    }

    let key = LocationKey {
        city,
        country: country_code,
    };
    tracing::info!("Normalized location: {location} -> {key}");
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Tallinn,EE", true)]
    #[case("New York,US", true)]
    #[case("Tallinn", false)] // no comma
    #[case("X,EE", false)] // city too short
    #[case("Tallinn,Estonia", false)] // code not two letters
    #[case("Tallinn,ee", false)] // code not upper case
    #[case("Tallinn,ZZ", false)] // code not in the table
    #[case("unknown city,EE", false)]
    #[case("Unknown City,EE", false)]
    #[case("", false)]
    fn test_validate_location(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(validate_location(input), expected);
    }

    #[rstest]
    #[case("Tallinn,EE", "Tallinn,EE")]
    #[case("  Tallinn , ee ", "Tallinn,EE")]
    #[case("New York,US", "New-York,US")]
    #[case("New   York,US", "New-York,US")]
    #[case("Tartu linn,EE", "Tartu,EE")]
    #[case("Tartu LINN,EE", "Tartu,EE")]
    #[case("Kohtla - Järve,EE", "Kohtla-Järve,EE")]
    fn test_normalize_location(#[case] input: &str, #[case] expected: &str) {
        let key = normalize_location(input).expect("input should normalize");
        assert_eq!(key.to_string(), expected);
    }

    #[rstest]
    #[case("Tallinn")] // no comma
    #[case("a,b,c")] // too many commas
    #[case("X,EE")] // city too short
    #[case("linn,EE")] // nothing left after stripping the city word
    #[case("Tallinn,ZZ")] // unknown country
    #[case("--,EE")] // only hyphens
    fn test_normalize_location_rejects(#[case] input: &str) {
        assert_eq!(normalize_location(input), None);
    }

    #[test]
    fn test_normalized_city_has_no_whitespace_or_edge_hyphens() {
        for input in ["  New   York , us", "San  Francisco linn ,US", "-Tartu-,EE"] {
            let key = normalize_location(input).expect("input should normalize");
            assert!(!key.city.contains(char::is_whitespace), "{}", key.city);
            assert!(!key.city.starts_with('-') && !key.city.ends_with('-'));
            assert_eq!(key.country, key.country.to_uppercase());
        }
    }
}
