//! Country reference backed by the static ISO 3166-1 table
//!
//! Wraps `rust_iso3166` with the fuzzy name resolution the geocoding
//! provider makes necessary: it sometimes reports full country names
//! (occasionally in the local language, occasionally misspelled) where a
//! two-letter code is expected.

use serde::Serialize;
use std::sync::LazyLock;

/// Sentinel code returned when fuzzy resolution finds no match
pub const UNRESOLVED: &str = "XX";

/// Edit distance tolerated by the fuzzy lookup
const MAX_EDIT_DISTANCE: usize = 2;

/// Local-language country names the ISO table does not carry
const LOCAL_NAMES: &[(&str, &str)] = &[
    ("deutschland", "DE"),
    ("eesti", "EE"),
    ("suomi", "FI"),
    ("sverige", "SE"),
    ("norge", "NO"),
    ("danmark", "DK"),
    ("españa", "ES"),
    ("espana", "ES"),
    ("italia", "IT"),
    ("polska", "PL"),
    ("lietuva", "LT"),
    ("latvija", "LV"),
    ("magyarország", "HU"),
    ("österreich", "AT"),
    ("schweiz", "CH"),
    ("nederland", "NL"),
    ("belgië", "BE"),
    ("hellas", "GR"),
    ("türkiye", "TR"),
];

/// One `{code, name}` entry of the public country list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code
    pub code: &'static str,
    /// English display name
    pub name: &'static str,
}

static ALL_SORTED: LazyLock<Vec<Country>> = LazyLock::new(|| {
    let mut countries: Vec<Country> = rust_iso3166::ALL
        .iter()
        .map(|c| Country {
            code: c.alpha2,
            name: c.name,
        })
        .collect();
    countries.sort_by(|a, b| a.name.cmp(b.name));
    countries
});

/// Full country table, sorted by display name
pub fn all() -> &'static [Country] {
    &ALL_SORTED
}

/// True iff `code` is a known ISO 3166-1 alpha-2 code
#[must_use]
pub fn is_valid(code: &str) -> bool {
    code.len() == 2 && rust_iso3166::from_alpha2(code).is_some()
}

/// Display name for a code
///
/// `XX` maps to `"Unknown"`; an unrecognized code is echoed back unchanged.
#[must_use]
pub fn resolve_name(code: &str) -> String {
    if code == UNRESOLVED {
        return "Unknown".to_string();
    }
    rust_iso3166::from_alpha2(code)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Fuzzy-match a free-text country name to its alpha-2 code
///
/// Tries, in order: exact case-insensitive match, substring containment,
/// then bounded edit distance over both the ISO names and the
/// local-language aliases. Returns the [`UNRESOLVED`] sentinel instead of
/// erroring when nothing matches.
#[must_use]
pub fn resolve_code(name: &str) -> String {
    let query = name.trim().to_lowercase();
    if query.is_empty() {
        return UNRESOLVED.to_string();
    }

    // Exact name or alias
    for country in rust_iso3166::ALL.iter() {
        if country.name.to_lowercase() == query {
            return country.alpha2.to_string();
        }
    }
    for (alias, code) in LOCAL_NAMES {
        if *alias == query {
            return (*code).to_string();
        }
    }

    // Substring containment, both directions, for entries like
    // "Korea, Republic of" vs "republic of korea". Shortest matching name
    // wins so "united states" picks the mainland over the outlying islands.
    if query.len() >= 4 {
        let mut matched: Option<&rust_iso3166::CountryCode> = None;
        for country in rust_iso3166::ALL.iter() {
            let lower = country.name.to_lowercase();
            if lower.contains(&query) || query.contains(&lower) {
                match matched {
                    Some(m) if m.name.len() <= country.name.len() => {}
                    _ => matched = Some(country),
                }
            }
        }
        if let Some(country) = matched {
            return country.alpha2.to_string();
        }
    }

    // Bounded edit distance over names and aliases, best match wins
    let mut best: Option<(usize, &str)> = None;
    let candidates = rust_iso3166::ALL
        .iter()
        .map(|c| (c.name.to_lowercase(), c.alpha2))
        .chain(LOCAL_NAMES.iter().map(|(a, c)| ((*a).to_string(), *c)));
    for (candidate, code) in candidates {
        let distance = strsim::levenshtein(&query, &candidate);
        if distance <= MAX_EDIT_DISTANCE && best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, code));
        }
    }

    match best {
        Some((_, code)) => code.to_string(),
        None => {
            tracing::warn!("Country code not found for: {name}");
            UNRESOLVED.to_string()
        }
    }
}
