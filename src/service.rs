//! Request orchestration for the three data endpoints
//!
//! Each operation composes the same pipeline: validate and normalize the
//! input, consult the cache, make at most two sequential upstream calls,
//! shape the raw payload, and populate the cache only on a fully validated
//! success. Errors from the providers surface through the
//! [`SkycastError`](crate::error::SkycastError) taxonomy.

use crate::cache::TtlCache;
use crate::config::SkycastConfig;
use crate::countries;
use crate::error::SkycastError;
use crate::geocoding::{self, GeoCandidate, GeoClient, PAGE_SIZE, SeenSet};
use crate::location::{self, LocationKey};
use crate::upstream::UpstreamClient;
use crate::weather::{self, ForecastReport, WeatherClient, WeatherSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared application state: provider clients plus the two caches
pub struct WeatherService {
    geo: GeoClient,
    weather: WeatherClient,
    search_cache: TtlCache<Vec<GeoCandidate>>,
    forecast_cache: TtlCache<ForecastReport>,
}

impl WeatherService {
    /// Build the service from configuration
    pub fn new(config: &SkycastConfig) -> Result<Self, SkycastError> {
        let http = Arc::new(UpstreamClient::new(Duration::from_secs(
            config.provider.timeout_seconds,
        ))?);
        let ttl = Duration::from_secs(config.cache.ttl_seconds);
        Ok(Self {
            geo: GeoClient::new(
                Arc::clone(&http),
                config.provider.geo_base_url.clone(),
                config.provider.api_key.clone(),
            ),
            weather: WeatherClient::new(
                http,
                config.provider.weather_base_url.clone(),
                config.provider.api_key.clone(),
            ),
            search_cache: TtlCache::new(config.cache.search_capacity, ttl),
            forecast_cache: TtlCache::new(config.cache.forecast_capacity, ttl),
        })
    }

    /// Search for locations matching a free-text query and/or country code
    ///
    /// An invalid country code yields an empty result, not an error; so
    /// does a request with neither query nor country. Results are
    /// deduplicated, sorted by name, paginated at [`PAGE_SIZE`], and cached
    /// per `query|country|page`. A country-only search that comes back
    /// empty is retried once with the country's fallback city; a failed
    /// fallback degrades to an empty result.
    pub async fn search(
        &self,
        query: &str,
        country: &str,
        page: usize,
    ) -> Result<Vec<GeoCandidate>, SkycastError> {
        let query = query.trim().to_lowercase();
        let country = country.trim().to_uppercase();
        let page = page.max(1);
        info!("Search query: q='{query}', country='{country}', page={page}");

        if !country.is_empty() && !countries::is_valid(&country) {
            warn!("Invalid country code: {country}");
            return Ok(Vec::new());
        }

        let provider_query = if !query.is_empty() && !country.is_empty() {
            format!("{query},,{country}")
        } else if !query.is_empty() {
            query.clone()
        } else if !country.is_empty() {
            format!(",,{country}")
        } else {
            return Ok(Vec::new());
        };

        let cache_key = format!("{query}|{country}|{page}");
        if let Some(cached) = self.search_cache.get(&cache_key).await {
            info!("Returning cached search results for {cache_key}");
            return Ok(cached);
        }

        let mut seen = SeenSet::new();
        let results = match self.geo.direct(&provider_query, PAGE_SIZE).await {
            Ok(raw) => {
                let mut results = geocoding::dedup_and_map(raw, &mut seen);
                geocoding::sort_by_name(&mut results);
                let mut page_results = geocoding::paginate(results, page);

                // Country-only search with an empty page: retry once with
                // the country's well-known city and merge anything new
                if page_results.is_empty() && query.is_empty() {
                    if let Some(city) = geocoding::fallback_city(&country) {
                        info!("No results for country {country}, trying fallback city: {city}");
                        match self.fallback_search(&country, city, &mut seen).await {
                            Ok(extra) => page_results.extend(extra),
                            Err(err) => {
                                warn!("Fallback search failed: {err}");
                                return Ok(Vec::new());
                            }
                        }
                    }
                }
                geocoding::sort_by_name(&mut page_results);
                page_results
            }
            // The provider reports "no match" as a 404
            Err(SkycastError::NotFound { .. }) => {
                warn!("No cities found for query: q='{query}', country='{country}', page={page}");
                let Some(city) = (query.is_empty())
                    .then(|| geocoding::fallback_city(&country))
                    .flatten()
                else {
                    return Ok(Vec::new());
                };
                info!("Retrying with fallback city: {city}");
                match self.fallback_search(&country, city, &mut seen).await {
                    Ok(mut results) => {
                        geocoding::sort_by_name(&mut results);
                        results
                    }
                    Err(err) => {
                        warn!("Fallback search failed: {err}");
                        return Ok(Vec::new());
                    }
                }
            }
            Err(err) => return Err(err),
        };

        self.search_cache.put(&cache_key, results.clone()).await;
        info!(
            "Search returned {} unique cities for page {page}",
            results.len()
        );
        Ok(results)
    }

    async fn fallback_search(
        &self,
        country: &str,
        city: &str,
        seen: &mut SeenSet,
    ) -> Result<Vec<GeoCandidate>, SkycastError> {
        let raw = self
            .geo
            .direct(&format!("{city},,{country}"), PAGE_SIZE)
            .await?;
        Ok(geocoding::dedup_and_map(raw, seen))
    }

    /// Current conditions for a `city,CC` location (never cached)
    pub async fn current_weather(&self, location: &str) -> Result<WeatherSnapshot, SkycastError> {
        let key = Self::normalize_checked(location)?;
        let resolved = self.geocode_first(&key, location).await?;
        let payload = self
            .weather
            .current(resolved.lat, resolved.lon)
            .await
            .map_err(|err| Self::rename_not_found(err, location))?;
        let snapshot = weather::format_current(&payload, resolved.city, &resolved.country)?;
        info!("Returning weather for {location}");
        Ok(snapshot)
    }

    /// Aggregated 5-day forecast for a `city,CC` location
    ///
    /// Cached per normalized location; only a fully formatted report is
    /// stored.
    pub async fn forecast(&self, location: &str) -> Result<ForecastReport, SkycastError> {
        let key = Self::normalize_checked(location)?;
        let cache_key = format!("forecast_{key}");
        if let Some(cached) = self.forecast_cache.get(&cache_key).await {
            info!("Returning cached forecast for {cache_key}");
            return Ok(cached);
        }

        let resolved = self.geocode_first(&key, location).await?;
        let payload = self
            .weather
            .forecast(resolved.lat, resolved.lon)
            .await
            .map_err(|err| Self::rename_not_found(err, location))?;
        let days = weather::aggregate_forecast(&payload).map_err(|_| {
            SkycastError::upstream_invalid(format!("Invalid forecast data for \"{location}\""))
        })?;

        let report = ForecastReport {
            city: resolved.city,
            country: countries::resolve_name(&resolved.country),
            forecast: days,
        };
        self.forecast_cache.put(&cache_key, report.clone()).await;
        info!("Returning forecast for {location}");
        Ok(report)
    }

    /// Run both input checks and report which one rejected the input
    fn normalize_checked(location: &str) -> Result<LocationKey, SkycastError> {
        if !location::validate_location(location) {
            return Err(SkycastError::validation(format!(
                "Invalid location format: \"{location}\". Expected format: \"city,country_code\" \
                 (e.g., \"Tallinn,EE\"). City may contain letters, spaces, hyphens, and special \
                 characters."
            )));
        }
        location::normalize_location(location).ok_or_else(|| {
            SkycastError::validation(format!(
                "Invalid location after normalization: \"{location}\". Ensure city name is valid \
                 and country code exists."
            ))
        })
    }

    /// Resolve a normalized location to coordinates via one geocoding call
    async fn geocode_first(
        &self,
        key: &LocationKey,
        location: &str,
    ) -> Result<ResolvedPlace, SkycastError> {
        let raw = self
            .geo
            .direct(&key.to_string(), 1)
            .await
            .map_err(|err| Self::rename_not_found(err, location))?;
        let Some(first) = raw.into_iter().next() else {
            warn!("Location not found in geocoding: {key}");
            return Err(SkycastError::not_found(format!(
                "Location \"{location}\" not found"
            )));
        };
        let (Some(lat), Some(lon), Some(city)) = (first.lat, first.lon, first.name) else {
            return Err(SkycastError::upstream_invalid(
                "Geocoding entry missing name or coordinates",
            ));
        };
        Ok(ResolvedPlace {
            lat,
            lon,
            city,
            country: first
                .country
                .unwrap_or_else(|| countries::UNRESOLVED.to_string()),
        })
    }

    /// Attach the caller's location text to provider 404s
    fn rename_not_found(err: SkycastError, location: &str) -> SkycastError {
        match err {
            SkycastError::NotFound { .. } => {
                SkycastError::not_found(format!("Location \"{location}\" not found"))
            }
            other => other,
        }
    }
}

struct ResolvedPlace {
    lat: f64,
    lon: f64,
    city: String,
    country: String,
}
