//! HTTP handlers for the public endpoints

use crate::countries::{self, Country};
use crate::error::SkycastError;
use crate::geocoding::GeoCandidate;
use crate::service::WeatherService;
use crate::weather::{ForecastReport, WeatherSnapshot};
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub country: String,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    pub location: Option<String>,
}

/// `GET /search?q&country&page`
pub async fn search(
    State(service): State<Arc<WeatherService>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<GeoCandidate>>, SkycastError> {
    let results = service
        .search(&params.q, &params.country, params.page)
        .await?;
    Ok(Json(results))
}

/// `GET /weather?location`
pub async fn weather(
    State(service): State<Arc<WeatherService>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<WeatherSnapshot>, SkycastError> {
    let location = require_location(params.location.as_deref())?;
    Ok(Json(service.current_weather(location).await?))
}

/// `GET /forecast?location`
pub async fn forecast(
    State(service): State<Arc<WeatherService>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<ForecastReport>, SkycastError> {
    let location = require_location(params.location.as_deref())?;
    Ok(Json(service.forecast(location).await?))
}

/// `GET /countries`: full ISO table as `{code, name}`, sorted by name
pub async fn country_list() -> Json<&'static [Country]> {
    let countries = countries::all();
    tracing::info!("Returning {} countries", countries.len());
    Json(countries)
}

fn require_location(location: Option<&str>) -> Result<&str, SkycastError> {
    match location {
        Some(location) if !location.is_empty() => Ok(location),
        _ => {
            tracing::warn!("Location parameter missing");
            Err(SkycastError::validation("Location parameter required"))
        }
    }
}
