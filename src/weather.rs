//! Weather provider client and payload formatting
//!
//! The provider's current-conditions and 5-day/3-hour forecast payloads are
//! validated strictly before anything is returned or cached: a payload
//! missing required sections or carrying the wrong numeric kinds is logged
//! in full and rejected. Forecast samples are aggregated into one entry per
//! calendar day.

use crate::countries;
use crate::error::SkycastError;
use crate::upstream::UpstreamClient;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Validated, simplified current-weather shape returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub city: String,
    /// Resolved country display name
    pub country: String,
    pub temp: f64,
    pub feels_like: f64,
    /// Condition group label (e.g. "Clouds")
    pub weather: String,
    pub description: String,
    pub humidity: i64,
    pub wind_speed: f64,
    pub icon: String,
    pub lat: f64,
    pub lon: f64,
}

/// One aggregated forecast day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastDay {
    /// Calendar date, `YYYY-MM-DD`, server-local time zone
    pub date: String,
    /// Mean of the day's 3-hour samples, rounded to 1 decimal
    pub temp: f64,
    /// Most frequent condition description among the day's samples
    pub description: String,
    /// Most frequent icon code among the day's samples
    pub icon: String,
}

/// Aggregated multi-day forecast returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastReport {
    pub city: String,
    /// Resolved country display name
    pub country: String,
    pub forecast: Vec<ForecastDay>,
}

/// Client for the weather provider's current and forecast endpoints
pub struct WeatherClient {
    http: Arc<UpstreamClient>,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(http: Arc<UpstreamClient>, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Current conditions at the given coordinates (metric units)
    pub async fn current(&self, lat: f64, lon: f64) -> Result<Value, SkycastError> {
        tracing::debug!("Weather request: lat={lat}, lon={lon}");
        let url = format!(
            "{}/weather?lat={lat}&lon={lon}&appid={}&units=metric&lang=en",
            self.base_url, self.api_key
        );
        self.http.get_json(&url).await
    }

    /// 5-day/3-hour forecast at the given coordinates (metric units)
    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<Value, SkycastError> {
        tracing::debug!("Forecast request: lat={lat}, lon={lon}");
        let url = format!(
            "{}/forecast?lat={lat}&lon={lon}&appid={}&units=metric&lang=en",
            self.base_url, self.api_key
        );
        self.http.get_json(&url).await
    }
}

struct CurrentFields {
    temp: f64,
    feels_like: f64,
    humidity: i64,
    wind_speed: f64,
    lat: f64,
    lon: f64,
    weather: String,
    description: String,
    icon: String,
}

/// Extract and validate the fields of a current-weather payload
///
/// Fails when a required section (name, sys, main, weather, wind, coord) is
/// absent, a numeric field has the wrong kind (humidity must be an
/// integer), or the condition list is empty or missing its description.
fn project_current(data: &Value) -> Option<CurrentFields> {
    data.get("name")?;
    data.get("sys")?;

    let main = data.get("main")?;
    let temp = main.get("temp")?.as_f64()?;
    let feels_like = main.get("feels_like")?.as_f64()?;
    // as_i64 is None for JSON floats, which is exactly the check we want
    let humidity = main.get("humidity")?.as_i64()?;

    let wind_speed = data.get("wind")?.get("speed")?.as_f64()?;

    let coord = data.get("coord")?;
    let lat = coord.get("lat")?.as_f64()?;
    let lon = coord.get("lon")?.as_f64()?;

    let first = data.get("weather")?.as_array()?.first()?;
    let description = first
        .get("description")?
        .as_str()
        .filter(|d| !d.is_empty())?
        .to_string();
    let weather = first.get("main")?.as_str()?.to_string();
    let icon = first.get("icon")?.as_str()?.to_string();

    Some(CurrentFields {
        temp,
        feels_like,
        humidity,
        wind_speed,
        lat,
        lon,
        weather,
        description,
        icon,
    })
}

/// Project a validated current-weather payload into a [`WeatherSnapshot`]
///
/// `city` and `country_code` come from the geocoding step; the payload is
/// rejected (never cached, never returned) when validation fails.
pub fn format_current(
    payload: &Value,
    city: String,
    country_code: &str,
) -> Result<WeatherSnapshot, SkycastError> {
    let Some(fields) = project_current(payload) else {
        tracing::error!("Invalid weather payload: {payload}");
        return Err(SkycastError::upstream_invalid(format!(
            "Invalid weather data for \"{city}\""
        )));
    };

    Ok(WeatherSnapshot {
        country: countries::resolve_name(country_code),
        city,
        temp: fields.temp,
        feels_like: fields.feels_like,
        weather: fields.weather,
        description: fields.description,
        humidity: fields.humidity,
        wind_speed: fields.wind_speed,
        icon: fields.icon,
        lat: fields.lat,
        lon: fields.lon,
    })
}

#[derive(Default)]
struct DayBucket {
    temps: Vec<f64>,
    descriptions: Vec<String>,
    icons: Vec<String>,
}

struct Sample {
    date: String,
    temp: f64,
    description: String,
    icon: String,
}

fn project_sample(entry: &Value) -> Option<Sample> {
    let timestamp = entry.get("dt")?.as_i64()?;
    let date = Local
        .timestamp_opt(timestamp, 0)
        .single()?
        .format("%Y-%m-%d")
        .to_string();
    let temp = entry.get("main")?.get("temp")?.as_f64()?;
    let first = entry.get("weather")?.as_array()?.first()?;
    let description = first.get("description")?.as_str()?.to_string();
    let icon = first.get("icon")?.as_str()?.to_string();
    Some(Sample {
        date,
        temp,
        description,
        icon,
    })
}

/// Most frequent item; ties go to the one seen first
fn most_frequent(items: &[String]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.as_str()).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    items
        .iter()
        .find(|item| counts.get(item.as_str()) == Some(&max))
        .cloned()
        .unwrap_or_default()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate a raw forecast payload into one entry per calendar day
///
/// Samples are grouped by the local calendar date of their timestamp; days
/// are emitted in the order their dates first appear in the sample
/// sequence. Each day carries the mean temperature (rounded to 1 decimal)
/// and the most frequent description and icon.
pub fn aggregate_forecast(payload: &Value) -> Result<Vec<ForecastDay>, SkycastError> {
    let Some(samples) = payload.get("list").and_then(Value::as_array) else {
        tracing::error!("Forecast payload missing sample list: {payload}");
        return Err(SkycastError::upstream_invalid("Invalid forecast data"));
    };

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, DayBucket> = HashMap::new();
    for entry in samples {
        let Some(sample) = project_sample(entry) else {
            tracing::error!("Invalid forecast sample: {entry}");
            return Err(SkycastError::upstream_invalid("Invalid forecast data"));
        };
        let bucket = buckets.entry(sample.date.clone()).or_insert_with(|| {
            order.push(sample.date.clone());
            DayBucket::default()
        });
        bucket.temps.push(sample.temp);
        bucket.descriptions.push(sample.description);
        bucket.icons.push(sample.icon);
    }

    let mut days = Vec::with_capacity(order.len());
    for date in order {
        let Some(bucket) = buckets.remove(&date) else {
            continue;
        };
        let mean = bucket.temps.iter().sum::<f64>() / bucket.temps.len() as f64;
        days.push(ForecastDay {
            date,
            temp: round1(mean),
            description: most_frequent(&bucket.descriptions),
            icon: most_frequent(&bucket.icons),
        });
    }
    Ok(days)
}
