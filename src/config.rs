//! Configuration management for the skycast service
//!
//! Settings load from an optional TOML file overlaid with `SKYCAST_*`
//! environment variables (nested keys separated by `__`, e.g.
//! `SKYCAST_PROVIDER__API_KEY`). Everything has a default except the
//! provider credential, which must come from the file or the environment.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkycastConfig {
    /// Upstream provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Rate limit settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Upstream provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider API key, shared by the geocoding and weather endpoints
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the geocoding API
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
    /// Base URL of the weather API
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached search result pages
    #[serde(default = "default_search_capacity")]
    pub search_capacity: usize,
    /// Maximum number of cached forecast reports
    #[serde(default = "default_forecast_capacity")]
    pub forecast_capacity: usize,
    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for static assets and the landing page
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Rate limit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the per-client limit is enforced (off means fail open)
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    /// Requests allowed per client per minute on the data endpoints
    #[serde(default = "default_rate_limit")]
    pub max_requests_per_minute: u32,
}

// Default value functions
fn default_geo_base_url() -> String {
    "http://api.openweathermap.org/geo/1.0".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_search_capacity() -> usize {
    1000
}

fn default_forecast_capacity() -> usize {
    500
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_port() -> u16 {
    5001
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_rate_limit() -> u32 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            geo_base_url: default_geo_base_url(),
            weather_base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_capacity: default_search_capacity(),
            forecast_capacity: default_forecast_capacity(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            max_requests_per_minute: default_rate_limit(),
        }
    }
}

impl SkycastConfig {
    /// Load configuration from `path` (optional) and the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path.unwrap_or("skycast")).required(false))
            .add_source(Environment::with_prefix("SKYCAST").separator("__"))
            .build()
            .with_context(|| "Failed to read configuration sources")?;
        config
            .try_deserialize()
            .with_context(|| "Invalid configuration")
    }
}
