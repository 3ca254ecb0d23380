//! skycast - location lookup and weather data proxy
//!
//! This library resolves free-text `city,COUNTRY_CODE` queries through an
//! external geocoding provider, fetches current or multi-day forecast
//! weather, and serves normalized, validated, cached results over a small
//! JSON API.

pub mod cache;
pub mod config;
pub mod countries;
pub mod error;
pub mod geocoding;
pub mod location;
pub mod ratelimit;
pub mod routes;
pub mod service;
pub mod upstream;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::TtlCache;
pub use config::SkycastConfig;
pub use error::SkycastError;
pub use geocoding::GeoCandidate;
pub use location::LocationKey;
pub use service::WeatherService;
pub use weather::{ForecastDay, ForecastReport, WeatherSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
