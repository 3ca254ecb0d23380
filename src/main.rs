use anyhow::Result;
use skycast::config::SkycastConfig;
use skycast::service::WeatherService;
use skycast::web;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1);
    let config = SkycastConfig::load(config_path.as_deref())?;
    if config.provider.api_key.is_empty() {
        tracing::warn!("No provider API key configured; upstream calls will be rejected");
    }

    let service = Arc::new(WeatherService::new(&config)?);
    web::run(&config, service).await
}
