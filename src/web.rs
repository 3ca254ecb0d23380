//! Router assembly and server loop

use crate::config::SkycastConfig;
use crate::ratelimit::{self, RateLimiter};
use crate::routes;
use crate::service::WeatherService;
use axum::{Router, middleware, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Build the application router
///
/// The rate limiter gates only the three data endpoints; the country list
/// and static assets stay unthrottled.
pub fn router(
    service: Arc<WeatherService>,
    limiter: Arc<RateLimiter>,
    static_dir: &str,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let data_routes = Router::new()
        .route("/search", get(routes::search))
        .route("/weather", get(routes::weather))
        .route("/forecast", get(routes::forecast))
        .layer(middleware::from_fn_with_state(
            limiter,
            ratelimit::limit_middleware,
        ))
        .with_state(service);

    Router::new()
        .merge(data_routes)
        .route("/countries", get(routes::country_list))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
}

/// Bind and serve until the process is stopped
pub async fn run(config: &SkycastConfig, service: Arc<WeatherService>) -> anyhow::Result<()> {
    let limit = if config.rate_limit.enabled {
        config.rate_limit.max_requests_per_minute
    } else {
        0
    };
    let limiter = Arc::new(RateLimiter::new(limit));
    let app = router(service, limiter, &config.server.static_dir);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "skycast listening at http://localhost:{}",
        config.server.port
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
