//! HTTP surface tests: routing, status codes, and error body shape

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use skycast::config::SkycastConfig;
use skycast::ratelimit::RateLimiter;
use skycast::service::WeatherService;
use skycast::web;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

fn test_router(max_requests_per_minute: u32) -> axum::Router {
    let config = SkycastConfig::default();
    let service = Arc::new(WeatherService::new(&config).expect("service builds"));
    let limiter = Arc::new(RateLimiter::new(max_requests_per_minute));
    web::router(service, limiter, "static")
}

fn get(uri: &str) -> Request<Body> {
    // The rate-limit middleware reads the client address from ConnectInfo,
    // which axum::serve would normally inject
    let mut request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds");
    let addr: SocketAddr = "127.0.0.1:4000".parse().expect("valid address");
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_000_000)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[tokio::test]
async fn countries_endpoint_returns_sorted_table() {
    let response = test_router(30)
        .oneshot(get("/countries"))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let countries = body.as_array().expect("array body");
    assert!(countries.len() > 200);
    let names: Vec<&str> = countries
        .iter()
        .map(|c| c["name"].as_str().expect("name field"))
        .collect();
    assert!(names.windows(2).all(|w| w[0] <= w[1]));
    assert!(
        countries
            .iter()
            .any(|c| c["code"] == "EE" && c["name"] == "Estonia")
    );
}

#[tokio::test]
async fn missing_location_parameter_is_400_with_error_body() {
    let response = test_router(30)
        .oneshot(get("/weather"))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Location parameter required");
}

#[tokio::test]
async fn malformed_location_is_400_with_descriptive_message() {
    let response = test_router(30)
        .oneshot(get("/forecast?location=Tallinn"))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("Invalid location format"));
    assert!(message.contains("Tallinn"));
}

#[tokio::test]
async fn invalid_country_search_is_empty_200() {
    let response = test_router(30)
        .oneshot(get("/search?country=ZZ"))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn over_limit_client_gets_429() {
    let router = test_router(2);
    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(get("/search?country=ZZ"))
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = router
        .oneshot(get("/search?country=ZZ"))
        .await
        .expect("request succeeds");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn countries_endpoint_is_not_rate_limited() {
    let router = test_router(1);
    for _ in 0..5 {
        let response = router
            .clone()
            .oneshot(get("/countries"))
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
