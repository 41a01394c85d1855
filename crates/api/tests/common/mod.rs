#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use formguard_api::config::ServerConfig;
use formguard_api::router::build_app_router;
use formguard_api::state::AppState;
use formguard_core::config::ValidatorConfig;
use formguard_core::validation::evaluator::Validator;
use formguard_core::validation::lookup::InMemoryPresence;
use formguard_core::validation::network::KnownHosts;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        db_max_connections: 1,
    }
}

/// Validator backed by an in-memory `validation_unique` table (AR, TX, NY)
/// and a fixed host list for `active_url`.
pub fn test_validator() -> Validator {
    let store = InMemoryPresence::new()
        .with_row("validation_unique", [("id", "1"), ("code", "AR")])
        .with_row("validation_unique", [("id", "2"), ("code", "TX")])
        .with_row("validation_unique", [("id", "3"), ("code", "NY")]);

    Validator::new(ValidatorConfig::default())
        .with_presence(Arc::new(store))
        .with_url_probe(Arc::new(KnownHosts::new(["google.com"])))
}

/// Build the full application router (same middleware stack as `main.rs`).
pub fn build_test_app() -> Router {
    let config = test_config();
    let state = AppState {
        validator: Arc::new(test_validator()),
        config: Arc::new(config.clone()),
        pool: None,
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
