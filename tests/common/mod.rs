//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use tower::ServiceExt;

use greet_service::dispatch::AffineMode;
use greet_service::state::SharedValue;
use greet_service::{build_app, HttpServer, ServiceConfig};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub fn test_config(mode: AffineMode) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.dispatch.affine_mode = mode;
    config.timeouts.request_secs = 5;
    config
}

/// Build the full service in-process.
pub fn start_app(config: &ServiceConfig) -> (axum::Router, Arc<SharedValue<String>>) {
    let app = build_app(config).expect("app should build");
    let server = HttpServer::new(config, app.router);
    (server.app(), app.greeting)
}

/// Send one request through the axum app without a socket.
pub async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get(app: &axum::Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn put(app: &axum::Router, uri: &str, body: &str) -> TestResponse {
    send(app, Method::PUT, uri, Some(body)).await
}
