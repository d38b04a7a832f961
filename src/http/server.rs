//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single fallback handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener with graceful shutdown
//! - Bridge axum requests into the dispatch router and back
//!
//! # Design Decisions
//! - Path matching belongs to `routing::Router`, not axum; axum only carries bytes
//! - The handler always waits on the response slot, so deferred affine replies
//!   and blocking ones look the same to the client

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::exchange::{ServerRequest, ServerResponse};
use crate::http::request_id::{UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::routing::{DispatchOutcome, Router as DispatchRouter};

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<DispatchRouter>,
    pub max_body_size: usize,
}

/// HTTP server for the greeting service.
pub struct HttpServer {
    app: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(config: &ServiceConfig, router: DispatchRouter) -> Self {
        let state = AppState {
            router: Arc::new(router),
            max_body_size: config.limits.max_body_size,
        };
        let app = Self::build_router(config, state);
        Self { app }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The assembled axum app, for in-process callers and tests.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the request, dispatch it, and wait for the backend's reply.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
            metrics::record_request(&method, 413, "none", start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let req = ServerRequest::new(parts.method, parts.uri.path(), parts.headers, body);
    let (res, pending) = ServerResponse::channel();

    let outcome = state.router.dispatch(req, res).await;
    let reply = pending.wait().await;

    let route = match &outcome {
        DispatchOutcome::Routed { pattern, .. } => pattern.as_str(),
        DispatchOutcome::NotFound => "none",
    };
    metrics::record_request(&method, reply.status.as_u16(), route, start_time);

    reply.into_response()
}
