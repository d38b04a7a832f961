//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Collect routes at startup and reject conflicting ones
//! - Look up the best matching route for a request
//! - Invoke the bound backend, or answer 404 when nothing matches
//!
//! # Design Decisions
//! - Registration only exists on `RouterBuilder`; a built `Router` cannot change
//! - O(n) scan over routes (acceptable for typical route counts)
//! - Method must match exactly; a path match under another method is a miss

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::dispatch::HandlerBackend;
use crate::http::exchange::{PathParams, ServerRequest, ServerResponse};
use crate::routing::pattern::PathPattern;

/// Errors raised while registering routes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route {method} {pattern} conflicts with {existing}")]
    Duplicate {
        method: Method,
        pattern: String,
        existing: String,
    },
}

/// A (method, path pattern) → backend binding.
#[derive(Debug)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    backend: HandlerBackend,
}

impl Route {
    /// Method this route answers.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Compiled path pattern as registered.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Backend invoked when this route wins.
    pub fn backend(&self) -> &HandlerBackend {
        &self.backend
    }
}

/// Mutable route table, used only during startup.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<Route>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route.
    ///
    /// Fails on an invalid pattern, or when a route with the same method and
    /// pattern shape already exists.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        backend: impl Into<HandlerBackend>,
    ) -> Result<&mut Self, RouteError> {
        let pattern = PathPattern::parse(pattern)?;

        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.method == method && r.pattern.same_shape(&pattern))
        {
            return Err(RouteError::Duplicate {
                method,
                pattern: pattern.to_string(),
                existing: existing.pattern.to_string(),
            });
        }

        let backend = backend.into();
        tracing::debug!(
            method = %method,
            pattern = %pattern,
            backend = backend.name(),
            kind = backend.kind(),
            "Route registered"
        );

        self.routes.push(Route {
            method,
            pattern,
            backend,
        });
        Ok(self)
    }

    /// Add a `GET` route.
    pub fn get(
        &mut self,
        pattern: &str,
        backend: impl Into<HandlerBackend>,
    ) -> Result<&mut Self, RouteError> {
        self.register(Method::GET, pattern, backend)
    }

    /// Add a `PUT` route.
    pub fn put(
        &mut self,
        pattern: &str,
        backend: impl Into<HandlerBackend>,
    ) -> Result<&mut Self, RouteError> {
        self.register(Method::PUT, pattern, backend)
    }

    /// Freeze the table.
    pub fn build(self) -> Router {
        tracing::info!(routes = self.routes.len(), "Router built");
        Router {
            routes: self.routes,
        }
    }
}

/// What `dispatch` did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A backend was invoked for the route with this pattern.
    Routed { pattern: String, backend: String },
    /// No route matched; a 404 was sent.
    NotFound,
}

/// Immutable route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Start an empty route table.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the best route for a request and the path variables it binds.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        let mut best: Option<(&Route, PathParams)> = None;

        for route in self.routes.iter().filter(|r| &r.method == method) {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            // Strictly more specific replaces; ties keep the earlier route.
            let better = match &best {
                None => true,
                Some((current, _)) => route.pattern.specificity_cmp(&current.pattern).is_gt(),
            };
            if better {
                best = Some((route, params));
            }
        }

        best
    }

    /// Route a request to its backend and run it.
    pub async fn dispatch(&self, mut req: ServerRequest, mut res: ServerResponse) -> DispatchOutcome {
        let Some((route, params)) = self.resolve(req.method(), req.path()) else {
            tracing::warn!(
                request_id = %req.request_id(),
                method = %req.method(),
                path = %req.path(),
                "No route matched"
            );
            res.status(StatusCode::NOT_FOUND);
            if res.send_json(&json!({ "error": "Not Found" })).is_err() {
                res.send_empty();
            }
            res.complete();
            return DispatchOutcome::NotFound;
        };

        tracing::debug!(
            request_id = %req.request_id(),
            pattern = %route.pattern,
            backend = route.backend.name(),
            "Dispatching request"
        );

        req.set_params(params);
        route.backend.invoke(req, res).await;

        DispatchOutcome::Routed {
            pattern: route.pattern.to_string(),
            backend: route.backend.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ConcurrentBackend, HandlerError};
    use crate::http::exchange::{Reply, ReplyBody};

    fn tagged(tag: &'static str) -> ConcurrentBackend {
        ConcurrentBackend::new(
            tag,
            move |req: &ServerRequest, res: &mut ServerResponse| -> Result<(), HandlerError> {
                res.send_text(format!("{tag}:{}", req.param("name").unwrap_or("-")));
                Ok(())
            },
        )
    }

    async fn run(router: &Router, method: Method, path: &str) -> (DispatchOutcome, Reply) {
        let (res, pending) = ServerResponse::channel();
        let outcome = router.dispatch(ServerRequest::bare(method, path), res).await;
        (outcome, pending.wait().await)
    }

    #[tokio::test]
    async fn test_literal_beats_variable_regardless_of_order() {
        let mut builder = Router::builder();
        builder.get("/{name}", tagged("named")).unwrap();
        builder.get("/greeting", tagged("literal")).unwrap();
        let router = builder.build();

        let (_, reply) = run(&router, Method::GET, "/greeting").await;
        assert_eq!(reply.body, ReplyBody::Text("literal:-".into()));

        let (_, reply) = run(&router, Method::GET, "/Joe").await;
        assert_eq!(reply.body, ReplyBody::Text("named:Joe".into()));
    }

    #[tokio::test]
    async fn test_leftmost_literal_wins() {
        let mut builder = Router::builder();
        builder.get("/{y}/b", tagged("trailing")).unwrap();
        builder.get("/a/{x}", tagged("leading")).unwrap();
        let router = builder.build();

        // Both match /a/b; "/a/{x}" has the literal in the first position.
        let (outcome, _) = run(&router, Method::GET, "/a/b").await;
        assert_eq!(
            outcome,
            DispatchOutcome::Routed {
                pattern: "/a/{x}".into(),
                backend: "leading".into()
            }
        );
    }

    #[tokio::test]
    async fn test_no_match_is_404_without_invoking() {
        let mut builder = Router::builder();
        builder.put("/greeting", tagged("update")).unwrap();
        let router = builder.build();

        // Path matches but method does not.
        let (outcome, reply) = run(&router, Method::GET, "/greeting").await;
        assert_eq!(outcome, DispatchOutcome::NotFound);
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body, ReplyBody::Json(json!({"error": "Not Found"})));

        let (outcome, _) = run(&router, Method::PUT, "/elsewhere").await;
        assert_eq!(outcome, DispatchOutcome::NotFound);
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut builder = Router::builder();
        builder.get("/{name}", tagged("a")).unwrap();
        let err = builder.get("/{other}", tagged("b")).unwrap_err();
        assert!(matches!(err, RouteError::Duplicate { .. }));

        // Same shape under a different method is fine.
        builder.put("/{name}", tagged("c")).unwrap();
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut builder = Router::builder();
        assert!(matches!(
            builder.get("no-slash", tagged("a")),
            Err(RouteError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_resolve_extracts_params() {
        let mut builder = Router::builder();
        builder.get("/greet/{name}", tagged("named")).unwrap();
        let router = builder.build();

        let (route, params) = router.resolve(&Method::GET, "/greet/Joe").unwrap();
        assert_eq!(route.pattern().as_str(), "/greet/{name}");
        assert_eq!(params.get("name").map(String::as_str), Some("Joe"));
        assert!(router.resolve(&Method::GET, "/greet/Joe/x").is_none());
    }
}
