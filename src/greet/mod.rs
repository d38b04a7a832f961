//! Greeting service.
//!
//! # Routes (relative to the mount prefix)
//! ```text
//! GET /         → affine "greeting-template"  {"message": "<greeting> World!"}
//! GET /{name}   → affine "greeting-template"  {"message": "<greeting> <name>!"}
//! GET /plain    → concurrent "plain-greeting" "<greeting> World!"
//! PUT /greeting → concurrent "update-greeting" 204 | 400 {"error": ...}
//! ```
//!
//! # Design Decisions
//! - The template engine is single-threaded; both message routes share one
//!   affine backend and therefore one worker
//! - Every handler reads the same `SharedValue`; the update route is the only writer

pub mod handlers;
pub mod template;

use std::sync::Arc;

use crate::dispatch::{AffineBackend, AffineMode, ConcurrentBackend};
use crate::greet::handlers::{GreetingRenderer, PlainGreeting, UpdateGreeting};
use crate::greet::template::{TemplateEngine, TemplateError};
use crate::routing::pattern::join_path;
use crate::routing::{RouteError, RouterBuilder};
use crate::state::SharedValue;

/// Errors raised while wiring the greeting routes.
#[derive(Debug, thiserror::Error)]
pub enum GreetError {
    #[error("invalid message template: {0}")]
    Template(#[from] TemplateError),

    #[error("failed to start template worker: {0}")]
    Worker(#[from] std::io::Error),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Greeting routes and the state they share.
#[derive(Debug, Clone)]
pub struct GreetService {
    greeting: Arc<SharedValue<String>>,
    template: String,
    mode: AffineMode,
}

impl GreetService {
    /// Create the service. The template is compiled when routes are registered.
    pub fn new(greeting: Arc<SharedValue<String>>, template: impl Into<String>, mode: AffineMode) -> Self {
        Self {
            greeting,
            template: template.into(),
            mode,
        }
    }

    /// The greeting every route reads.
    pub fn greeting(&self) -> &Arc<SharedValue<String>> {
        &self.greeting
    }

    /// Register the greeting routes under `prefix`.
    pub fn register(&self, rules: &mut RouterBuilder, prefix: &str) -> Result<(), GreetError> {
        // The engine is Send but not Sync: compile here, then hand it to its worker.
        let engine = TemplateEngine::compile(&self.template)?;
        let greeting = self.greeting.clone();
        let messages = AffineBackend::spawn("greeting-template", self.mode, move || {
            GreetingRenderer::new(engine, greeting)
        })?;

        let plain = ConcurrentBackend::new("plain-greeting", PlainGreeting::new(self.greeting.clone()));
        let update = ConcurrentBackend::new("update-greeting", UpdateGreeting::new(self.greeting.clone()));

        rules
            .get(&join_path(prefix, "/"), messages.clone())?
            .get(&join_path(prefix, "/plain"), plain)?
            .get(&join_path(prefix, "/{name}"), messages)?
            .put(&join_path(prefix, "/greeting"), update)?;

        tracing::info!(prefix = %prefix, mode = ?self.mode, "Greeting routes registered");
        Ok(())
    }
}
