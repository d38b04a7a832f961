//! Greeting route handlers.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::{AffineHandler, Handler, HandlerError};
use crate::greet::template::TemplateEngine;
use crate::http::exchange::{ServerRequest, ServerResponse};
use crate::state::SharedValue;

/// Name used when the route has no `name` variable.
pub const DEFAULT_NAME: &str = "World";

pub const NO_GREETING: &str = "No greeting provided";
pub const MALFORMED_PAYLOAD: &str = "Malformed greeting payload";
pub const GREETING_NOT_STRING: &str = "Greeting must be a string";

#[derive(Debug, Serialize)]
pub struct GreetingMessage<'a> {
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// Renders `{"message": ...}` for the default and named greeting routes.
///
/// Owns a `TemplateEngine`, so it lives on an affine worker.
pub struct GreetingRenderer {
    engine: TemplateEngine,
    greeting: Arc<SharedValue<String>>,
}

impl GreetingRenderer {
    /// Renderer over a compiled engine and the shared greeting.
    pub fn new(engine: TemplateEngine, greeting: Arc<SharedValue<String>>) -> Self {
        Self { engine, greeting }
    }
}

impl AffineHandler for GreetingRenderer {
    fn handle(&mut self, req: &ServerRequest, res: &mut ServerResponse) -> Result<(), HandlerError> {
        let name = req.param("name").unwrap_or(DEFAULT_NAME);
        let greeting = self.greeting.get();
        let message = self.engine.render(&greeting, name);

        tracing::debug!(
            request_id = %req.request_id(),
            renders = self.engine.renders(),
            "Greeting rendered"
        );

        res.status(StatusCode::OK);
        res.send_json(&GreetingMessage { message: &message })
    }
}

/// Plain-text `"<greeting> World!"`, safe to run on any request task.
#[derive(Debug, Clone)]
pub struct PlainGreeting {
    greeting: Arc<SharedValue<String>>,
}

impl PlainGreeting {
    pub fn new(greeting: Arc<SharedValue<String>>) -> Self {
        Self { greeting }
    }
}

impl Handler for PlainGreeting {
    fn handle(&self, _req: &ServerRequest, res: &mut ServerResponse) -> Result<(), HandlerError> {
        res.status(StatusCode::OK);
        res.send_text(format!("{} {}!", self.greeting.get(), DEFAULT_NAME));
        Ok(())
    }
}

/// `PUT .../greeting` with `{"greeting": "<text>"}`.
#[derive(Debug, Clone)]
pub struct UpdateGreeting {
    greeting: Arc<SharedValue<String>>,
}

impl UpdateGreeting {
    pub fn new(greeting: Arc<SharedValue<String>>) -> Self {
        Self { greeting }
    }
}

impl Handler for UpdateGreeting {
    fn handle(&self, req: &ServerRequest, res: &mut ServerResponse) -> Result<(), HandlerError> {
        let payload = match req.json::<Value>() {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => return reject(req, res, MALFORMED_PAYLOAD),
        };

        let new_greeting = match payload.get("greeting") {
            None => return reject(req, res, NO_GREETING),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return reject(req, res, GREETING_NOT_STRING),
        };

        let previous = self.greeting.replace(new_greeting.clone());
        tracing::info!(
            request_id = %req.request_id(),
            previous = %previous,
            current = %new_greeting,
            "Greeting updated"
        );

        res.status(StatusCode::NO_CONTENT);
        res.send_empty();
        Ok(())
    }
}

fn reject(req: &ServerRequest, res: &mut ServerResponse, error: &str) -> Result<(), HandlerError> {
    tracing::debug!(request_id = %req.request_id(), error, "Greeting update rejected");
    res.status(StatusCode::BAD_REQUEST);
    res.send_json(&ErrorBody { error })
}
