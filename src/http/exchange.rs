//! Transport-neutral request and response handed to handler backends.
//!
//! # Responsibilities
//! - Carry method, path, headers, body and extracted path variables
//! - Collect status and body from a handler
//! - Deliver the finished reply to the transport, possibly from another thread
//!
//! # Design Decisions
//! - The response owns a one-shot completion slot, so it can be finished on
//!   the request task or on an affinity worker
//! - A response dropped without completing reports 500, so the transport never
//!   waits on a reply that will not come

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::dispatch::HandlerError;

/// Body sent when a handler faults.
pub const FAULT_BODY: &str = "Failed to process request";

/// Path variables extracted by the router.
pub type PathParams = HashMap<String, String>;

/// An inbound request as seen by handlers.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: PathParams,
    request_id: String,
}

impl ServerRequest {
    /// Build a request. The request ID is read from `x-request-id`.
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            method,
            path: path.into(),
            headers,
            body,
            params: PathParams::new(),
            request_id,
        }
    }

    /// Request with no headers or body, mostly for tests and internal callers.
    pub fn bare(method: Method, path: impl Into<String>) -> Self {
        Self::new(method, path, HeaderMap::new(), Bytes::new())
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `x-request-id` of this request, or `"unknown"`.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Value of a path variable bound by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Bind the variables of the matched route.
    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Body of a finished reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Empty,
    Json(serde_json::Value),
    Text(String),
}

/// A finished reply, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
}

impl Reply {
    /// Generic 500 reply used for every handler fault.
    pub fn fault() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ReplyBody::Text(FAULT_BODY.to_string()),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            ReplyBody::Empty => self.status.into_response(),
            ReplyBody::Json(value) => (self.status, Json(value)).into_response(),
            ReplyBody::Text(text) => (
                self.status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
                text,
            )
                .into_response(),
        }
    }
}

/// Response sink handed to a backend.
///
/// Handlers set a status and a body; the backend boundary calls `complete`.
#[derive(Debug)]
pub struct ServerResponse {
    status: StatusCode,
    body: ReplyBody,
    slot: Option<oneshot::Sender<Reply>>,
}

impl ServerResponse {
    /// Create a response and the receiving end the transport waits on.
    pub fn channel() -> (Self, PendingReply) {
        let (tx, rx) = oneshot::channel();
        let response = Self {
            status: StatusCode::OK,
            body: ReplyBody::Empty,
            slot: Some(tx),
        };
        (response, PendingReply { rx })
    }

    /// Set the reply status. Defaults to 200.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Set a JSON body.
    pub fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), HandlerError> {
        self.body = ReplyBody::Json(serde_json::to_value(value)?);
        Ok(())
    }

    /// Set a `text/plain` body.
    pub fn send_text(&mut self, text: impl Into<String>) {
        self.body = ReplyBody::Text(text.into());
    }

    /// Reply with no body.
    pub fn send_empty(&mut self) {
        self.body = ReplyBody::Empty;
    }

    /// Discard whatever the handler produced and answer with the generic 500.
    pub fn fail(&mut self) {
        let Reply { status, body } = Reply::fault();
        self.status = status;
        self.body = body;
    }

    /// Hand the reply to the transport.
    pub fn complete(mut self) {
        if let Some(slot) = self.slot.take() {
            let reply = Reply {
                status: self.status,
                body: std::mem::replace(&mut self.body, ReplyBody::Empty),
            };
            // Receiver gone means the client went away; nothing left to do.
            let _ = slot.send(reply);
        }
    }
}

impl Drop for ServerResponse {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            tracing::warn!(status = %self.status, "Response dropped before completion");
            let _ = slot.send(Reply::fault());
        }
    }
}

/// Transport side of a response.
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<Reply>,
}

impl PendingReply {
    /// Wait for the backend to complete the response.
    pub async fn wait(self) -> Reply {
        self.rx.await.unwrap_or_else(|_| Reply::fault())
    }

    /// Blocking variant for callers outside the async runtime.
    pub fn blocking_wait(self) -> Reply {
        self.rx.blocking_recv().unwrap_or_else(|_| Reply::fault())
    }
}
