//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout)
//!     → server.rs fallback handler (buffer body, build ServerRequest)
//!     → routing::Router::dispatch
//!     → exchange.rs (ServerResponse completed by the backend)
//!     → Send to client
//! ```

pub mod exchange;
pub mod request_id;
pub mod server;

pub use exchange::{PathParams, PendingReply, Reply, ReplyBody, ServerRequest, ServerResponse};
pub use request_id::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
