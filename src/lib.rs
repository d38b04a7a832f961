//! Greeting service with concurrency-aware request dispatch.
//!
//! Handlers are registered as either concurrent backends (run on the
//! request task) or affine backends (serialized on one dedicated worker),
//! and share a single atomically swappable greeting.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod routing;
pub mod state;

// Application
pub mod greet;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{build_app, GreetApp, Shutdown};
