//! Shared mutable service state.
//!
//! # Data Flow
//! ```text
//! config (app.greeting)
//!     → SharedValue::new at startup
//!     → Arc<SharedValue<String>> injected into every greeting handler
//!     → get() on each greeting request, set() on each accepted update
//! ```
//!
//! # Design Decisions
//! - Owned by the service instance, never a global
//! - Reads and writes are independently atomic; last write wins
//! - No compound read-modify-write is offered

pub mod shared;

pub use shared::SharedValue;
