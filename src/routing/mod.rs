//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     RouterBuilder::register(method, pattern, backend)
//!     → pattern.rs (parse literal / variable segments, reject bad patterns)
//!     → reject duplicate (method, pattern shape)
//!     → build() freezes an immutable Router
//!
//! Incoming Request (method, path)
//!     → router.rs (candidate scan)
//!     → pattern.rs (segment match, extract path variables)
//!     → most specific candidate wins, ties go to the first registered
//!     → HandlerBackend::invoke, or 404 when nothing matches
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex (segment comparison only)
//! - Deterministic: same input always matches same route
//! - Literal segments beat variable segments

pub mod pattern;
pub mod router;

pub use pattern::PathPattern;
pub use router::{DispatchOutcome, Route, RouteError, Router, RouterBuilder};
