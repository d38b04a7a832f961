//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Router (matched route)
//!     → backend.rs HandlerBackend::invoke
//!         Concurrent → handler runs on the calling request task
//!         Affine     → queue.rs AffinityQueue::submit
//!                      → dedicated worker thread runs tasks one at a time (FIFO)
//!     → ServerResponse::complete → transport
//! ```
//!
//! # Design Decisions
//! - Exactly two backend variants, chosen at registration, never at call sites
//! - Each affine backend owns exactly one queue and one worker thread
//! - Handler faults (errors and panics) stop at the invoke boundary as a 500
//! - A task panic never takes down the worker; the next task still runs

pub mod backend;
pub mod error;
pub mod queue;

pub use backend::{AffineBackend, AffineHandler, AffineMode, ConcurrentBackend, Handler, HandlerBackend};
pub use error::{HandlerError, TaskError};
pub use queue::{AffinityQueue, TaskHandle};
