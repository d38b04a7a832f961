//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → CLI overrides (bind address, greeting)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → startup builds shared state, backends and routes from it
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the greeting then lives in SharedValue
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, DispatchConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServiceConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
