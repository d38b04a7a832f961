//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the shared greeting from validated configuration
//! - Start backends and register every route
//! - Hand back a frozen router ready for the HTTP layer
//!
//! # Design Decisions
//! - Fail fast: a bad template or route aborts startup
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::greet::{GreetError, GreetService};
use crate::routing::Router;
use crate::state::SharedValue;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to set up greeting routes: {0}")]
    Greet(#[from] GreetError),
}

/// Everything the HTTP layer needs, plus a handle on the shared greeting.
#[derive(Debug)]
pub struct GreetApp {
    pub router: Router,
    pub greeting: Arc<SharedValue<String>>,
}

/// Build shared state, backends and routes from configuration.
pub fn build_app(config: &ServiceConfig) -> Result<GreetApp, StartupError> {
    let greeting = Arc::new(SharedValue::new(config.app.greeting.clone()));

    let service = GreetService::new(
        greeting.clone(),
        config.app.template.clone(),
        config.dispatch.affine_mode,
    );

    let mut rules = Router::builder();
    service.register(&mut rules, &config.app.route_prefix)?;
    let router = rules.build();

    tracing::info!(
        greeting = %config.app.greeting,
        prefix = %config.app.route_prefix,
        affine_mode = ?config.dispatch.affine_mode,
        routes = router.routes().len(),
        "Application ready"
    );

    Ok(GreetApp { router, greeting })
}
