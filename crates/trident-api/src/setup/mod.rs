//! Application setup and initialization
//!
//! Telemetry is bootstrapped before the router exists: handlers receive the
//! telemetry handles through the router state, so a router cannot be built
//! without them.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use trident_core::Config;
use trident_infra::TelemetryGuard;

/// Initialize the entire application
pub fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router, TelemetryGuard)> {
    let telemetry = trident_infra::init_telemetry(config.telemetry())
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        service = %config.service_name(),
        environment = %config.environment(),
        "Configuration loaded successfully"
    );

    let state = Arc::new(AppState::new(config, telemetry.handles()));
    let router = routes::setup_routes(state.clone());

    Ok((state, router, telemetry))
}
