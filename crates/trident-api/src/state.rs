//! Application state shared by all handlers.

use std::sync::Arc;

use trident_core::Config;
use trident_infra::TelemetryHandles;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Injected once at startup; handlers never look up global providers.
    pub telemetry: Arc<TelemetryHandles>,
}

impl AppState {
    pub fn new(config: Config, telemetry: TelemetryHandles) -> Self {
        Self {
            config,
            telemetry: Arc::new(telemetry),
        }
    }
}
