//! Test helpers: build AppState and router backed by in-memory telemetry.
//!
//! Run from workspace root: `cargo test -p trident-api`.

use std::collections::HashMap;
use std::sync::Arc;

use axum_test::TestServer;
use trident_api::setup::routes;
use trident_api::AppState;
use trident_core::Config;
use trident_infra::telemetry::testing::InMemoryTelemetry;

pub const TEST_SERVICE_NAME: &str = "svc-a";

/// Test application: server plus the telemetry it reports into.
pub struct TestApp {
    pub server: TestServer,
    pub telemetry: InMemoryTelemetry,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn telemetry(&self) -> &InMemoryTelemetry {
        &self.telemetry
    }
}

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("OTEL_SERVICE_NAME", TEST_SERVICE_NAME),
        ("OTEL_SERVICE_VERSION", "0.0.0-test"),
        ("ENVIRONMENT", "test"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

/// Setup test app. Must run inside a tokio runtime.
pub fn setup_test_app() -> TestApp {
    let config = test_config();
    let telemetry = InMemoryTelemetry::with_settings(config.telemetry());
    let state = Arc::new(AppState::new(config, telemetry.providers().handles()));

    let app = routes::setup_routes(state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, telemetry }
}
