//! Route paths, response texts and span names.

pub const ROOT_PATH: &str = "/";
pub const HELLO_PATH: &str = "/api/hello";
pub const HEALTH_PATH: &str = "/health";

pub const BANNER: &str = "Trident OpenTelemetry Service";
pub const GREETING: &str = "Hello from Trident with OpenTelemetry!";

/// Span name of the instrumented hello operation.
pub const HELLO_OPERATION: &str = "handle_hello";

/// `YYYY-MM-DDTHH:MM:SSZ`, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
