//! OpenTelemetry telemetry initialization
//!
//! Builds the trace, metric and log pipelines for one service identity and
//! exposes them to request handlers through [`TelemetryHandles`].

mod exporters;
mod handles;
mod init;
mod providers;
mod resource;
mod span;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use exporters::{build_otlp_exporters, ExporterSet};
pub use handles::{HttpServerInstruments, TelemetryHandles, HTTP_SERVER_REQUESTS};
pub use init::{init_telemetry, TelemetryGuard};
pub use providers::TelemetryProviders;
pub use resource::build_resource;
pub use span::ActiveSpan;
