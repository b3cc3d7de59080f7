//! Trident Infrastructure Library
//!
//! This crate owns the telemetry subsystem of the service:
//! - Resource descriptor shared by every signal
//! - OTLP trace, metric and log pipelines
//! - Console logging subscriber
//! - Per-service handles injected into request handlers

pub mod error;
pub mod telemetry;

pub use error::{Signal, TelemetryError};
pub use telemetry::{
    init_telemetry, ActiveSpan, ExporterSet, HttpServerInstruments, TelemetryGuard,
    TelemetryHandles, TelemetryProviders, HTTP_SERVER_REQUESTS,
};
