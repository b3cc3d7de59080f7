//! Trident core library
//!
//! Configuration and identity types shared by the telemetry bootstrap and the
//! HTTP service.

pub mod config;
pub mod error;

pub use config::{
    Config, ExportProtocol, ExporterConfig, LogFormat, ProcessorMode, ServiceIdentity,
    TelemetrySettings,
};
pub use error::ConfigError;
