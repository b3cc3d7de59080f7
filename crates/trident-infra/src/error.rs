//! Telemetry bootstrap errors
//!
//! Everything except [`TelemetryError::Shutdown`] is a startup failure: the
//! process must not serve requests with a partially built telemetry stack.

use std::fmt;

/// One of the three exported telemetry signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Traces,
    Metrics,
    Logs,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Traces => f.write_str("trace"),
            Signal::Metrics => f.write_str("metric"),
            Signal::Logs => f.write_str("log"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to build {signal} exporter for {endpoint}: {message}")]
    Exporter {
        signal: Signal,
        endpoint: String,
        message: String,
    },

    #[error("Telemetry is already initialized for this process")]
    AlreadyInitialized,

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),

    #[error("Failed to shut down {signal} provider: {message}")]
    Shutdown { signal: Signal, message: String },
}

impl TelemetryError {
    pub(crate) fn exporter(signal: Signal, endpoint: &str, err: impl fmt::Display) -> Self {
        TelemetryError::Exporter {
            signal,
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn shutdown(signal: Signal, err: impl fmt::Display) -> Self {
        TelemetryError::Shutdown {
            signal,
            message: err.to_string(),
        }
    }
}
