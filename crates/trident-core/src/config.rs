//! Configuration module
//!
//! Configuration is read once at startup from environment variables (a `.env`
//! file is honoured). Every value has a default so the service starts against a
//! local collector with no configuration at all.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

const SERVER_PORT: u16 = 8080;
const SERVICE_NAME: &str = "cpp-service";
const OTLP_ENDPOINT: &str = "http://localhost:4317";
const EXPORT_TIMEOUT_SECS: u64 = 10;
const METRIC_EXPORT_INTERVAL_MS: u64 = 1_000;
const LOG_FILTER: &str = "trident=info,tower_http=info";

/// Wire transport used by the three OTLP exporters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportProtocol {
    Grpc,
    HttpProtobuf,
}

impl FromStr for ExportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grpc" => Ok(Self::Grpc),
            "http" | "http/protobuf" => Ok(Self::HttpProtobuf),
            other => Err(format!("unknown protocol '{}', expected grpc or http", other)),
        }
    }
}

impl fmt::Display for ExportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grpc => f.write_str("grpc"),
            Self::HttpProtobuf => f.write_str("http/protobuf"),
        }
    }
}

/// Export timing policy for the trace and log pipelines.
///
/// `Simple` exports inline when a span ends or a record is emitted. `Batch`
/// queues and exports from a background task. Metrics always use a periodic
/// reader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessorMode {
    #[default]
    Simple,
    Batch,
}

impl FromStr for ProcessorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "batch" => Ok(Self::Batch),
            other => Err(format!(
                "unknown processor '{}', expected simple or batch",
                other
            )),
        }
    }
}

impl fmt::Display for ProcessorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::Batch => f.write_str("batch"),
        }
    }
}

/// Console log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{}', expected compact or json",
                other
            )),
        }
    }
}

/// Identity attached to every resource the process exports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    service_name: String,
    service_version: String,
}

impl ServiceIdentity {
    pub fn new(
        service_name: impl Into<String>,
        service_version: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let service_name = service_name.into();
        if service_name.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: keys::SERVICE_NAME,
            });
        }
        Ok(Self {
            service_name,
            service_version: service_version.into(),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_version(&self) -> &str {
        &self.service_version
    }
}

/// Collector connection shared by the trace, metric and log exporters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExporterConfig {
    endpoint: String,
    use_tls: bool,
    protocol: ExportProtocol,
    timeout: Duration,
}

impl ExporterConfig {
    /// Validate `endpoint` and derive TLS usage from its scheme.
    pub fn new(
        endpoint: impl Into<String>,
        protocol: ExportProtocol,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let uri: http::Uri = endpoint
            .parse()
            .map_err(|e: http::uri::InvalidUri| ConfigError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let use_tls = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            Some(other) => {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint,
                    reason: format!("unsupported scheme '{}'", other),
                })
            }
            None => {
                return Err(ConfigError::InvalidEndpoint {
                    endpoint,
                    reason: "missing scheme (expected http:// or https://)".to_string(),
                })
            }
        };

        if uri.authority().is_none() {
            return Err(ConfigError::InvalidEndpoint {
                endpoint,
                reason: "missing host".to_string(),
            });
        }

        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: keys::EXPORT_TIMEOUT,
                value: "0".to_string(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            endpoint,
            use_tls,
            protocol,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn protocol(&self) -> ExportProtocol {
        self.protocol
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Endpoint for one signal. gRPC multiplexes signals on one address; the
    /// HTTP transport posts each signal to its own path (`/v1/traces` etc).
    pub fn signal_endpoint(&self, signal_path: &str) -> String {
        match self.protocol {
            ExportProtocol::Grpc => self.endpoint.clone(),
            ExportProtocol::HttpProtobuf => format!("{}{}", self.endpoint, signal_path),
        }
    }
}

/// Everything the telemetry bootstrap needs.
#[derive(Clone, Debug)]
pub struct TelemetrySettings {
    pub identity: ServiceIdentity,
    pub exporter: ExporterConfig,
    pub environment: String,
    pub metric_export_interval: Duration,
    pub processor: ProcessorMode,
    pub tracing_bridge: bool,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl TelemetrySettings {
    pub fn service_name(&self) -> &str {
        self.identity.service_name()
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    telemetry: TelemetrySettings,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = parse_or(&lookup, keys::PORT, SERVER_PORT)?;

        let identity = ServiceIdentity::new(
            lookup(keys::SERVICE_NAME).unwrap_or_else(|| SERVICE_NAME.to_string()),
            lookup(keys::SERVICE_VERSION)
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        )?;

        let protocol = parse_or(&lookup, keys::PROTOCOL, ExportProtocol::Grpc)?;
        // Whole seconds: opentelemetry-otlp reads this key itself and applies
        // it in seconds, overriding the builder timeout.
        let timeout_secs: u64 = parse_or(&lookup, keys::EXPORT_TIMEOUT, EXPORT_TIMEOUT_SECS)?;
        let exporter = ExporterConfig::new(
            lookup(keys::ENDPOINT).unwrap_or_else(|| OTLP_ENDPOINT.to_string()),
            protocol,
            Duration::from_secs(timeout_secs),
        )?;

        let interval_ms: u64 =
            parse_or(&lookup, keys::METRIC_EXPORT_INTERVAL, METRIC_EXPORT_INTERVAL_MS)?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: keys::METRIC_EXPORT_INTERVAL,
                value: "0".to_string(),
                reason: "interval must be greater than zero".to_string(),
            });
        }

        let environment = lookup(keys::ENVIRONMENT)
            .or_else(|| lookup(keys::APP_ENV))
            .unwrap_or_else(|| "development".to_string());

        let telemetry = TelemetrySettings {
            identity,
            exporter,
            environment,
            metric_export_interval: Duration::from_millis(interval_ms),
            processor: parse_or(&lookup, keys::PROCESSOR, ProcessorMode::Simple)?,
            tracing_bridge: parse_bool_or(&lookup, keys::TRACING_BRIDGE, false)?,
            log_filter: lookup(keys::RUST_LOG).unwrap_or_else(|| LOG_FILTER.to_string()),
            log_format: parse_or(&lookup, keys::LOG_FORMAT, LogFormat::Compact)?,
        };

        Ok(Self {
            server_port,
            telemetry,
        })
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn service_name(&self) -> &str {
        self.telemetry.service_name()
    }

    pub fn environment(&self) -> &str {
        &self.telemetry.environment
    }
}

/// Environment variable names.
pub mod keys {
    pub const PORT: &str = "PORT";
    pub const SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
    pub const SERVICE_VERSION: &str = "OTEL_SERVICE_VERSION";
    pub const ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
    pub const PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
    pub const EXPORT_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";
    pub const METRIC_EXPORT_INTERVAL: &str = "OTEL_METRIC_EXPORT_INTERVAL";
    pub const PROCESSOR: &str = "OTEL_PROCESSOR";
    pub const TRACING_BRIDGE: &str = "OTEL_TRACING_BRIDGE";
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    pub const APP_ENV: &str = "APP_ENV";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
