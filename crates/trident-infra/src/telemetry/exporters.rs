use opentelemetry_otlp::{
    LogExporter, MetricExporter, SpanExporter, WithExportConfig, WithTonicConfig,
};
use opentelemetry_sdk::metrics::Temporality;
use tonic::transport::ClientTlsConfig;
use trident_core::{ExportProtocol, ExporterConfig};

use crate::error::{Signal, TelemetryError};

const TRACES_PATH: &str = "/v1/traces";
const METRICS_PATH: &str = "/v1/metrics";
const LOGS_PATH: &str = "/v1/logs";

/// One exporter per signal, all bound to the same collector.
pub struct ExporterSet<S, M, L> {
    pub spans: S,
    pub metrics: M,
    pub logs: L,
}

/// Build the three OTLP exporters from a single [`ExporterConfig`].
///
/// The gRPC transport opens its channel lazily, so this does not contact the
/// collector. It must run inside a tokio runtime.
pub fn build_otlp_exporters(
    config: &ExporterConfig,
) -> Result<ExporterSet<SpanExporter, MetricExporter, LogExporter>, TelemetryError> {
    Ok(ExporterSet {
        spans: span_exporter(config)?,
        metrics: metric_exporter(config)?,
        logs: log_exporter(config)?,
    })
}

fn span_exporter(config: &ExporterConfig) -> Result<SpanExporter, TelemetryError> {
    let endpoint = config.signal_endpoint(TRACES_PATH);
    let exporter = match config.protocol() {
        ExportProtocol::Grpc => with_scheme_tls(SpanExporter::builder().with_tonic(), config)
            .with_endpoint(endpoint.clone())
            .with_timeout(config.timeout())
            .build(),
        ExportProtocol::HttpProtobuf => SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint.clone())
            .with_timeout(config.timeout())
            .build(),
    };
    exporter.map_err(|e| TelemetryError::exporter(Signal::Traces, &endpoint, e))
}

fn metric_exporter(config: &ExporterConfig) -> Result<MetricExporter, TelemetryError> {
    let endpoint = config.signal_endpoint(METRICS_PATH);
    let exporter = match config.protocol() {
        ExportProtocol::Grpc => with_scheme_tls(MetricExporter::builder().with_tonic(), config)
            .with_endpoint(endpoint.clone())
            .with_timeout(config.timeout())
            .with_temporality(Temporality::Cumulative)
            .build(),
        ExportProtocol::HttpProtobuf => MetricExporter::builder()
            .with_http()
            .with_endpoint(endpoint.clone())
            .with_timeout(config.timeout())
            .with_temporality(Temporality::Cumulative)
            .build(),
    };
    exporter.map_err(|e| TelemetryError::exporter(Signal::Metrics, &endpoint, e))
}

fn log_exporter(config: &ExporterConfig) -> Result<LogExporter, TelemetryError> {
    let endpoint = config.signal_endpoint(LOGS_PATH);
    let exporter = match config.protocol() {
        ExportProtocol::Grpc => with_scheme_tls(LogExporter::builder().with_tonic(), config)
            .with_endpoint(endpoint.clone())
            .with_timeout(config.timeout())
            .build(),
        ExportProtocol::HttpProtobuf => LogExporter::builder()
            .with_http()
            .with_endpoint(endpoint.clone())
            .with_timeout(config.timeout())
            .build(),
    };
    exporter.map_err(|e| TelemetryError::exporter(Signal::Logs, &endpoint, e))
}

/// tonic refuses `https://` endpoints unless TLS is configured on the channel.
fn with_scheme_tls<B: WithTonicConfig>(builder: B, config: &ExporterConfig) -> B {
    if config.use_tls() {
        builder.with_tls_config(ClientTlsConfig::new().with_native_roots())
    } else {
        builder
    }
}
