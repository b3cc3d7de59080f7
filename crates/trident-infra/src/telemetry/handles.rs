//! Per-service telemetry handles
//!
//! Handles are derived once from the providers and shared by every request
//! task. All accessors take `&self`; the SDK types behind them are `Send +
//! Sync`, so handlers need no locking of their own.

use opentelemetry::logs::{AnyValue, LogRecord as _, Logger as _, LoggerProvider as _, Severity};
use opentelemetry::metrics::{Counter, Meter, MeterProvider as _};
use opentelemetry::trace::{SpanKind, TracerProvider as _};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_sdk::logs::{Logger, LoggerProvider};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use trident_core::ServiceIdentity;

use super::span::ActiveSpan;

/// Name of the request counter.
pub const HTTP_SERVER_REQUESTS: &str = "http.server.requests";

/// Long-lived HTTP server instruments.
///
/// Created once per meter so every request adds to the same series.
#[derive(Clone)]
pub struct HttpServerInstruments {
    pub requests: Counter<u64>,
}

impl HttpServerInstruments {
    pub fn new(meter: &Meter) -> Self {
        let requests = meter
            .u64_counter(HTTP_SERVER_REQUESTS)
            .with_description("Number of HTTP requests handled by instrumented routes")
            .with_unit("{request}")
            .build();

        Self { requests }
    }

    pub fn record_request(&self, route: &str, method: &str) {
        self.requests.add(
            1,
            &[
                KeyValue::new("http.route", route.to_string()),
                KeyValue::new("http.method", method.to_string()),
            ],
        );
    }
}

/// Tracer, logger and request instruments named after the service.
pub struct TelemetryHandles {
    service_name: String,
    tracer: Tracer,
    logger: Logger,
    instruments: HttpServerInstruments,
}

impl TelemetryHandles {
    pub(crate) fn new(
        identity: &ServiceIdentity,
        tracer_provider: &TracerProvider,
        meter_provider: &SdkMeterProvider,
        logger_provider: &LoggerProvider,
    ) -> Self {
        let scope = InstrumentationScope::builder(identity.service_name().to_string())
            .with_version(identity.service_version().to_string())
            .build();

        let tracer = tracer_provider.tracer_with_scope(scope.clone());
        let meter = meter_provider.meter_with_scope(scope.clone());
        let logger = logger_provider.logger_with_scope(scope);
        let instruments = HttpServerInstruments::new(&meter);

        Self {
            service_name: identity.service_name().to_string(),
            tracer,
            logger,
            instruments,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn instruments(&self) -> &HttpServerInstruments {
        &self.instruments
    }

    /// Start a server span and make it the active span until the returned
    /// guard is dropped.
    pub fn start_server_span(&self, name: &'static str) -> ActiveSpan {
        ActiveSpan::start(&self.tracer, name, SpanKind::Server)
    }

    /// Emit one INFO record. The SDK attaches the active span's trace context.
    pub fn emit_info(&self, body: impl Into<String>, attributes: &[(&'static str, &str)]) {
        let mut record = self.logger.create_log_record();
        record.set_severity_number(Severity::Info);
        record.set_severity_text("INFO");
        record.set_body(AnyValue::from(body.into()));
        for (key, value) in attributes {
            record.add_attribute(*key, value.to_string());
        }
        self.logger.emit(record);
    }
}
