use opentelemetry_sdk::export::logs::LogExporter;
use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::logs::LoggerProvider;
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::TracerProvider;
use trident_core::{ProcessorMode, ServiceIdentity, TelemetrySettings};

use super::exporters::ExporterSet;
use super::handles::TelemetryHandles;
use super::resource::build_resource;
use crate::error::{Signal, TelemetryError};

/// The three providers of one service, sharing a single resource.
///
/// Building providers does not touch global state; see
/// [`init_telemetry`](super::init_telemetry) for process-wide installation.
pub struct TelemetryProviders {
    identity: ServiceIdentity,
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: LoggerProvider,
}

impl TelemetryProviders {
    /// Wire already-built exporters into processors, a periodic reader and the
    /// three providers. Must run inside a tokio runtime: the metric reader and
    /// batch processors spawn their background tasks there.
    pub fn from_exporters<S, M, L>(
        settings: &TelemetrySettings,
        exporters: ExporterSet<S, M, L>,
    ) -> Self
    where
        S: SpanExporter + 'static,
        M: PushMetricExporter,
        L: LogExporter + 'static,
    {
        let resource = build_resource(&settings.identity, &settings.environment);

        let tracer_builder = TracerProvider::builder().with_resource(resource.clone());
        let tracer_provider = match settings.processor {
            ProcessorMode::Simple => tracer_builder.with_simple_exporter(exporters.spans),
            ProcessorMode::Batch => {
                tracer_builder.with_batch_exporter(exporters.spans, runtime::Tokio)
            }
        }
        .build();

        let reader = PeriodicReader::builder(exporters.metrics, runtime::Tokio)
            .with_interval(settings.metric_export_interval)
            .with_timeout(settings.exporter.timeout())
            .build();
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource.clone())
            .build();

        let logger_builder = LoggerProvider::builder().with_resource(resource);
        let logger_provider = match settings.processor {
            ProcessorMode::Simple => logger_builder.with_simple_exporter(exporters.logs),
            ProcessorMode::Batch => {
                logger_builder.with_batch_exporter(exporters.logs, runtime::Tokio)
            }
        }
        .build();

        Self {
            identity: settings.identity.clone(),
            tracer_provider,
            meter_provider,
            logger_provider,
        }
    }

    /// Derive the handles injected into request handlers.
    pub fn handles(&self) -> TelemetryHandles {
        TelemetryHandles::new(
            &self.identity,
            &self.tracer_provider,
            &self.meter_provider,
            &self.logger_provider,
        )
    }

    pub fn tracer_provider(&self) -> &TracerProvider {
        &self.tracer_provider
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.meter_provider
    }

    pub fn logger_provider(&self) -> &LoggerProvider {
        &self.logger_provider
    }

    /// Flush and shut down all three providers.
    ///
    /// Every provider is attempted even when an earlier one fails; the first
    /// failure is returned.
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        let mut first_error = None;

        for result in self.tracer_provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to flush spans");
            }
        }
        if let Err(e) = self.tracer_provider.shutdown() {
            first_error.get_or_insert(TelemetryError::shutdown(Signal::Traces, e));
        }

        if let Err(e) = self.meter_provider.shutdown() {
            first_error.get_or_insert(TelemetryError::shutdown(Signal::Metrics, e));
        }

        if let Err(e) = self.logger_provider.shutdown() {
            first_error.get_or_insert(TelemetryError::shutdown(Signal::Logs, e));
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::InMemoryTelemetry;
    use super::super::HTTP_SERVER_REQUESTS;
    use opentelemetry::logs::Severity;
    use opentelemetry::KeyValue;
    use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
    use trident_core::{Config, ProcessorMode};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_handles_are_named_after_the_service() {
        let telemetry = InMemoryTelemetry::new("svc-a");
        let handles = telemetry.providers().handles();
        assert_eq!(handles.service_name(), "svc-a");

        handles.start_server_span("startup-check").end();
        handles.emit_info("startup check", &[]);
        handles.instruments().record_request("/startup-check", "GET");
        telemetry.flush_metrics();

        assert_eq!(telemetry.finished_spans().len(), 1);

        let logs = telemetry.emitted_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].instrumentation.name(), "svc-a");
        let service_name = logs[0]
            .resource
            .iter()
            .find(|(k, _)| k.as_str() == SERVICE_NAME)
            .map(|(_, v)| v.to_string());
        assert_eq!(service_name.as_deref(), Some("svc-a"));

        let metric_scopes = telemetry.metric_scope_names(HTTP_SERVER_REQUESTS);
        assert_eq!(metric_scopes, vec!["svc-a".to_string()]);
        assert_eq!(
            telemetry.metric_resource_attribute(SERVICE_NAME).as_deref(),
            Some("svc-a")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_counter_is_reused_across_handle_derivations() {
        let telemetry = InMemoryTelemetry::new("svc-a");
        let first = telemetry.providers().handles();
        let second = telemetry.providers().handles();

        first.instruments().record_request("/api/hello", "GET");
        second.instruments().record_request("/api/hello", "GET");
        first.instruments().record_request("/api/hello", "GET");
        telemetry.flush_metrics();

        let points = telemetry.counter_points(HTTP_SERVER_REQUESTS);
        assert_eq!(points.len(), 1, "one series per label set: {:?}", points);
        assert_eq!(points[0].value, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_log_record_is_correlated_with_active_span() {
        let telemetry = InMemoryTelemetry::new("svc-a");
        let handles = telemetry.providers().handles();

        let span = handles.start_server_span("correlated");
        span.set_attribute(KeyValue::new("http.route", "/api/hello"));
        let span_context = span.span_context();
        handles.emit_info("inside span", &[("http.route", "/api/hello")]);
        span.end();

        let logs = telemetry.emitted_logs();
        assert_eq!(logs.len(), 1);
        let record = &logs[0].record;
        assert_eq!(record.severity_number, Some(Severity::Info));
        let trace_context = record
        .trace_context
        .as_ref()
        .expect("log carries trace context");
        assert_eq!(trace_context.trace_id, span_context.trace_id());
        assert_eq!(trace_context.span_id, span_context.span_id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_span_is_ended_once() {
        let telemetry = InMemoryTelemetry::new("svc-a");
        let handles = telemetry.providers().handles();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _span = handles.start_server_span("failing");
            panic!("handler failure");
        }));
        assert!(result.is_err());

        {
            let span = handles.start_server_span("explicit");
            span.end();
        }

        let names: Vec<String> = telemetry
            .finished_spans()
            .iter()
            .map(|s| s.name.to_string())
            .collect();
        assert_eq!(names, vec!["failing".to_string(), "explicit".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_succeeds_with_in_memory_exporters() {
        let telemetry = InMemoryTelemetry::new("svc-a");
        telemetry.providers().handles().emit_info("before shutdown", &[]);

        assert!(telemetry.providers().shutdown().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_processors_deliver_on_flush() {
        let config = Config::from_lookup(|key| match key {
            "OTEL_SERVICE_NAME" => Some("svc-a".to_string()),
            "OTEL_PROCESSOR" => Some("batch".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.telemetry().processor, ProcessorMode::Batch);

        let telemetry = InMemoryTelemetry::with_settings(config.telemetry());
        let handles = telemetry.providers().handles();

        let span = handles.start_server_span("batched");
        handles.emit_info("queued record", &[]);
        span.end();
        telemetry.flush_spans_and_logs();

        let names: Vec<String> = telemetry
            .finished_spans()
            .iter()
            .map(|s| s.name.to_string())
            .collect();
        assert_eq!(names, vec!["batched".to_string()]);

        let logs = telemetry.emitted_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].record.severity_number, Some(Severity::Info));
    }
}
