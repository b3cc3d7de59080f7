use std::sync::atomic::{AtomicBool, Ordering};

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::LoggerProvider;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::filter_fn, fmt::format::Format, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};
use trident_core::{LogFormat, TelemetrySettings};

use super::exporters::build_otlp_exporters;
use super::handles::TelemetryHandles;
use super::providers::TelemetryProviders;
use crate::error::TelemetryError;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Owns the process-wide telemetry providers.
///
/// Keep it alive for the lifetime of the server. [`TelemetryGuard::shutdown`]
/// flushes and shuts down all pipelines; dropping the guard does the same if
/// shutdown was not called.
pub struct TelemetryGuard {
    providers: TelemetryProviders,
    shut_down: bool,
}

impl TelemetryGuard {
    pub fn handles(&self) -> TelemetryHandles {
        self.providers.handles()
    }

    pub fn shutdown(mut self) -> Result<(), TelemetryError> {
        self.shut_down = true;
        tracing::info!("Shutting down OpenTelemetry...");
        let result = self.providers.shutdown();
        tracing::info!("OpenTelemetry shutdown complete");
        result
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.shut_down {
            return;
        }
        if let Err(e) = self.providers.shutdown() {
            tracing::warn!(error = %e, "Telemetry shutdown failed");
        }
    }
}

/// Initialize the trace, metric and log pipelines and the console subscriber.
///
/// Runs once per process, inside a tokio runtime, before the server accepts
/// connections. After a successful call, later calls fail with
/// [`TelemetryError::AlreadyInitialized`]; a failed call can be retried and
/// reports its own error again. Nothing global is installed unless every
/// exporter could be built.
pub fn init_telemetry(settings: &TelemetrySettings) -> Result<TelemetryGuard, TelemetryError> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TelemetryError::AlreadyInitialized);
    }

    let result = install(settings);
    if result.is_err() {
        INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

fn install(settings: &TelemetrySettings) -> Result<TelemetryGuard, TelemetryError> {
    let exporters = build_otlp_exporters(&settings.exporter)?;
    let providers = TelemetryProviders::from_exporters(settings, exporters);

    install_subscriber(settings, &providers)?;

    opentelemetry::global::set_tracer_provider(providers.tracer_provider().clone());
    opentelemetry::global::set_meter_provider(providers.meter_provider().clone());
    // opentelemetry 0.27 has no global logger provider; logs are reachable
    // through TelemetryHandles and the tracing bridge only.

    tracing::info!(
        service.name = %settings.service_name(),
        service.version = %settings.identity.service_version(),
        endpoint = %settings.exporter.endpoint(),
        protocol = %settings.exporter.protocol(),
        use_tls = settings.exporter.use_tls(),
        processor = %settings.processor,
        metric_export_interval_ms = settings.metric_export_interval.as_millis() as u64,
        tracing_bridge = settings.tracing_bridge,
        environment = %settings.environment,
        "OpenTelemetry initialized successfully"
    );

    Ok(TelemetryGuard {
        providers,
        shut_down: false,
    })
}

fn install_subscriber(
    settings: &TelemetrySettings,
    providers: &TelemetryProviders,
) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&settings.log_filter)
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    // Internal `tracing` spans and events reach the collector only when bridged.
    let span_bridge = settings.tracing_bridge.then(|| {
        tracing_opentelemetry::layer().with_tracer(
            providers
                .tracer_provider()
                .tracer(settings.service_name().to_string()),
        )
    });
    let log_bridge = settings
        .tracing_bridge
        .then(|| event_bridge(providers.logger_provider()));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(span_bridge)
        .with(log_bridge);

    let result = match settings.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(Format::default().compact().with_target(false)),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

/// Forwards `tracing` events to the OTLP log pipeline.
///
/// Events from the export stack itself are skipped: exporting them would emit
/// more of them.
pub(crate) fn event_bridge<S>(logger_provider: &LoggerProvider) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    OpenTelemetryTracingBridge::new(logger_provider)
        .with_filter(filter_fn(|metadata| !is_export_stack(metadata.target())))
}

fn is_export_stack(target: &str) -> bool {
    const TARGETS: [&str; 6] = ["opentelemetry", "tonic", "h2", "hyper", "reqwest", "tower"];
    TARGETS.iter().any(|prefix| target.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::InMemoryTelemetry;
    use opentelemetry::logs::{AnyValue, Severity};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tracing_events_reach_the_log_pipeline() {
        let telemetry = InMemoryTelemetry::new("svc-a");
        let subscriber = tracing_subscriber::registry()
            .with(event_bridge(telemetry.providers().logger_provider()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(route = "/api/hello", "bridged event");
            tracing::info!(target: "opentelemetry_sdk", "exporter internals");
        });

        let logs = telemetry.emitted_logs();
        assert_eq!(logs.len(), 1, "only the application event is bridged");
        let record = &logs[0].record;
        assert_eq!(record.severity_number, Some(Severity::Info));
        match &record.body {
            Some(AnyValue::String(body)) => assert_eq!(body.as_str(), "bridged event"),
            other => panic!("unexpected log body {:?}", other),
        }
    }

    #[test]
    fn test_export_stack_targets() {
        assert!(is_export_stack("opentelemetry_sdk::metrics"));
        assert!(is_export_stack("h2::codec"));
        assert!(!is_export_stack("trident_api::handlers::hello"));
    }
}
