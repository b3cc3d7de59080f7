//! In-memory telemetry pipelines for tests.
//!
//! Builds the same providers as production, with exporters that keep every
//! span, log record and metric export in memory.

use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::metrics::data::{ResourceMetrics, Sum};
use opentelemetry_sdk::testing::logs::in_memory_exporter::LogDataWithResource;
use opentelemetry_sdk::testing::logs::InMemoryLogExporter;
use opentelemetry_sdk::testing::metrics::InMemoryMetricExporter;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use trident_core::{Config, TelemetrySettings};

use super::exporters::ExporterSet;
use super::providers::TelemetryProviders;

/// One data point of a `u64` counter: its attributes and cumulative value.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterPoint {
    pub attributes: Vec<(String, String)>,
    pub value: u64,
}

impl CounterPoint {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct InMemoryTelemetry {
    providers: TelemetryProviders,
    spans: InMemorySpanExporter,
    metrics: InMemoryMetricExporter,
    logs: InMemoryLogExporter,
}

impl InMemoryTelemetry {
    /// Default settings for `service_name`. Must run inside a tokio runtime.
    pub fn new(service_name: &str) -> Self {
        let config = Config::from_lookup(|key| {
            (key == trident_core::config::keys::SERVICE_NAME).then(|| service_name.to_string())
        })
        .expect("default configuration is valid");
        Self::with_settings(config.telemetry())
    }

    pub fn with_settings(settings: &TelemetrySettings) -> Self {
        let spans = InMemorySpanExporter::default();
        let metrics = InMemoryMetricExporter::default();
        let logs = InMemoryLogExporter::default();

        let providers = TelemetryProviders::from_exporters(
            settings,
            ExporterSet {
                spans: spans.clone(),
                metrics: metrics.clone(),
                logs: logs.clone(),
            },
        );

        Self {
            providers,
            spans,
            metrics,
            logs,
        }
    }

    pub fn providers(&self) -> &TelemetryProviders {
        &self.providers
    }

    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans.get_finished_spans().unwrap_or_default()
    }

    pub fn emitted_logs(&self) -> Vec<LogDataWithResource> {
        self.logs.get_emitted_logs().unwrap_or_default()
    }

    /// Push the current metric state to the in-memory exporter.
    ///
    /// Blocks until the periodic reader has exported, so call it from a
    /// multi-threaded runtime.
    pub fn flush_metrics(&self) {
        if let Err(e) = self.providers.meter_provider().force_flush() {
            panic!("metric flush failed: {}", e);
        }
    }

    /// Export whatever the span and log processors still queue.
    ///
    /// Only batch processors hold anything back. Blocks like
    /// [`flush_metrics`](Self::flush_metrics).
    pub fn flush_spans_and_logs(&self) {
        for result in self.providers.tracer_provider().force_flush() {
            if let Err(e) = result {
                panic!("span flush failed: {}", e);
            }
        }
        for result in self.providers.logger_provider().force_flush() {
            if let Err(e) = result {
                panic!("log flush failed: {}", e);
            }
        }
    }

    fn latest_export(&self) -> Option<ResourceMetrics> {
        self.metrics
            .get_finished_metrics()
            .unwrap_or_default()
            .into_iter()
            .last()
    }

    /// Data points of the counter `name` in the most recent export.
    pub fn counter_points(&self, name: &str) -> Vec<CounterPoint> {
        let Some(export) = self.latest_export() else {
            return Vec::new();
        };

        export
            .scope_metrics
            .iter()
            .flat_map(|scope| scope.metrics.iter())
            .filter(|metric| metric.name == name)
            .filter_map(|metric| metric.data.as_any().downcast_ref::<Sum<u64>>())
            .flat_map(|sum| sum.data_points.iter())
            .map(|point| {
                let mut attributes: Vec<(String, String)> = point
                    .attributes
                    .iter()
                    .map(|kv| (kv.key.to_string(), kv.value.to_string()))
                    .collect();
                attributes.sort();
                CounterPoint {
                    attributes,
                    value: point.value,
                }
            })
            .collect()
    }

    /// Sum of all data points of the counter `name` in the most recent export.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counter_points(name).iter().map(|p| p.value).sum()
    }

    /// Instrumentation scopes that reported the metric `name`.
    pub fn metric_scope_names(&self, name: &str) -> Vec<String> {
        let Some(export) = self.latest_export() else {
            return Vec::new();
        };

        export
            .scope_metrics
            .iter()
            .filter(|scope| scope.metrics.iter().any(|metric| metric.name == name))
            .map(|scope| scope.scope.name().to_string())
            .collect()
    }

    pub fn metric_resource_attribute(&self, key: &str) -> Option<String> {
        let export = self.latest_export()?;
        export
            .resource
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.to_string())
    }
}
