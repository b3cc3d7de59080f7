//! Export timeout tests.
//!
//! Kept in their own test binary: they set `OTEL_EXPORTER_OTLP_TIMEOUT` in the
//! process environment, which the OTLP exporters also read.
//!
//! Run with: `cargo test -p trident-infra --test export_timeout_test`

use std::time::{Duration, Instant};

use opentelemetry_sdk::metrics::data::ResourceMetrics;
use opentelemetry_sdk::metrics::exporter::PushMetricExporter;
use opentelemetry_sdk::Resource;
use tokio::net::TcpListener;
use trident_core::Config;
use trident_infra::telemetry::build_otlp_exporters;

/// Accepts connections and never answers them.
async fn silent_collector() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    port
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_export_gives_up_after_configured_timeout() {
    let port = silent_collector().await;
    std::env::set_var("OTEL_EXPORTER_OTLP_TIMEOUT", "1");
    std::env::set_var(
        "OTEL_EXPORTER_OTLP_ENDPOINT",
        format!("http://127.0.0.1:{}", port),
    );

    let config = Config::from_env().unwrap();
    let timeout = config.telemetry().exporter.timeout();
    assert_eq!(timeout, Duration::from_secs(1));

    let exporters = build_otlp_exporters(&config.telemetry().exporter).unwrap();
    let mut batch = ResourceMetrics {
        resource: Resource::empty(),
        scope_metrics: Vec::new(),
    };

    let started = Instant::now();
    let result = exporters.metrics.export(&mut batch).await;
    let elapsed = started.elapsed();

    assert!(result.is_err(), "silent collector cannot accept the export");
    assert!(
        elapsed < timeout * 2,
        "export took {:?} with a {:?} timeout",
        elapsed,
        timeout
    );
}
