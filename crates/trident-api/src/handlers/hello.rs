//! Instrumented hello endpoint.
//!
//! Every call produces one server span, one INFO log record correlated with
//! that span, and one increment of `http.server.requests`.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, State},
    http::Method,
    Json,
};
use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use serde::Serialize;
use trident_infra::TelemetryHandles;

use crate::constants::{GREETING, HELLO_OPERATION, TIMESTAMP_FORMAT};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: String,
    pub timestamp: String,
}

pub async fn hello(
    State(state): State<Arc<AppState>>,
    method: Method,
    matched_path: MatchedPath,
) -> Json<HelloResponse> {
    Json(handle_hello(
        &state.telemetry,
        matched_path.as_str(),
        method.as_str(),
    ))
}

/// Instrumented body of `GET /api/hello`.
///
/// Kept synchronous: the active-span guard is thread-bound and must not
/// live across an `.await`.
pub fn handle_hello(telemetry: &TelemetryHandles, route: &str, method: &str) -> HelloResponse {
    let span = telemetry.start_server_span(HELLO_OPERATION);
    span.set_attribute(KeyValue::new("http.method", method.to_string()));
    span.set_attribute(KeyValue::new("http.route", route.to_string()));

    telemetry.emit_info(
        format!("Hello endpoint called: {} {}", method, route),
        &[("http.route", route), ("http.method", method)],
    );

    telemetry.instruments().record_request(route, method);

    let response = HelloResponse {
        message: GREETING.to_string(),
        timestamp: format_timestamp(Utc::now()),
    };

    span.end();
    response
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
