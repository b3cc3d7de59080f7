//! Route configuration and setup.

use crate::constants::{HEALTH_PATH, HELLO_PATH, ROOT_PATH};
use crate::handlers::{health, hello, root};
use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Setup all application routes
///
/// The trace layer only writes console request logs; OTLP spans come from the
/// instrumented handlers (and from the tracing bridge when it is enabled).
pub fn setup_routes(state: Arc<AppState>) -> Router<()> {
    Router::new()
        .route(ROOT_PATH, get(root::root))
        .route(HELLO_PATH, get(hello::hello))
        .route(HEALTH_PATH, get(health::liveness_check))
        .layer(TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)))
        .with_state(state)
}
