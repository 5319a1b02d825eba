//! Quill web front end
//!
//! [`app`] builds the router over an [`AppState`]; [`start_server`] binds it.

pub mod routes;
pub mod server;

mod error;
mod state;

pub use error::{Result, WebError};
pub use server::start_server;
pub use state::AppState;

use crate::routes::{health_routes, history_routes, ns_routes, repl_routes};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Every route, with request tracing and the configured body limit.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.config.server.max_body_bytes;
    Router::new()
        .merge(repl_routes())
        .merge(ns_routes())
        .merge(history_routes())
        .with_state(state)
        .merge(health_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
}
