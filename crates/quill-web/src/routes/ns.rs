//! Namespace browser pages

use crate::state::AppState;
use crate::Result;
use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};
use quill_core::pages;

pub fn ns_routes() -> Router<AppState> {
    Router::new()
        .route("/ns", get(list_namespaces))
        .route("/ns/{namespace}", get(list_symbols))
        .route("/ns/{namespace}/{symbol}", get(describe_symbol))
}

async fn list_namespaces(State(state): State<AppState>) -> Html<String> {
    let names = state.browser.list_namespaces();
    Html(pages::namespace_index(&names).into_string())
}

async fn list_symbols(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Html<String>> {
    let symbols = state.browser.list_symbols(&namespace)?;
    Ok(Html(pages::namespace_page(&namespace, &symbols).into_string()))
}

async fn describe_symbol(
    State(state): State<AppState>,
    Path((namespace, symbol)): Path<(String, String)>,
) -> Result<Html<String>> {
    let descriptor = state.browser.describe_symbol(&namespace, &symbol)?;
    Ok(Html(
        pages::symbol_page(&state.renderer, &descriptor).into_string(),
    ))
}
