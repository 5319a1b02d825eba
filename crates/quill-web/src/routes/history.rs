use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use quill_core::HistoryRecord;

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/api/history", get(list_history))
}

/// The history log as JSON, oldest first.
async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryRecord>> {
    let records = state
        .history
        .current()
        .iter()
        .map(|record| HistoryRecord::clone(record))
        .collect();
    Json(records)
}
