use crate::state::AppState;
use crate::{Result, WebError};
use axum::{
    extract::{Form, State},
    response::{Html, Redirect},
    routing::get,
    Router,
};
use quill_core::{pages, Evaluation};
use serde::Deserialize;
use tracing::{info, warn};

pub fn repl_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/repl", get(show_repl).post(submit_expression))
}

#[derive(Debug, Deserialize)]
struct ReplForm {
    /// Missing means empty, which then fails to parse like any bad input.
    #[serde(default)]
    expr: String,
}

async fn index() -> Redirect {
    Redirect::to("/repl")
}

async fn show_repl(State(state): State<AppState>) -> Html<String> {
    Html(pages::repl_page(&state.history.current()).into_string())
}

async fn submit_expression(
    State(state): State<AppState>,
    Form(form): Form<ReplForm>,
) -> Result<Html<String>> {
    let evaluation = evaluate(&state, form.expr.clone()).await?;
    let snapshot = state.history.append(evaluation.into_record(form.expr));
    info!(records = snapshot.len(), "Recorded evaluation");
    Ok(Html(pages::repl_page(&snapshot).into_string()))
}

/// Evaluate off the async workers, waiting at most the configured timeout.
///
/// A timed-out evaluation keeps running on its blocking thread; only the
/// request stops waiting for it.
async fn evaluate(state: &AppState, expression: String) -> Result<Evaluation> {
    let evaluator = state.evaluator.clone();
    let task = tokio::task::spawn_blocking(move || evaluator.evaluate(&expression));

    let joined = match state.eval_timeout() {
        None => task.await,
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "Evaluation timed out");
                return Ok(Evaluation::failed(format!(
                    "Evaluation timed out after {}s",
                    limit.as_secs()
                )));
            }
        },
    };
    joined.map_err(|e| WebError::Task(e.to_string()))
}
