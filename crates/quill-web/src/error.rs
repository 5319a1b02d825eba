use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use quill_core::{pages, CoreError};
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Evaluation task failed: {0}")]
    Task(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match &self {
            WebError::Core(err) if err.is_not_found() => {
                warn!(error = %err, "Not found");
                let page = pages::not_found_page(&err.to_string());
                (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
            }
            _ => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
