use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A namespace or symbol the browser was asked about does not exist.
    #[error("No such {kind}: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Failed to bootstrap the Quill runtime: {0}")]
    Bootstrap(#[from] quill_lisp::EvalError),
}

impl CoreError {
    pub fn namespace_not_found(namespace: &str) -> Self {
        CoreError::NotFound {
            kind: "namespace",
            name: namespace.to_string(),
        }
    }

    pub fn symbol_not_found(namespace: &str, symbol: &str) -> Self {
        CoreError::NotFound {
            kind: "symbol",
            name: format!("{namespace}/{symbol}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}
