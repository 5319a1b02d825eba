use crate::printer;
use crate::value::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

/// Failure while turning text into forms.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("EOF while reading")]
    Eof,

    #[error("Unmatched delimiter `{delimiter}` at offset {offset}")]
    Unmatched { delimiter: char, offset: usize },

    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unsupported escape character `\\{escape}` at offset {offset}")]
    BadEscape { escape: char, offset: usize },

    #[error("Invalid number `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("Invalid token `{text}` at offset {offset}")]
    InvalidToken { text: String, offset: usize },

    #[error("Map literal must contain an even number of forms (offset {offset})")]
    OddMap { offset: usize },

    #[error("Unsupported dispatch macro `#{found}` at offset {offset}")]
    Dispatch { found: String, offset: usize },

    #[error("Unexpected trailing input at offset {offset}")]
    Trailing { offset: usize },

    #[error("Forms nested too deeply at offset {offset}")]
    TooDeep { offset: usize },
}

/// Failure while evaluating a form.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("Read failed: {0}")]
    Read(#[from] ReadError),

    #[error("Unable to resolve symbol: {0} in this context")]
    Unresolved(String),

    #[error("Attempting to call unbound var: #'{0}")]
    Unbound(String),

    #[error("Wrong number of args ({got}) passed to: {name}")]
    Arity { name: String, got: usize },

    #[error("A value of type {0} cannot be called as a function")]
    NotCallable(&'static str),

    #[error("{0}")]
    Type(String),

    #[error("Invalid {form} form: {reason}")]
    Syntax { form: &'static str, reason: String },

    #[error("Index {index} out of bounds for length {len}")]
    Index { index: i64, len: usize },

    #[error("Divide by zero")]
    DivideByZero,

    #[error("Integer overflow")]
    Overflow,

    #[error("Stack depth exceeded ({0} nested forms)")]
    DepthExceeded(usize),

    #[error("Data nested more than {0} levels deep")]
    TooDeep(usize),

    #[error("Uncaught throw: {}", thrown_message(.0))]
    Thrown(Value),
}

impl EvalError {
    pub(crate) fn expected(what: &str, found: &Value) -> Self {
        EvalError::Type(format!("Expected {what}, found {}", found.type_tag()))
    }

    pub(crate) fn syntax(form: &'static str, reason: impl Into<String>) -> Self {
        EvalError::Syntax {
            form,
            reason: reason.into(),
        }
    }

    /// The value a `(catch e ...)` clause binds for this failure.
    pub fn caught_value(&self) -> Value {
        match self {
            EvalError::Thrown(value) => value.clone(),
            other => Value::string(other.to_string()),
        }
    }
}

fn thrown_message(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => printer::pr_str(other),
    }
}
