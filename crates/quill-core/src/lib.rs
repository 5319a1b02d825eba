//! Quill core
//!
//! The pieces between an HTTP request and a page:
//! - [`Evaluator`]: one expression in, result/stdout/stderr text out
//! - [`HistoryLog`]: the shared, append-only record of evaluations
//! - [`Renderer`]: type-directed conversion of values to hypertext
//! - [`NamespaceBrowser`]: namespace and symbol listings from a
//!   [`ReflectionProvider`]
//! - [`pages`]: full documents assembled from the above

mod browser;
mod error;
mod evaluator;
mod history;
pub mod pages;
mod reflect;
pub mod render;

pub use browser::NamespaceBrowser;
pub use error::{CoreError, Result};
pub use evaluator::{EvalOptions, Evaluation, Evaluator};
pub use history::{HistoryLog, HistoryRecord};
pub use reflect::{ReflectionProvider, RuntimeReflection, SymbolDescriptor};
pub use render::{Html, Renderer};
