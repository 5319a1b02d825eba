//! Quill command line
//!
//! `quill serve` runs the web REPL; `quill eval` runs one expression through
//! the same evaluator and prints the record fields.

pub mod cli;
pub mod commands;
pub mod logging;
