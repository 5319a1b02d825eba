//! Quill Lisp runtime
//!
//! A small Clojure-flavoured Lisp that the Quill REPL evaluates against:
//! - **Reader**: text → [`Value`] forms, with byte spans for source tracking
//! - **Printer**: readable (`pr_str`) and display (`print_str`) serialization
//! - **Namespaces**: vars with metadata and source text, discoverable at runtime
//! - **Capture**: per-thread redirection of the language's stdout/stderr
//!
//! Every value is `Send + Sync`, so one [`Runtime`] can serve concurrent
//! evaluations from many threads.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quill_lisp::{io, printer, reader, Interp, Runtime, USER_NS};
//!
//! let runtime = Runtime::new()?;
//! let form = reader::read_one("(do (println \"hi\") (+ 1 2))")?;
//! let ns = runtime.find_or_create_namespace(USER_NS);
//!
//! let captured = io::capture_output(|| Interp::new(&runtime, ns).eval_toplevel(&form, None));
//! assert_eq!(printer::pr_str(&captured.value?), "3");
//! assert_eq!(captured.stdout, "hi\n");
//! ```

mod error;
mod eval;
pub mod io;
mod namespace;
pub mod printer;
pub mod reader;
mod runtime;
mod stdlib;
mod value;

pub use error::{EvalError, ReadError, Result};
pub use eval::{Env, Interp, SourceInfo, DEFAULT_MAX_DEPTH};
pub use namespace::{Namespace, Var, VarMeta};
pub use runtime::{Runtime, CORE_NS, USER_NS};
pub use value::{Arity, Atom, Entries, Lambda, NativeFn, NativeImpl, Seq, Symbol, Value, MAX_DATA_DEPTH};
