//! Evaluation with output capture
//!
//! [`Evaluator::evaluate`] never fails: parse errors, evaluation errors and
//! interpreter panics all end up as text in [`Evaluation::stderr`].

use crate::history::HistoryRecord;
use crate::render::Renderer;
use quill_lisp::printer::pr_str;
use quill_lisp::{io, reader, Interp, Runtime, SourceInfo, Value, DEFAULT_MAX_DEPTH, USER_NS};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::debug;

/// Stack for the evaluation thread, sized so the depth limit trips first.
const EVAL_STACK_BYTES: usize = 32 * 1024 * 1024;

/// File name recorded on vars defined from submitted expressions.
const REPL_FILE: &str = "REPL";

#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Namespace every evaluation starts in.
    pub default_namespace: String,
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            default_namespace: USER_NS.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The three texts one evaluation produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Readable form of the value; empty when evaluation failed.
    pub result: String,
    pub stdout: String,
    pub stderr: String,
    /// The value rendered as hypertext, when the evaluator has a renderer.
    pub result_html: Option<String>,
}

impl Evaluation {
    /// An evaluation that produced nothing but a failure description.
    pub fn failed(description: impl Into<String>) -> Self {
        let mut stderr = description.into();
        if !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        Self {
            stderr,
            ..Self::default()
        }
    }

    pub fn into_record(self, expression: impl Into<String>) -> HistoryRecord {
        let mut record = HistoryRecord::new(expression, self.result, self.stdout, self.stderr);
        record.result_html = self.result_html;
        record
    }
}

pub struct Evaluator {
    runtime: Arc<Runtime>,
    options: EvalOptions,
    renderer: Option<Arc<Renderer>>,
}

impl Evaluator {
    pub fn new(runtime: Arc<Runtime>, options: EvalOptions) -> Self {
        Self {
            runtime,
            options,
            renderer: None,
        }
    }

    /// Also render successful values to hypertext while they are still live.
    pub fn with_renderer(mut self, renderer: Arc<Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Read one expression from `text` and evaluate it with output captured.
    pub fn evaluate(&self, text: &str) -> Evaluation {
        let started = Instant::now();
        let outcome = thread::scope(|scope| {
            thread::Builder::new()
                .name("quill-eval".into())
                .stack_size(EVAL_STACK_BYTES)
                .spawn_scoped(scope, || self.evaluate_captured(text))
                .map(|handle| handle.join())
        });

        let evaluation = match outcome {
            Ok(Ok(evaluation)) => evaluation,
            Ok(Err(panic)) => Evaluation::failed(format!(
                "Evaluation aborted: {}",
                panic_message(panic.as_ref())
            )),
            Err(err) => Evaluation::failed(format!("Could not start evaluation thread: {err}")),
        };

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            failed = !evaluation.stderr.is_empty() && evaluation.result.is_empty(),
            "Evaluated expression"
        );
        evaluation
    }

    /// Panics are caught inside the capture so output written before them survives.
    fn evaluate_captured(&self, text: &str) -> Evaluation {
        let captured = io::capture_output(|| {
            panic::catch_unwind(AssertUnwindSafe(|| self.run_and_print(text))).unwrap_or_else(
                |panic| {
                    io::write_stderr(&format!(
                        "Evaluation aborted: {}\n",
                        panic_message(panic.as_ref())
                    ));
                    (String::new(), None)
                },
            )
        });
        let (result, result_html) = captured.value;
        Evaluation {
            result,
            stdout: captured.stdout,
            stderr: captured.stderr,
            result_html,
        }
    }

    fn run_and_print(&self, text: &str) -> (String, Option<String>) {
        match self.run(text) {
            Ok(value) => {
                let html = self
                    .renderer
                    .as_ref()
                    .map(|renderer| renderer.render(&value).into_string());
                (pr_str(&value), html)
            }
            Err(err) => {
                io::write_stderr(&format!("{err}\n"));
                (String::new(), None)
            }
        }
    }

    fn run(&self, text: &str) -> quill_lisp::Result<Value> {
        let form = reader::read_one(text)?;
        let ns = self
            .runtime
            .find_or_create_namespace(&self.options.default_namespace);
        let source = SourceInfo {
            text: text.trim().to_string(),
            file: REPL_FILE.to_string(),
            line: 1,
            column: 1,
        };
        Interp::new(&self.runtime, ns)
            .with_max_depth(self.options.max_depth)
            .eval_toplevel(&form, Some(source))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("interpreter panicked")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn evaluator() -> Evaluator {
        Evaluator::new(Arc::new(Runtime::new().unwrap()), EvalOptions::default())
    }

    #[test]
    fn successful_evaluation_has_readable_result_and_no_output() {
        let evaluation = evaluator().evaluate("(+ 1 2)");
        assert_eq!(evaluation.result, "3");
        assert_eq!(evaluation.stdout, "");
        assert_eq!(evaluation.stderr, "");
    }

    #[test]
    fn strings_come_back_readable() {
        let evaluation = evaluator().evaluate("(str \"a\" \"b\")");
        assert_eq!(evaluation.result, "\"ab\"");
    }

    #[test_case(""; "empty input")]
    #[test_case("   "; "blank input")]
    #[test_case("(+ 1"; "unclosed list")]
    #[test_case("1 2"; "trailing form")]
    #[test_case("(undefined-fn)"; "unresolved symbol")]
    #[test_case("(throw :boom)"; "thrown value")]
    fn failures_become_stderr_text(src: &str) {
        let evaluation = evaluator().evaluate(src);
        assert_eq!(evaluation.result, "");
        assert!(!evaluation.stderr.is_empty());
        assert!(evaluation.stderr.ends_with('\n'));
    }

    #[test]
    fn output_before_a_failure_is_kept() {
        let evaluation = evaluator().evaluate("(do (println \"partial\") (throw \"bad\"))");
        assert_eq!(evaluation.stdout, "partial\n");
        assert_eq!(evaluation.stderr, "Uncaught throw: bad\n");
    }

    #[test]
    fn runaway_recursion_reports_depth_instead_of_crashing() {
        let evaluation = evaluator().evaluate("((fn f [n] (f (+ n 1))) 0)");
        assert!(evaluation.stderr.starts_with("Stack depth exceeded"));
    }

    #[test]
    fn data_nested_past_the_limit_is_an_error() {
        let evaluation =
            evaluator().evaluate("(count (str (reduce (fn [a _] [a]) nil (range 400000))))");
        assert_eq!(evaluation.result, "");
        assert_eq!(evaluation.stderr, "Data nested more than 4096 levels deep\n");
    }

    #[test]
    fn data_at_the_limit_prints_and_renders() {
        let evaluation = evaluator()
            .with_renderer(Arc::new(Renderer::new()))
            .evaluate("(reduce (fn [a _] [a]) nil (range 4095))");
        assert_eq!(evaluation.stderr, "");
        let expected = format!("{}nil{}", "[".repeat(4095), "]".repeat(4095));
        assert_eq!(evaluation.result, expected);
        assert_eq!(evaluation.result_html.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn output_before_a_panic_is_kept() {
        let mut renderer = Renderer::new();
        renderer.register("keyword", |_, _| panic!("rule failed"));
        let evaluation = evaluator()
            .with_renderer(Arc::new(renderer))
            .evaluate("(do (println \"before\") (eprintln \"warned\") :k)");
        assert_eq!(evaluation.result, "");
        assert_eq!(evaluation.stdout, "before\n");
        assert_eq!(evaluation.stderr, "warned\nEvaluation aborted: rule failed\n");
    }

    #[test]
    fn each_evaluation_starts_in_the_default_namespace() {
        let evaluator = evaluator();
        evaluator.evaluate("(in-ns 'elsewhere)");
        assert_eq!(evaluator.evaluate("(def here 1)").result, "#'user/here");
    }

    #[test]
    fn definitions_record_the_submitted_text() {
        let evaluator = evaluator();
        evaluator.evaluate("  (defn twice [x] (* 2 x))\n");
        let var = evaluator
            .runtime()
            .find_namespace(USER_NS)
            .unwrap()
            .lookup("twice")
            .unwrap();
        assert_eq!(var.source().as_deref(), Some("(defn twice [x] (* 2 x))"));
        assert_eq!(var.var_meta().file.as_deref(), Some(REPL_FILE));
    }

    #[test]
    fn renderer_output_is_attached_to_successes() {
        let evaluation = evaluator()
            .with_renderer(Arc::new(Renderer::new()))
            .evaluate("[1 \"<i>\"]");
        assert_eq!(evaluation.result_html.as_deref(), Some("[1 \"&lt;i&gt;\"]"));
    }

    #[test]
    fn records_keep_all_three_texts() {
        let record = Evaluation {
            result: "nil".into(),
            stdout: "out\n".into(),
            stderr: String::new(),
            result_html: None,
        }
        .into_record("(println \"out\")");
        assert_eq!(record.expression, "(println \"out\")");
        assert_eq!(record.result, "nil");
        assert_eq!(record.stdout, "out\n");
        assert_eq!(record.stderr, "");
    }
}
