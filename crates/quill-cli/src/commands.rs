use anyhow::{Context, Result};
use quill_config::QuillConfig;
use quill_core::{EvalOptions, Evaluation, Evaluator};
use quill_lisp::Runtime;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

pub async fn serve(config: QuillConfig) -> Result<()> {
    quill_web::start_server(config)
        .await
        .context("Quill server failed")
}

/// Evaluate against a fresh runtime, exactly as a REPL submission would.
pub fn eval(config: &QuillConfig, expr: &str) -> Result<Evaluation> {
    let runtime = Runtime::new().context("Failed to bootstrap the Lisp runtime")?;
    let options = EvalOptions {
        default_namespace: config.repl.default_namespace.clone(),
        max_depth: config.repl.max_depth,
    };
    let evaluator = Evaluator::new(Arc::new(runtime), options);
    debug!(expression = expr, "Evaluating from the command line");
    Ok(evaluator.evaluate(expr))
}

/// Captured stdout, then the result line, then captured stderr.
pub fn print_evaluation(
    evaluation: &Evaluation,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    out.write_all(evaluation.stdout.as_bytes())?;
    if !evaluation.result.is_empty() {
        writeln!(out, "{}", evaluation.result)?;
    }
    err.write_all(evaluation.stderr.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(expr: &str) -> (String, String) {
        let evaluation = eval(&QuillConfig::default(), expr).unwrap();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        print_evaluation(&evaluation, &mut out, &mut err).unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn result_follows_captured_output() {
        let (out, err) = printed("(do (println \"side\") (+ 1 2))");
        assert_eq!(out, "side\n3\n");
        assert_eq!(err, "");
    }

    #[test]
    fn failures_print_only_to_stderr() {
        let (out, err) = printed("(undefined-thing)");
        assert_eq!(out, "");
        assert!(err.contains("undefined-thing"));
    }
}
