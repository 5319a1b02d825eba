//! Behavioural properties of the evaluation and browsing paths

use quill_core::{
    pages, EvalOptions, Evaluator, HistoryLog, NamespaceBrowser, Renderer, RuntimeReflection,
};
use quill_lisp::{reader, Runtime, CORE_NS, USER_NS};
use std::sync::Arc;
use std::thread;

fn runtime() -> Arc<Runtime> {
    Arc::new(Runtime::new().expect("runtime bootstraps"))
}

fn browser(runtime: &Arc<Runtime>) -> NamespaceBrowser {
    NamespaceBrowser::new(Arc::new(RuntimeReflection::new(runtime.clone())))
}

// ============================================================================
// EVALUATION
// ============================================================================

#[test]
fn addition_yields_readable_three_and_no_output() {
    let evaluation = Evaluator::new(runtime(), EvalOptions::default()).evaluate("(+ 1 2)");
    assert_eq!(evaluation.result, "3");
    assert!(evaluation.stdout.is_empty());
    assert!(evaluation.stderr.is_empty());
}

#[test]
fn print_then_throw_fills_both_channels() {
    let evaluation = Evaluator::new(runtime(), EvalOptions::default())
        .evaluate("(do (println \"before\") (eprintln \"warning\") (throw \"failed\"))");
    assert_eq!(evaluation.result, "");
    assert_eq!(evaluation.stdout, "before\n");
    assert_eq!(evaluation.stderr, "warning\nUncaught throw: failed\n");
}

#[test]
fn results_read_back_as_equal_values() {
    let rt = runtime();
    let evaluator = Evaluator::new(rt.clone(), EvalOptions::default());
    for src in [
        "(list 1 2.5 \"s\\n\" :k 'sym nil true)",
        "(hash-map :a [1 2] :b {:c \"d\"})",
        "(range 5)",
        "(/ 1 3)",
    ] {
        let evaluation = evaluator.evaluate(src);
        let expected = rt.eval_str(src, USER_NS).unwrap();
        assert_eq!(reader::read_one(&evaluation.result).unwrap(), expected, "{src}");
    }
}

#[test]
fn concurrent_evaluations_keep_their_output_apart() {
    let evaluator = Arc::new(Evaluator::new(runtime(), EvalOptions::default()));
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let evaluator = evaluator.clone();
            thread::spawn(move || {
                evaluator.evaluate(&format!("(do (println \"out-{i}\") (eprintln \"err-{i}\") {i})"))
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let evaluation = handle.join().unwrap();
        assert_eq!(evaluation.result, i.to_string());
        assert_eq!(evaluation.stdout, format!("out-{i}\n"));
        assert_eq!(evaluation.stderr, format!("err-{i}\n"));
    }
}

// ============================================================================
// HISTORY
// ============================================================================

#[test]
fn many_concurrent_appends_produce_exactly_that_many_records() {
    const WRITERS: usize = 64;
    let rt = runtime();
    let evaluator = Arc::new(Evaluator::new(rt, EvalOptions::default()));
    let log = Arc::new(HistoryLog::new());

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let log = log.clone();
            let evaluator = evaluator.clone();
            thread::spawn(move || {
                let expression = format!("(+ {i} 0)");
                let record = evaluator.evaluate(&expression).into_record(expression);
                log.append(record).len()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap() >= 1);
    }

    let records = log.current();
    assert_eq!(records.len(), WRITERS);
    let mut results: Vec<usize> = records.iter().map(|r| r.result.parse().unwrap()).collect();
    results.sort_unstable();
    assert_eq!(results, (0..WRITERS).collect::<Vec<_>>());
}

#[test]
fn captured_markup_is_escaped_on_the_repl_page() {
    let log = HistoryLog::new();
    let evaluator = Evaluator::new(runtime(), EvalOptions::default());
    let expression = "(println \"<script>alert(1)</script>\")";
    let snapshot = log.append(evaluator.evaluate(expression).into_record(expression));

    let page = pages::repl_page(&snapshot).into_string();
    assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!page.contains("<script>"));
}

// ============================================================================
// RENDERING AND BROWSING
// ============================================================================

#[test]
fn nested_vector_renders_with_nested_brackets() {
    let html = Renderer::new().render(&reader::read_one("[1 [2 3] 4]").unwrap());
    let compact: String = html.as_str().split_whitespace().collect();
    assert_eq!(compact, "[1[23]4]");
}

#[test]
fn listing_namespaces_is_idempotent() {
    let rt = runtime();
    let browser = browser(&rt);
    let first = browser.list_namespaces();
    assert_eq!(first, browser.list_namespaces());
    assert_eq!(first, [CORE_NS, USER_NS]);
}

#[test]
fn describing_a_missing_symbol_is_not_found() {
    let rt = runtime();
    let err = browser(&rt)
        .describe_symbol("nonexistent.ns", "foo")
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn evaluated_definitions_become_browsable() {
    let rt = runtime();
    let evaluator = Evaluator::new(rt.clone(), EvalOptions::default());
    evaluator.evaluate("(do (ns demo.util) (defn clamp \"Clamp x into [lo, hi].\" [lo hi x] (max lo (min hi x))))");

    let browser = browser(&rt);
    assert!(browser.list_namespaces().contains(&"demo.util".to_string()));
    let clamp = browser.describe_symbol("demo.util", "clamp").unwrap();
    assert_eq!(clamp.doc(), Some("Clamp x into [lo, hi]."));
    assert!(clamp.source.as_deref().unwrap_or_default().contains("(defn clamp"));

    let listed: Vec<_> = browser
        .list_symbols("demo.util")
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(listed, ["clamp"]);
}
