use crate::{Result, WebError};
use quill_config::QuillConfig;
use quill_core::{
    CoreError, EvalOptions, Evaluator, HistoryLog, NamespaceBrowser, ReflectionProvider, Renderer,
    RuntimeReflection,
};
use quill_lisp::{Runtime, CORE_NS};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything the handlers share. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
    pub history: Arc<HistoryLog>,
    pub browser: Arc<NamespaceBrowser>,
    pub renderer: Arc<Renderer>,
    pub config: Arc<QuillConfig>,
}

impl AppState {
    /// Bootstrap a fresh runtime and an empty history.
    pub fn new(config: QuillConfig) -> Result<Self> {
        if config.repl.max_depth == 0 {
            return Err(WebError::Config("repl.max_depth must be at least 1".into()));
        }
        if config.repl.default_namespace.trim().is_empty() {
            return Err(WebError::Config(
                "repl.default_namespace must not be empty".into(),
            ));
        }

        let runtime = Arc::new(Runtime::new().map_err(CoreError::from)?);
        let reflection: Arc<dyn ReflectionProvider> =
            Arc::new(RuntimeReflection::new(runtime.clone()));

        let renderer = Arc::new(Renderer::with_reflection(
            reflection.clone(),
            vec![config.repl.default_namespace.clone(), CORE_NS.to_string()],
        ));
        let options = EvalOptions {
            default_namespace: config.repl.default_namespace.clone(),
            max_depth: config.repl.max_depth,
        };
        let evaluator = Evaluator::new(runtime.clone(), options).with_renderer(renderer.clone());

        info!(
            namespaces = runtime.namespaces().len(),
            default_namespace = %config.repl.default_namespace,
            "Quill runtime ready"
        );

        Ok(Self {
            evaluator: Arc::new(evaluator),
            history: Arc::new(HistoryLog::new()),
            browser: Arc::new(NamespaceBrowser::new(reflection)),
            renderer,
            config: Arc::new(config),
        })
    }

    /// How long a request waits for its evaluation, if bounded.
    pub fn eval_timeout(&self) -> Option<Duration> {
        self.config.repl.eval_timeout_secs.map(Duration::from_secs)
    }
}
