use crate::error::Result;
use crate::eval::{Interp, SourceInfo};
use crate::namespace::{Namespace, Var};
use crate::reader;
use crate::stdlib;
use crate::value::{Symbol, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Namespace holding the natives and the prelude; referred by every namespace.
pub const CORE_NS: &str = "quill.core";
/// Namespace evaluations start in unless told otherwise.
pub const USER_NS: &str = "user";

/// Core functions written in Quill Lisp itself, so `source` can show them.
const PRELUDE: &str = include_str!("prelude.quill");
const PRELUDE_FILE: &str = "quill/core.quill";

/// The set of loaded namespaces.
pub struct Runtime {
    namespaces: RwLock<BTreeMap<Arc<str>, Arc<Namespace>>>,
    core: Arc<Namespace>,
}

impl Runtime {
    /// Bootstrap `quill.core` and `user`.
    pub fn new() -> Result<Self> {
        let core = Namespace::new(CORE_NS);
        let mut namespaces = BTreeMap::new();
        namespaces.insert(Arc::from(CORE_NS), core.clone());
        let runtime = Self {
            namespaces: RwLock::new(namespaces),
            core,
        };

        stdlib::install(&runtime.core)?;
        runtime.load_str(PRELUDE, CORE_NS, PRELUDE_FILE)?;
        runtime.find_or_create_namespace(USER_NS);

        debug!(
            core_vars = runtime.core.len(),
            "Bootstrapped Quill runtime"
        );
        Ok(runtime)
    }

    pub fn core(&self) -> &Arc<Namespace> {
        &self.core
    }

    pub fn find_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.read().get(name).cloned()
    }

    pub fn find_or_create_namespace(&self, name: &str) -> Arc<Namespace> {
        if let Some(ns) = self.find_namespace(name) {
            return ns;
        }
        self.namespaces
            .write()
            .entry(Arc::from(name))
            .or_insert_with(|| Namespace::new(name))
            .clone()
    }

    /// Every loaded namespace, ordered by name.
    pub fn namespaces(&self) -> Vec<Arc<Namespace>> {
        self.namespaces.read().values().cloned().collect()
    }

    /// Resolve `sym` as seen from `current`: qualified names go to their
    /// namespace, bare names try `current` and then `quill.core`.
    pub fn resolve(&self, current: &Namespace, sym: &Symbol) -> Option<Arc<Var>> {
        match sym.ns() {
            Some(ns) => self.find_namespace(ns)?.lookup(sym.name()),
            None => current
                .lookup(sym.name())
                .or_else(|| self.core.lookup(sym.name())),
        }
    }

    /// Read and evaluate exactly one form in namespace `ns`.
    pub fn eval_str(&self, src: &str, ns: &str) -> Result<Value> {
        let form = reader::read_one(src)?;
        let source = SourceInfo {
            text: src.trim().to_string(),
            file: "REPL".to_string(),
            line: 1,
            column: 1,
        };
        Interp::new(self, self.find_or_create_namespace(ns)).eval_toplevel(&form, Some(source))
    }

    /// Evaluate every form of `src` in order, returning the last value.
    pub fn load_str(&self, src: &str, ns: &str, file: &str) -> Result<Value> {
        let forms = reader::read_all(src)?;
        let mut interp = Interp::new(self, self.find_or_create_namespace(ns));
        let mut last = Value::Nil;
        for form in forms {
            let source = SourceInfo {
                text: src[form.span.clone()].to_string(),
                file: file.to_string(),
                line: form.line,
                column: form.column,
            };
            last = interp.eval_toplevel(&form.value, Some(source))?;
        }
        Ok(last)
    }
}
