//! Reflection over loaded namespaces

use quill_lisp::{Runtime, Value, Var};
use std::sync::Arc;

/// What reflection knows about one interned name.
#[derive(Debug, Clone)]
pub struct SymbolDescriptor {
    pub namespace: String,
    pub name: String,
    /// Metadata entries in the order the runtime reports them.
    pub meta: Vec<(Value, Value)>,
    pub source: Option<String>,
}

impl SymbolDescriptor {
    /// Metadata value under the keyword `:key`.
    pub fn meta_value(&self, key: &str) -> Option<&Value> {
        let key = Value::keyword(key);
        self.meta.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn doc(&self) -> Option<&str> {
        match self.meta_value("doc") {
            Some(Value::Str(doc)) => Some(doc.as_ref()),
            _ => None,
        }
    }
}

/// The three questions the browser and renderer ask of a live runtime.
pub trait ReflectionProvider: Send + Sync {
    /// Names of every loaded namespace.
    fn namespaces(&self) -> Vec<String>;

    /// Every name interned in `namespace`, or `None` if it is not loaded.
    fn symbols(&self, namespace: &str) -> Option<Vec<SymbolDescriptor>>;

    /// One interned name, or `None` if the namespace or the name is missing.
    fn describe(&self, namespace: &str, symbol: &str) -> Option<SymbolDescriptor>;
}

/// [`ReflectionProvider`] backed by a Quill Lisp [`Runtime`].
pub struct RuntimeReflection {
    runtime: Arc<Runtime>,
}

impl RuntimeReflection {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }
}

fn descriptor(var: &Var) -> SymbolDescriptor {
    let meta = match var.meta() {
        Ok(Value::Map(entries)) => entries.to_vec(),
        _ => Vec::new(),
    };
    SymbolDescriptor {
        namespace: var.ns_name().to_string(),
        name: var.name().to_string(),
        meta,
        source: var.source(),
    }
}

impl ReflectionProvider for RuntimeReflection {
    fn namespaces(&self) -> Vec<String> {
        self.runtime
            .namespaces()
            .iter()
            .map(|ns| ns.name().to_string())
            .collect()
    }

    fn symbols(&self, namespace: &str) -> Option<Vec<SymbolDescriptor>> {
        let ns = self.runtime.find_namespace(namespace)?;
        Some(ns.interns().iter().map(|var| descriptor(var)).collect())
    }

    fn describe(&self, namespace: &str, symbol: &str) -> Option<SymbolDescriptor> {
        let var = self.runtime.find_namespace(namespace)?.lookup(symbol)?;
        Some(descriptor(&var))
    }
}
