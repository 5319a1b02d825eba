//! Namespaces and the vars interned in them

use crate::error::Result;
use crate::value::{Symbol, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// A named table of vars.
pub struct Namespace {
    name: Arc<str>,
    mappings: RwLock<BTreeMap<Arc<str>, Arc<Var>>>,
}

impl Namespace {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Arc::from(name),
            mappings: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Find or create the var for `name`.
    pub fn intern(self: &Arc<Self>, name: &str) -> Arc<Var> {
        if let Some(var) = self.lookup(name) {
            return var;
        }
        let mut mappings = self.mappings.write();
        mappings
            .entry(Arc::from(name))
            .or_insert_with(|| {
                Arc::new(Var {
                    ns: Arc::downgrade(self),
                    ns_name: self.name.clone(),
                    name: Arc::from(name),
                    root: RwLock::new(None),
                    meta: RwLock::new(VarMeta::default()),
                })
            })
            .clone()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Var>> {
        self.mappings.read().get(name).cloned()
    }

    /// Every interned var, ordered by name.
    pub fn interns(&self) -> Vec<Arc<Var>> {
        self.mappings.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("vars", &self.len())
            .finish()
    }
}

/// Descriptive data recorded when a var is defined.
#[derive(Debug, Clone, Default)]
pub struct VarMeta {
    pub doc: Option<String>,
    /// List of parameter vectors, e.g. `([x] [x & more])`.
    pub arglists: Option<Value>,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    /// Text of the top-level form that defined the var.
    pub source: Option<String>,
}

/// A namespace-owned, named, rebindable slot.
pub struct Var {
    ns: Weak<Namespace>,
    ns_name: Arc<str>,
    name: Arc<str>,
    root: RwLock<Option<Value>>,
    meta: RwLock<VarMeta>,
}

impl Var {
    pub fn ns_name(&self) -> &str {
        &self.ns_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::qualified(&self.ns_name, &self.name)
    }

    pub fn namespace(&self) -> Option<Arc<Namespace>> {
        self.ns.upgrade()
    }

    /// The root value, or `None` while unbound.
    pub fn get(&self) -> Option<Value> {
        self.root.read().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.root.read().is_some()
    }

    /// (Re)define the var. `None` leaves an existing root untouched, like `(def x)`.
    pub fn define(&self, value: Option<Value>, meta: VarMeta) {
        if let Some(value) = value {
            *self.root.write() = Some(value);
        }
        *self.meta.write() = meta;
    }

    pub fn source(&self) -> Option<String> {
        self.meta.read().source.clone()
    }

    pub fn doc(&self) -> Option<String> {
        self.meta.read().doc.clone()
    }

    pub fn var_meta(&self) -> VarMeta {
        self.meta.read().clone()
    }

    /// Metadata as a language-level map; always carries `:ns` and `:name`.
    pub fn meta(&self) -> Result<Value> {
        let meta = self.meta.read();
        let mut entries = Vec::with_capacity(7);
        if let Some(ns) = self.namespace() {
            entries.push((Value::keyword("ns"), Value::Namespace(ns)));
        }
        entries.push((Value::keyword("name"), Value::Symbol(Symbol::new(&self.name))));
        if let Some(arglists) = &meta.arglists {
            entries.push((Value::keyword("arglists"), arglists.clone()));
        }
        if let Some(doc) = &meta.doc {
            entries.push((Value::keyword("doc"), Value::string(doc)));
        }
        if let Some(file) = &meta.file {
            entries.push((Value::keyword("file"), Value::string(file)));
        }
        if let Some(line) = meta.line {
            entries.push((Value::keyword("line"), Value::Int(line as i64)));
        }
        if let Some(column) = meta.column {
            entries.push((Value::keyword("column"), Value::Int(column as i64)));
        }
        Value::map(entries)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#'{}/{}", self.ns_name, self.name)
    }
}
