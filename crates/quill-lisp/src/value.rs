//! Runtime values

use crate::error::{EvalError, Result};
use crate::eval::{Env, Interp};
use crate::namespace::{Namespace, Var};
use crate::printer;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Deepest collection nesting a value may have. Printing, rendering,
/// comparing and dropping recurse once per level.
pub const MAX_DATA_DEPTH: usize = 4096;

/// A possibly namespace-qualified name, shared by symbols and keywords.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    ns: Option<Arc<str>>,
    name: Arc<str>,
}

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self {
            ns: None,
            name: Arc::from(name),
        }
    }

    pub fn qualified(ns: &str, name: &str) -> Self {
        Self {
            ns: Some(Arc::from(ns)),
            name: Arc::from(name),
        }
    }

    /// Split `ns/name` at the first slash. A bare `/` is the division symbol.
    pub fn parse(text: &str) -> Self {
        match text.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() => Self::qualified(ns, name),
            _ => Self::new(text),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ns(&self) -> Option<&str> {
        self.ns.as_deref()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A Quill Lisp value.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Keyword(Symbol),
    Symbol(Symbol),
    List(Arc<Seq>),
    Vector(Arc<Seq>),
    Map(Arc<Entries>),
    Fn(Arc<Lambda>),
    Native(Arc<NativeFn>),
    Var(Arc<Var>),
    Namespace(Arc<Namespace>),
    Atom(Arc<Atom>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn symbol(text: &str) -> Self {
        Value::Symbol(Symbol::parse(text))
    }

    pub fn keyword(text: &str) -> Self {
        Value::Keyword(Symbol::parse(text))
    }

    /// Fails with [`EvalError::TooDeep`] past [`MAX_DATA_DEPTH`].
    pub fn list(items: Vec<Value>) -> Result<Self> {
        Ok(Value::List(Arc::new(Seq::new(items)?)))
    }

    pub fn vector(items: Vec<Value>) -> Result<Self> {
        Ok(Value::Vector(Arc::new(Seq::new(items)?)))
    }

    /// Build a map, later entries replacing earlier ones with an equal key.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Result<Self> {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match out.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }
        let depth = nesting(out.iter().flat_map(|(k, v)| [k, v]))?;
        Ok(Value::Map(Arc::new(Entries {
            entries: out,
            depth,
        })))
    }

    /// Collection levels in this value. Scalars, functions and atoms are 0.
    pub fn depth(&self) -> usize {
        match self {
            Value::List(items) | Value::Vector(items) => items.depth,
            Value::Map(entries) => entries.depth,
            _ => 0,
        }
    }

    /// Stable tag naming the runtime type; renderers dispatch on it.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
            Value::Fn(_) | Value::Native(_) => "fn",
            Value::Var(_) => "var",
            Value::Namespace(_) => "namespace",
            Value::Atom(_) => "atom",
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Elements of a list or vector, borrowed.
    pub fn as_sequential(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Look `key` up in a map value.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (
                Value::List(a) | Value::Vector(a),
                Value::List(b) | Value::Vector(b),
            ) => a.as_slice() == b.as_slice(),
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Value::Fn(a), Value::Fn(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            (Value::Var(a), Value::Var(b)) => Arc::ptr_eq(a, b),
            (Value::Namespace(a), Value::Namespace(b)) => Arc::ptr_eq(a, b),
            (Value::Atom(a), Value::Atom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn nesting<'a>(children: impl Iterator<Item = &'a Value>) -> Result<usize> {
    let depth = 1 + children.map(Value::depth).max().unwrap_or(0);
    if depth > MAX_DATA_DEPTH {
        return Err(EvalError::TooDeep(MAX_DATA_DEPTH));
    }
    Ok(depth)
}

/// Elements of a list or vector.
pub struct Seq {
    items: Vec<Value>,
    depth: usize,
}

impl Seq {
    fn new(items: Vec<Value>) -> Result<Self> {
        let depth = nesting(items.iter())?;
        Ok(Self { items, depth })
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

impl Deref for Seq {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.items
    }
}

/// Insertion-ordered map entries with unique keys.
pub struct Entries {
    entries: Vec<(Value, Value)>,
    depth: usize,
}

impl Deref for Entries {
    type Target = [(Value, Value)];

    fn deref(&self) -> &[(Value, Value)] {
        &self.entries
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&printer::pr_str(self))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// A closure created by `fn` or `defn`.
pub struct Lambda {
    pub name: Option<Arc<str>>,
    /// Bind `name` to the function itself inside its body (`(fn self [..] ..)`).
    pub self_named: bool,
    pub params: Vec<Arc<str>>,
    pub rest: Option<Arc<str>>,
    /// The parameter vector as written, reported as `:arglists`.
    pub params_form: Value,
    pub body: Arc<Vec<Value>>,
    pub env: Env,
    /// Namespace the closure resolves globals in.
    pub ns: Arc<Namespace>,
}

impl Lambda {
    pub fn accepts(&self, count: usize) -> bool {
        match self.rest {
            Some(_) => count >= self.params.len(),
            None => count == self.params.len(),
        }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}/{}", self.ns.name(), name),
            None => "fn".to_string(),
        }
    }
}

/// Argument counts a native accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
        }
    }
}

pub type NativeImpl = fn(&mut Interp<'_>, Vec<Value>) -> Result<Value>;

/// A function implemented in Rust.
pub struct NativeFn {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeImpl,
}

thread_local! {
    static RELEASING: RefCell<Option<Vec<Value>>> = const { RefCell::new(None) };
}

/// Drop `value` without recursing through the atoms and closures it owns.
///
/// Atom and environment frame destructors hand their contents here. The
/// outermost call drains them one at a time, so a chain of any length is
/// freed in constant stack.
pub(crate) fn release(value: Value) {
    let outermost = RELEASING.try_with(|slot| {
        let mut slot = slot.borrow_mut();
        match slot.as_mut() {
            Some(pending) => {
                pending.push(value);
                None
            }
            None => {
                *slot = Some(Vec::new());
                Some(value)
            }
        }
    });
    let Ok(Some(value)) = outermost else {
        return;
    };
    drop(value);
    while let Some(next) = RELEASING.with(|slot| slot.borrow_mut().as_mut().and_then(Vec::pop)) {
        drop(next);
    }
    RELEASING.with(|slot| *slot.borrow_mut() = None);
}

struct AtomCell {
    value: Value,
    version: u64,
}

/// Mutable reference cell shared between evaluations.
///
/// Every store bumps a version, and [`Atom::compare_and_set`] checks the
/// version rather than the value.
pub struct Atom(Mutex<AtomCell>);

impl Atom {
    pub fn new(value: Value) -> Self {
        Self(Mutex::new(AtomCell { value, version: 0 }))
    }

    pub fn get(&self) -> Value {
        self.0.lock().value.clone()
    }

    /// Current value and the version it was stored under.
    pub fn load(&self) -> (Value, u64) {
        let cell = self.0.lock();
        (cell.value.clone(), cell.version)
    }

    pub fn set(&self, value: Value) {
        let old = {
            let mut cell = self.0.lock();
            cell.version = cell.version.wrapping_add(1);
            std::mem::replace(&mut cell.value, value)
        };
        release(old);
    }

    /// Store `new` only if nothing was stored since `version` was loaded.
    pub fn compare_and_set(&self, version: u64, new: Value) -> bool {
        let old = {
            let mut cell = self.0.lock();
            if cell.version != version {
                return false;
            }
            cell.version = cell.version.wrapping_add(1);
            std::mem::replace(&mut cell.value, new)
        };
        release(old);
        true
    }
}

impl Drop for Atom {
    fn drop(&mut self) {
        release(std::mem::replace(&mut self.0.get_mut().value, Value::Nil));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_parse_splits_namespace() {
        let sym = Symbol::parse("quill.core/map");
        assert_eq!(sym.ns(), Some("quill.core"));
        assert_eq!(sym.name(), "map");

        let div = Symbol::parse("/");
        assert_eq!(div.ns(), None);
        assert_eq!(div.name(), "/");
    }

    #[test]
    fn lists_and_vectors_compare_by_elements() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]).unwrap();
        let vector = Value::vector(vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(list, vector);
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn map_equality_ignores_order_and_dedupes_keys() {
        let a = Value::map(vec![
            (Value::keyword("a"), Value::Int(1)),
            (Value::keyword("b"), Value::Int(2)),
            (Value::keyword("a"), Value::Int(3)),
        ])
        .unwrap();
        let b = Value::map(vec![
            (Value::keyword("b"), Value::Int(2)),
            (Value::keyword("a"), Value::Int(3)),
        ])
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(&Value::keyword("a")), Some(&Value::Int(3)));
    }

    #[test]
    fn truthiness_only_excludes_nil_and_false() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn collections_past_the_depth_limit_are_refused() {
        std::thread::Builder::new()
            .stack_size(32 * 1024 * 1024)
            .spawn(refuse_past_depth_limit)
            .unwrap()
            .join()
            .unwrap();
    }

    fn refuse_past_depth_limit() {
        let mut value = Value::Nil;
        for _ in 0..MAX_DATA_DEPTH {
            value = Value::vector(vec![value]).unwrap();
        }
        assert_eq!(value.depth(), MAX_DATA_DEPTH);
        assert!(matches!(
            Value::list(vec![value.clone()]),
            Err(EvalError::TooDeep(MAX_DATA_DEPTH))
        ));
        assert!(matches!(
            Value::map(vec![(Value::Nil, value)]),
            Err(EvalError::TooDeep(_))
        ));
        assert_eq!(Value::list(Vec::new()).unwrap().depth(), 1);
    }

    #[test]
    fn dropping_a_long_atom_chain_keeps_the_stack_flat() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut value = Value::Nil;
                for _ in 0..200_000 {
                    value = Value::Atom(Arc::new(Atom::new(value)));
                }
                drop(value);
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn compare_and_set_checks_the_version_not_the_value() {
        let atom = Atom::new(Value::Float(f64::NAN));
        let (current, version) = atom.load();
        assert_ne!(current, current.clone());
        assert!(atom.compare_and_set(version, Value::Int(1)));
        assert!(!atom.compare_and_set(version, Value::Int(2)));
        assert_eq!(atom.get(), Value::Int(1));
    }
}
