//! Natives interned into `quill.core`

use crate::error::{EvalError, Result};
use crate::eval::Interp;
use crate::io;
use crate::namespace::{Namespace, VarMeta};
use crate::printer::{pr_str, print_str};
use crate::reader;
use crate::value::{Arity, Atom, NativeFn, NativeImpl, Symbol, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Largest sequence `range` will materialize.
const MAX_RANGE: i64 = 10_000_000;

struct NativeDef {
    name: &'static str,
    arity: Arity,
    arglists: &'static str,
    doc: &'static str,
    func: NativeImpl,
}

const fn native(
    name: &'static str,
    arity: Arity,
    arglists: &'static str,
    doc: &'static str,
    func: NativeImpl,
) -> NativeDef {
    NativeDef {
        name,
        arity,
        arglists,
        doc,
        func,
    }
}

use Arity::{AtLeast, Between, Exact};

const NATIVES: &[NativeDef] = &[
    // arithmetic
    native("+", AtLeast(0), "([] [x] [x y & more])", "Returns the sum of nums. (+) returns 0.", add),
    native("-", AtLeast(1), "([x] [x y & more])", "If no ys are supplied, returns the negation of x, else subtracts the ys from x.", sub),
    native("*", AtLeast(0), "([] [x] [x y & more])", "Returns the product of nums. (*) returns 1.", mul),
    native("/", AtLeast(1), "([x] [x y & more])", "If no denominators are supplied, returns 1/numerator, else returns numerator divided by all of the denominators. Inexact integer division yields a float.", div),
    native("mod", Exact(2), "([num div])", "Modulus of num and div. Truncates toward negative infinity.", modulo),
    // comparison
    native("=", AtLeast(1), "([x] [x y & more])", "Equality. Returns true if x equals y, false if not.", eq),
    native("not=", AtLeast(1), "([x] [x y & more])", "Same as (not (= obj1 obj2)).", not_eq),
    native("<", AtLeast(1), "([x] [x y & more])", "Returns true if nums are in monotonically increasing order, otherwise false.", lt),
    native(">", AtLeast(1), "([x] [x y & more])", "Returns true if nums are in monotonically decreasing order, otherwise false.", gt),
    native("<=", AtLeast(1), "([x] [x y & more])", "Returns true if nums are in monotonically non-decreasing order, otherwise false.", le),
    native(">=", AtLeast(1), "([x] [x y & more])", "Returns true if nums are in monotonically non-increasing order, otherwise false.", ge),
    native("not", Exact(1), "([x])", "Returns true if x is logical false, false otherwise.", not),
    native("nil?", Exact(1), "([x])", "Returns true if x is nil, false otherwise.", is_nil),
    // strings and printing
    native("str", AtLeast(0), "([] [x] [x & ys])", "With no args, returns the empty string. With one arg x, returns x printed for display. (str nil) returns the empty string. With more than one arg, returns the concatenation of the str values of the args.", str),
    native("pr-str", AtLeast(0), "([& xs])", "Prints the objects readably to a string, separated by spaces.", pr_str_fn),
    native("prn", AtLeast(0), "([& more])", "Prints the objects readably to stdout, separated by spaces, followed by a newline.", prn),
    native("println", AtLeast(0), "([& more])", "Prints the objects for display to stdout, separated by spaces, followed by a newline.", println),
    native("print", AtLeast(0), "([& more])", "Prints the objects for display to stdout, separated by spaces.", print),
    native("eprintln", AtLeast(0), "([& more])", "Like println, but writes to stderr.", eprintln),
    native("read-string", Exact(1), "([s])", "Reads one object from the string s.", read_string),
    // collections
    native("list", AtLeast(0), "([& items])", "Creates a new list containing the items.", list),
    native("vector", AtLeast(0), "([& args])", "Creates a new vector containing the args.", vector),
    native("hash-map", AtLeast(0), "([& keyvals])", "Returns a new map with supplied mappings. If any keys are equal, they are handled as if by repeated uses of assoc.", hash_map),
    native("first", Exact(1), "([coll])", "Returns the first item in the collection. If coll is nil or empty, returns nil.", first),
    native("rest", Exact(1), "([coll])", "Returns a possibly empty list of the items after the first.", rest),
    native("next", Exact(1), "([coll])", "Returns a list of the items after the first. If there are no more items, returns nil.", next),
    native("cons", Exact(2), "([x seq])", "Returns a new list where x is the first element and seq is the rest.", cons),
    native("conj", AtLeast(1), "([coll x & xs])", "Returns a new collection with the xs 'added'. Lists grow at the front, vectors at the end, maps take [k v] entries. (conj nil item) returns (item).", conj),
    native("count", Exact(1), "([coll])", "Returns the number of items in the collection. (count nil) returns 0. Also works on strings.", count),
    native("nth", Between(2, 3), "([coll index] [coll index not-found])", "Returns the value at the index. Throws if index is out of bounds unless not-found is supplied.", nth),
    native("get", Between(2, 3), "([map key] [map key not-found])", "Returns the value mapped to key, not-found or nil if key not present. Vectors are looked up by index.", get),
    native("assoc", AtLeast(3), "([map key val & kvs])", "When applied to a map, returns a new map that contains the mapping of key(s) to val(s). When applied to a vector, returns a new vector that contains val at index.", assoc),
    native("dissoc", AtLeast(1), "([map & ks])", "Returns a new map that does not contain a mapping for key(s).", dissoc),
    native("keys", Exact(1), "([map])", "Returns a list of the map's keys, or nil.", keys),
    native("vals", Exact(1), "([map])", "Returns a list of the map's values, or nil.", vals),
    native("concat", AtLeast(0), "([& colls])", "Returns a list representing the concatenation of the elements in the supplied colls.", concat),
    native("reverse", Exact(1), "([coll])", "Returns a list of the items in coll in reverse order.", reverse),
    // higher order
    native("apply", AtLeast(2), "([f args] [f x & args])", "Applies fn f to the argument list formed by prepending intervening arguments to args.", apply),
    native("map", AtLeast(2), "([f coll] [f coll & colls])", "Returns a list consisting of the result of applying f to the first items of each coll, followed by applying f to the second items, until any one of the colls is exhausted.", map),
    native("filter", Exact(2), "([pred coll])", "Returns a list of the items in coll for which (pred item) returns logical true.", filter),
    native("reduce", Between(2, 3), "([f coll] [f val coll])", "f should be a function of 2 arguments. If val is not supplied, returns the result of applying f to the first 2 items in coll, then applying f to that result and the 3rd item, etc.", reduce),
    native("range", Between(1, 3), "([end] [start end] [start end step])", "Returns a list of integers from start (inclusive, default 0) to end (exclusive), by step (default 1).", range),
    // names
    native("keyword", Between(1, 2), "([name] [ns name])", "Returns a keyword with the given namespace and name.", keyword),
    native("symbol", Between(1, 2), "([name] [ns name])", "Returns a symbol with the given namespace and name.", symbol),
    native("name", Exact(1), "([x])", "Returns the name string of a string, symbol or keyword.", name),
    native("namespace", Exact(1), "([x])", "Returns the namespace string of a symbol or keyword, or nil if not present.", namespace),
    native("type", Exact(1), "([x])", "Returns the runtime type of x as a keyword.", type_of),
    // reflection
    native("meta", Exact(1), "([obj])", "Returns the metadata of obj, returns nil if there is no metadata.", meta),
    native("all-ns", Exact(0), "([])", "Returns a list of all namespaces.", all_ns),
    native("find-ns", Exact(1), "([sym])", "Returns the namespace named by the symbol or nil if it doesn't exist.", find_ns),
    native("ns-name", Exact(1), "([ns])", "Returns the name of the namespace, a symbol.", ns_name),
    native("ns-interns", Exact(1), "([ns])", "Returns a map of the intern mappings for the namespace.", ns_interns),
    // reference types
    native("atom", Exact(1), "([x])", "Creates and returns an atom with an initial value of x.", atom),
    native("deref", Exact(1), "([ref])", "Returns the current value of an atom or var. Reader macro: @ref", deref),
    native("reset!", Exact(2), "([atom newval])", "Sets the value of atom to newval without regard for the current value. Returns newval.", reset),
    native("swap!", AtLeast(2), "([atom f] [atom f & args])", "Atomically swaps the value of atom to be (apply f current-value-of-atom args). f may be called multiple times, and thus should be free of side effects. Returns the value that was swapped in.", swap),
];

/// Intern every native into `ns`.
pub(crate) fn install(ns: &Arc<Namespace>) -> Result<()> {
    for def in NATIVES {
        let arglists = reader::read_one(def.arglists)?;
        let native = NativeFn {
            name: def.name,
            arity: def.arity,
            func: def.func,
        };
        ns.intern(def.name).define(
            Some(Value::Native(Arc::new(native))),
            VarMeta {
                doc: Some(def.doc.to_string()),
                arglists: Some(arglists),
                ..VarMeta::default()
            },
        );
    }
    Ok(())
}

fn take<const N: usize>(args: Vec<Value>, name: &str) -> Result<[Value; N]> {
    args.try_into().map_err(|args: Vec<Value>| EvalError::Arity {
        name: format!("quill.core/{name}"),
        got: args.len(),
    })
}

/// Items of anything seqable, copied out.
fn seq_items(value: &Value) -> Result<Vec<Value>> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::List(items) | Value::Vector(items) => Ok(items.to_vec()),
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| Value::vector(vec![k.clone(), v.clone()]))
            .collect(),
        Value::Str(s) => Ok(s.chars().map(|c| Value::string(c.to_string())).collect()),
        other => Err(EvalError::expected("a sequence", other)),
    }
}

fn int_arg(value: &Value) -> Result<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::expected("integer", other)),
    }
}

// --- arithmetic -----------------------------------------------------------

#[derive(Clone, Copy)]
enum Num {
    I(i64),
    F(f64),
}

impl Num {
    fn of(value: &Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(Num::I(*n)),
            Value::Float(f) => Ok(Num::F(*f)),
            other => Err(EvalError::expected("number", other)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::I(n) => n as f64,
            Num::F(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::I(n) => Value::Int(n),
            Num::F(f) => Value::Float(f),
        }
    }
}

fn fold_numbers(init: Num, args: &[Value], op: fn(Num, Num) -> Result<Num>) -> Result<Value> {
    let mut acc = init;
    for arg in args {
        acc = op(acc, Num::of(arg)?)?;
    }
    Ok(acc.into_value())
}

fn add2(a: Num, b: Num) -> Result<Num> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => x.checked_add(y).map(Num::I).ok_or(EvalError::Overflow),
        (x, y) => Ok(Num::F(x.as_f64() + y.as_f64())),
    }
}

fn sub2(a: Num, b: Num) -> Result<Num> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => x.checked_sub(y).map(Num::I).ok_or(EvalError::Overflow),
        (x, y) => Ok(Num::F(x.as_f64() - y.as_f64())),
    }
}

fn mul2(a: Num, b: Num) -> Result<Num> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => x.checked_mul(y).map(Num::I).ok_or(EvalError::Overflow),
        (x, y) => Ok(Num::F(x.as_f64() * y.as_f64())),
    }
}

fn div2(a: Num, b: Num) -> Result<Num> {
    match (a, b) {
        (Num::I(_), Num::I(0)) => Err(EvalError::DivideByZero),
        (Num::I(x), Num::I(y)) if x % y == 0 => {
            x.checked_div(y).map(Num::I).ok_or(EvalError::Overflow)
        }
        (x, y) => Ok(Num::F(x.as_f64() / y.as_f64())),
    }
}

fn add(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    fold_numbers(Num::I(0), &args, add2)
}

fn sub(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match args.split_first() {
        Some((only, [])) => sub2(Num::I(0), Num::of(only)?).map(Num::into_value),
        Some((first, rest)) => fold_numbers(Num::of(first)?, rest, sub2),
        None => Ok(Value::Int(0)),
    }
}

fn mul(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    fold_numbers(Num::I(1), &args, mul2)
}

fn div(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match args.split_first() {
        Some((only, [])) => div2(Num::I(1), Num::of(only)?).map(Num::into_value),
        Some((first, rest)) => fold_numbers(Num::of(first)?, rest, div2),
        None => Ok(Value::Int(1)),
    }
}

fn modulo(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [num, div] = take::<2>(args, "mod")?;
    match (Num::of(&num)?, Num::of(&div)?) {
        (Num::I(_), Num::I(0)) => Err(EvalError::DivideByZero),
        (Num::I(n), Num::I(d)) => {
            let m = n.checked_rem(d).ok_or(EvalError::Overflow)?;
            Ok(Value::Int(if m != 0 && (m < 0) != (d < 0) { m + d } else { m }))
        }
        (n, d) => {
            let (n, d) = (n.as_f64(), d.as_f64());
            Ok(Value::Float(n - d * (n / d).floor()))
        }
    }
}

// --- comparison -----------------------------------------------------------

fn compare(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => Some(x.cmp(&y)),
        (x, y) => x.as_f64().partial_cmp(&y.as_f64()),
    }
}

fn monotonic(args: &[Value], holds: fn(Ordering) -> bool) -> Result<Value> {
    let nums = args.iter().map(Num::of).collect::<Result<Vec<_>>>()?;
    let ok = nums
        .windows(2)
        .all(|pair| compare(pair[0], pair[1]).is_some_and(holds));
    Ok(Value::Bool(ok))
}

fn lt(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    monotonic(&args, |o| o == Ordering::Less)
}

fn gt(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    monotonic(&args, |o| o == Ordering::Greater)
}

fn le(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    monotonic(&args, |o| o != Ordering::Greater)
}

fn ge(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    monotonic(&args, |o| o != Ordering::Less)
}

fn eq(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
}

fn not_eq(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    Ok(Value::Bool(!args.windows(2).all(|pair| pair[0] == pair[1])))
}

fn not(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [x] = take::<1>(args, "not")?;
    Ok(Value::Bool(!x.is_truthy()))
}

fn is_nil(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [x] = take::<1>(args, "nil?")?;
    Ok(Value::Bool(matches!(x, Value::Nil)))
}

// --- strings and printing -------------------------------------------------

fn joined(args: &[Value], printer: fn(&Value) -> String) -> String {
    args.iter().map(printer).collect::<Vec<_>>().join(" ")
}

fn str(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut out = String::new();
    for arg in &args {
        if !matches!(arg, Value::Nil) {
            out.push_str(&print_str(arg));
        }
    }
    Ok(Value::string(out))
}

fn pr_str_fn(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    Ok(Value::string(joined(&args, pr_str)))
}

fn prn(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    io::write_stdout(&format!("{}\n", joined(&args, pr_str)));
    Ok(Value::Nil)
}

fn println(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    io::write_stdout(&format!("{}\n", joined(&args, print_str)));
    Ok(Value::Nil)
}

fn print(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    io::write_stdout(&joined(&args, print_str));
    Ok(Value::Nil)
}

fn eprintln(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    io::write_stderr(&format!("{}\n", joined(&args, print_str)));
    Ok(Value::Nil)
}

fn read_string(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match take::<1>(args, "read-string")? {
        [Value::Str(s)] => Ok(reader::read_one(&s)?),
        [other] => Err(EvalError::expected("string", &other)),
    }
}

// --- collections ----------------------------------------------------------

fn list(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    Value::list(args)
}

fn vector(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    Value::vector(args)
}

fn pairs(args: Vec<Value>, form: &str) -> Result<Vec<(Value, Value)>> {
    if args.len() % 2 != 0 {
        return Err(EvalError::Type(format!(
            "{form} expects an even number of key/value arguments"
        )));
    }
    let mut iter = args.into_iter();
    let mut out = Vec::new();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        out.push((k, v));
    }
    Ok(out)
}

fn hash_map(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    Value::map(pairs(args, "hash-map")?)
}

fn first(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [coll] = take::<1>(args, "first")?;
    Ok(seq_items(&coll)?.into_iter().next().unwrap_or(Value::Nil))
}

fn rest(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [coll] = take::<1>(args, "rest")?;
    let items = seq_items(&coll)?;
    Value::list(items.into_iter().skip(1).collect())
}

fn next(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [coll] = take::<1>(args, "next")?;
    let items = seq_items(&coll)?;
    if items.len() <= 1 {
        Ok(Value::Nil)
    } else {
        Value::list(items.into_iter().skip(1).collect())
    }
}

fn cons(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [x, coll] = take::<2>(args, "cons")?;
    let mut items = vec![x];
    items.extend(seq_items(&coll)?);
    Value::list(items)
}

fn conj(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    let coll = args.next().unwrap_or(Value::Nil);
    match coll {
        Value::Nil | Value::List(_) => {
            let mut items = seq_items(&coll)?;
            for x in args {
                items.insert(0, x);
            }
            Value::list(items)
        }
        Value::Vector(items) => {
            let mut items = items.to_vec();
            items.extend(args);
            Value::vector(items)
        }
        Value::Map(entries) => {
            let mut entries = entries.to_vec();
            for entry in args {
                match entry.as_sequential() {
                    Some([k, v]) => entries.push((k.clone(), v.clone())),
                    _ => return Err(EvalError::expected("a [key value] vector", &entry)),
                }
            }
            Value::map(entries)
        }
        other => Err(EvalError::expected("a collection", &other)),
    }
}

fn count(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [coll] = take::<1>(args, "count")?;
    let n = match &coll {
        Value::Nil => 0,
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Vector(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => return Err(EvalError::expected("a countable collection", other)),
    };
    Ok(Value::Int(n as i64))
}

fn nth(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    let coll = args.next().unwrap_or(Value::Nil);
    let index = int_arg(&args.next().unwrap_or(Value::Nil))?;
    let not_found = args.next();
    let items = match &coll {
        Value::Map(_) => return Err(EvalError::expected("a sequential collection", &coll)),
        other => seq_items(other)?,
    };
    let found = usize::try_from(index).ok().and_then(|i| items.get(i).cloned());
    match (found, not_found) {
        (Some(value), _) => Ok(value),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(EvalError::Index {
            index,
            len: items.len(),
        }),
    }
}

fn get(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    let coll = args.next().unwrap_or(Value::Nil);
    let key = args.next().unwrap_or(Value::Nil);
    let not_found = args.next().unwrap_or(Value::Nil);
    let found = match (&coll, &key) {
        (Value::Map(_), key) => coll.get(key).cloned(),
        (Value::Vector(items), Value::Int(i)) => {
            usize::try_from(*i).ok().and_then(|i| items.get(i).cloned())
        }
        _ => None,
    };
    Ok(found.unwrap_or(not_found))
}

fn assoc(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    let coll = args.next().unwrap_or(Value::Nil);
    let kvs = pairs(args.collect(), "assoc")?;
    match coll {
        Value::Nil => Value::map(kvs),
        Value::Map(entries) => {
            let mut entries = entries.to_vec();
            entries.extend(kvs);
            Value::map(entries)
        }
        Value::Vector(items) => {
            let mut items = items.to_vec();
            for (k, v) in kvs {
                let index = int_arg(&k)?;
                match usize::try_from(index) {
                    Ok(i) if i < items.len() => items[i] = v,
                    Ok(i) if i == items.len() => items.push(v),
                    _ => {
                        return Err(EvalError::Index {
                            index,
                            len: items.len(),
                        })
                    }
                }
            }
            Value::vector(items)
        }
        other => Err(EvalError::expected("a map or vector", &other)),
    }
}

fn dissoc(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    match args.next().unwrap_or(Value::Nil) {
        Value::Nil => Ok(Value::Nil),
        Value::Map(entries) => {
            let removed: Vec<Value> = args.collect();
            Value::map(
                entries
                    .iter()
                    .filter(|(k, _)| !removed.contains(k))
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        }
        other => Err(EvalError::expected("a map", &other)),
    }
}

fn map_part(args: Vec<Value>, name: &str, pick: fn(&(Value, Value)) -> Value) -> Result<Value> {
    match take::<1>(args, name)? {
        [Value::Nil] => Ok(Value::Nil),
        [Value::Map(entries)] if entries.is_empty() => Ok(Value::Nil),
        [Value::Map(entries)] => Value::list(entries.iter().map(pick).collect()),
        [other] => Err(EvalError::expected("a map", &other)),
    }
}

fn keys(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    map_part(args, "keys", |(k, _)| k.clone())
}

fn vals(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    map_part(args, "vals", |(_, v)| v.clone())
}

fn concat(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut items = Vec::new();
    for coll in &args {
        items.extend(seq_items(coll)?);
    }
    Value::list(items)
}

fn reverse(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [coll] = take::<1>(args, "reverse")?;
    let mut items = seq_items(&coll)?;
    items.reverse();
    Value::list(items)
}

// --- higher order ---------------------------------------------------------

fn apply(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args;
    let spread = args.pop().unwrap_or(Value::Nil);
    let mut args = args.into_iter();
    let f = args.next().unwrap_or(Value::Nil);
    let mut call_args: Vec<Value> = args.collect();
    call_args.extend(seq_items(&spread)?);
    interp.apply(&f, call_args)
}

fn map(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    let f = args.next().unwrap_or(Value::Nil);
    let colls = args
        .map(|coll| seq_items(&coll))
        .collect::<Result<Vec<_>>>()?;
    let len = colls.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let call_args = colls.iter().map(|coll| coll[i].clone()).collect();
        out.push(interp.apply(&f, call_args)?);
    }
    Value::list(out)
}

fn filter(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [pred, coll] = take::<2>(args, "filter")?;
    let mut out = Vec::new();
    for item in seq_items(&coll)? {
        if interp.apply(&pred, vec![item.clone()])?.is_truthy() {
            out.push(item);
        }
    }
    Value::list(out)
}

fn reduce(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let (f, init, coll) = match <[Value; 2]>::try_from(args) {
        Ok([f, coll]) => (f, None, coll),
        Err(args) => {
            let [f, init, coll] = take::<3>(args, "reduce")?;
            (f, Some(init), coll)
        }
    };
    let mut items = seq_items(&coll)?.into_iter();
    let mut acc = match init {
        Some(init) => init,
        None => match items.next() {
            Some(first) => first,
            None => return interp.apply(&f, Vec::new()),
        },
    };
    for item in items {
        acc = interp.apply(&f, vec![acc, item])?;
    }
    Ok(acc)
}

fn range(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let nums = args.iter().map(int_arg).collect::<Result<Vec<_>>>()?;
    let (start, end, step) = match nums.as_slice() {
        [end] => (0, *end, 1),
        [start, end] => (*start, *end, 1),
        [start, end, step] => (*start, *end, *step),
        _ => {
            return Err(EvalError::Arity {
                name: "quill.core/range".into(),
                got: nums.len(),
            })
        }
    };
    if step == 0 {
        return Err(EvalError::Type("range step must not be zero".into()));
    }
    let span = (end as i128 - start as i128) / step as i128;
    if span > MAX_RANGE as i128 {
        return Err(EvalError::Type(format!(
            "range of {span} items exceeds the limit of {MAX_RANGE}"
        )));
    }
    let mut out = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        out.push(Value::Int(current));
        current = match current.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Value::list(out)
}

// --- names ----------------------------------------------------------------

fn name_text(value: &Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Keyword(sym) | Value::Symbol(sym) => Ok(sym.to_string()),
        other => Err(EvalError::expected("string, symbol or keyword", other)),
    }
}

fn make_name(args: &[Value]) -> Result<Symbol> {
    match args {
        [name] => Ok(Symbol::parse(&name_text(name)?)),
        [Value::Nil, name] => Ok(Symbol::new(&name_text(name)?)),
        [ns, name] => Ok(Symbol::qualified(&name_text(ns)?, &name_text(name)?)),
        _ => Err(EvalError::Type("expected (name) or (ns name)".into())),
    }
}

fn keyword(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    make_name(&args).map(Value::Keyword)
}

fn symbol(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    make_name(&args).map(Value::Symbol)
}

fn name(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match take::<1>(args, "name")? {
        [Value::Str(s)] => Ok(Value::Str(s)),
        [Value::Keyword(sym) | Value::Symbol(sym)] => Ok(Value::string(sym.name())),
        [other] => Err(EvalError::expected("string, symbol or keyword", &other)),
    }
}

fn namespace(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match take::<1>(args, "namespace")? {
        [Value::Keyword(sym) | Value::Symbol(sym)] => {
            Ok(sym.ns().map(Value::string).unwrap_or(Value::Nil))
        }
        [other] => Err(EvalError::expected("symbol or keyword", &other)),
    }
}

fn type_of(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [x] = take::<1>(args, "type")?;
    Ok(Value::keyword(x.type_tag()))
}

// --- reflection -----------------------------------------------------------

fn meta(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match take::<1>(args, "meta")? {
        [Value::Var(var)] => var.meta(),
        [_] => Ok(Value::Nil),
    }
}

fn all_ns(interp: &mut Interp<'_>, _: Vec<Value>) -> Result<Value> {
    Value::list(
        interp
            .runtime()
            .namespaces()
            .into_iter()
            .map(Value::Namespace)
            .collect(),
    )
}

fn namespace_arg(interp: &Interp<'_>, value: &Value) -> Result<Option<Arc<Namespace>>> {
    match value {
        Value::Namespace(ns) => Ok(Some(ns.clone())),
        Value::Symbol(sym) => Ok(interp.runtime().find_namespace(&sym.to_string())),
        other => Err(EvalError::expected("namespace or symbol", other)),
    }
}

fn find_ns(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [target] = take::<1>(args, "find-ns")?;
    Ok(namespace_arg(interp, &target)?
        .map(Value::Namespace)
        .unwrap_or(Value::Nil))
}

fn the_ns(interp: &Interp<'_>, target: &Value) -> Result<Arc<Namespace>> {
    namespace_arg(interp, target)?
        .ok_or_else(|| EvalError::Type(format!("No namespace: {} found", pr_str(target))))
}

fn ns_name(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [target] = take::<1>(args, "ns-name")?;
    let ns = the_ns(interp, &target)?;
    Ok(Value::Symbol(Symbol::new(ns.name())))
}

fn ns_interns(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [target] = take::<1>(args, "ns-interns")?;
    let ns = the_ns(interp, &target)?;
    Value::map(ns.interns().into_iter().map(|var| {
        (Value::Symbol(Symbol::new(var.name())), Value::Var(var))
    }))
}

// --- reference types ------------------------------------------------------

fn atom(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let [x] = take::<1>(args, "atom")?;
    Ok(Value::Atom(Arc::new(Atom::new(x))))
}

fn deref(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match take::<1>(args, "deref")? {
        [Value::Atom(atom)] => Ok(atom.get()),
        [Value::Var(var)] => var
            .get()
            .ok_or_else(|| EvalError::Unbound(var.symbol().to_string())),
        [other] => Err(EvalError::expected("atom or var", &other)),
    }
}

fn reset(_: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    match take::<2>(args, "reset!")? {
        [Value::Atom(atom), value] => {
            atom.set(value.clone());
            Ok(value)
        }
        [other, _] => Err(EvalError::expected("atom", &other)),
    }
}

fn swap(interp: &mut Interp<'_>, args: Vec<Value>) -> Result<Value> {
    let mut args = args.into_iter();
    let target = args.next().unwrap_or(Value::Nil);
    let f = args.next().unwrap_or(Value::Nil);
    let extra: Vec<Value> = args.collect();
    let atom = match target {
        Value::Atom(atom) => atom,
        other => return Err(EvalError::expected("atom", &other)),
    };
    loop {
        let (current, version) = atom.load();
        let mut call_args = vec![current];
        call_args.extend(extra.iter().cloned());
        let next = interp.apply(&f, call_args)?;
        if atom.compare_and_set(version, next.clone()) {
            return Ok(next);
        }
    }
}
