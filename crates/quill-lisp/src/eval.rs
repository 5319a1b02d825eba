//! Tree-walking evaluator
//!
//! An [`Interp`] evaluates forms against a [`Runtime`] with a *current
//! namespace* that belongs to the interpreter, not to the runtime: `in-ns`
//! only affects the evaluation that calls it.

use crate::error::{EvalError, Result};
use crate::io;
use crate::namespace::{Namespace, VarMeta};
use crate::runtime::Runtime;
use crate::value::{Lambda, Symbol, Value};
use std::sync::Arc;

/// Default bound on nested form evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 2_000;

/// Immutable chain of local bindings.
#[derive(Clone, Default)]
pub struct Env(Option<Arc<Frame>>);

struct Frame {
    name: Arc<str>,
    value: Value,
    parent: Env,
}

impl Drop for Frame {
    fn drop(&mut self) {
        crate::value::release(std::mem::replace(&mut self.value, Value::Nil));
    }
}

impl Env {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn bind(&self, name: Arc<str>, value: Value) -> Env {
        Env(Some(Arc::new(Frame {
            name,
            value,
            parent: self.clone(),
        })))
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut current = &self.0;
        while let Some(frame) = current {
            if &*frame.name == name {
                return Some(&frame.value);
            }
            current = &frame.parent.0;
        }
        None
    }
}

/// Where the top-level form being evaluated came from.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub text: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
}

pub struct Interp<'rt> {
    rt: &'rt Runtime,
    ns: Arc<Namespace>,
    source: Option<SourceInfo>,
    depth: usize,
    max_depth: usize,
}

impl<'rt> Interp<'rt> {
    pub fn new(rt: &'rt Runtime, ns: Arc<Namespace>) -> Self {
        Self {
            rt,
            ns,
            source: None,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.rt
    }

    pub fn current_ns(&self) -> &Arc<Namespace> {
        &self.ns
    }

    /// Evaluate a top-level form. Vars it defines record `source`.
    pub fn eval_toplevel(&mut self, form: &Value, source: Option<SourceInfo>) -> Result<Value> {
        self.source = source;
        let result = self.eval(form, &Env::new());
        self.source = None;
        result
    }

    pub fn eval(&mut self, form: &Value, env: &Env) -> Result<Value> {
        match form {
            Value::Symbol(sym) => self.eval_symbol(sym, env),
            Value::List(items) if !items.is_empty() => {
                self.enter()?;
                let result = self.eval_list(items, env);
                self.depth -= 1;
                result
            }
            Value::Vector(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<Result<Vec<_>>>()?;
                Value::vector(items)
            }
            Value::Map(entries) => {
                let mut evaluated = Vec::with_capacity(entries.len());
                for (k, v) in entries.iter() {
                    evaluated.push((self.eval(k, env)?, self.eval(v, env)?));
                }
                Value::map(evaluated)
            }
            other => Ok(other.clone()),
        }
    }

    /// Call `f` with already evaluated arguments.
    pub fn apply(&mut self, f: &Value, args: Vec<Value>) -> Result<Value> {
        match f {
            Value::Fn(lambda) => self.apply_lambda(lambda, args),
            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(EvalError::Arity {
                        name: format!("quill.core/{}", native.name),
                        got: args.len(),
                    });
                }
                (native.func)(self, args)
            }
            Value::Keyword(_) | Value::Map(_) => {
                let (coll, key, default) = match (f, args.as_slice()) {
                    (Value::Keyword(_), [coll]) => (coll, f, Value::Nil),
                    (Value::Keyword(_), [coll, default]) => (coll, f, default.clone()),
                    (Value::Map(_), [key]) => (f, key, Value::Nil),
                    (Value::Map(_), [key, default]) => (f, key, default.clone()),
                    _ => {
                        return Err(EvalError::Arity {
                            name: crate::printer::pr_str(f),
                            got: args.len(),
                        })
                    }
                };
                Ok(coll.get(key).cloned().unwrap_or(default))
            }
            Value::Var(var) => {
                let target = var
                    .get()
                    .ok_or_else(|| EvalError::Unbound(var.symbol().to_string()))?;
                self.apply(&target, args)
            }
            other => Err(EvalError::NotCallable(other.type_tag())),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(EvalError::DepthExceeded(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn apply_lambda(&mut self, lambda: &Arc<Lambda>, mut args: Vec<Value>) -> Result<Value> {
        if !lambda.accepts(args.len()) {
            return Err(EvalError::Arity {
                name: lambda.display_name(),
                got: args.len(),
            });
        }
        let rest_args = args.split_off(lambda.params.len().min(args.len()));
        let rest_value = if rest_args.is_empty() {
            Value::Nil
        } else {
            Value::list(rest_args)?
        };
        self.enter()?;

        let mut env = lambda.env.clone();
        if let (true, Some(name)) = (lambda.self_named, &lambda.name) {
            env = env.bind(name.clone(), Value::Fn(lambda.clone()));
        }
        let mut args = args.into_iter();
        for param in &lambda.params {
            env = env.bind(param.clone(), args.next().unwrap_or(Value::Nil));
        }
        if let Some(rest) = &lambda.rest {
            env = env.bind(rest.clone(), rest_value);
        }

        let saved = std::mem::replace(&mut self.ns, lambda.ns.clone());
        let result = self.eval_body(&lambda.body, &env);
        self.ns = saved;
        self.depth -= 1;
        result
    }

    fn eval_symbol(&mut self, sym: &Symbol, env: &Env) -> Result<Value> {
        if sym.ns().is_none() {
            if let Some(value) = env.lookup(sym.name()) {
                return Ok(value.clone());
            }
        }
        let var = self
            .rt
            .resolve(&self.ns, sym)
            .ok_or_else(|| EvalError::Unresolved(sym.to_string()))?;
        var.get()
            .ok_or_else(|| EvalError::Unbound(var.symbol().to_string()))
    }

    fn eval_list(&mut self, items: &[Value], env: &Env) -> Result<Value> {
        let (head, args) = match items.split_first() {
            Some(split) => split,
            None => return Value::list(Vec::new()),
        };
        if let Value::Symbol(sym) = head {
            if sym.ns().is_none() {
                if let Some(result) = self.special_form(sym.name(), args, env) {
                    return result;
                }
            }
        }
        let f = self.eval(head, env)?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<Result<Vec<_>>>()?;
        self.apply(&f, args)
    }

    fn special_form(&mut self, name: &str, args: &[Value], env: &Env) -> Option<Result<Value>> {
        let result = match name {
            "quote" => match args {
                [form] => Ok(form.clone()),
                _ => Err(EvalError::syntax("quote", "expected exactly one form")),
            },
            "if" => self.eval_if(args, env),
            "do" => self.eval_body(args, env),
            "def" => self.eval_def(args, env),
            "defn" => self.eval_defn(args, env),
            "fn" => self.eval_fn(args, env),
            "let" => self.eval_let(args, env),
            "var" => self.eval_var(args),
            "and" => self.eval_and(args, env),
            "or" => self.eval_or(args, env),
            "when" => match args.split_first() {
                Some((test, body)) => match self.eval(test, env) {
                    Ok(v) if v.is_truthy() => self.eval_body(body, env),
                    Ok(_) => Ok(Value::Nil),
                    Err(e) => Err(e),
                },
                None => Err(EvalError::syntax("when", "missing test")),
            },
            "cond" => self.eval_cond(args, env),
            "try" => self.eval_try(args, env),
            "throw" => match args {
                [form] => self.eval(form, env).and_then(|v| Err(EvalError::Thrown(v))),
                _ => Err(EvalError::syntax("throw", "expected exactly one form")),
            },
            "in-ns" => match args {
                [form] => self
                    .eval(form, env)
                    .and_then(|target| self.switch_ns("in-ns", &target)),
                _ => Err(EvalError::syntax("in-ns", "expected a namespace symbol")),
            },
            "ns" => match args {
                [target] | [target, Value::Str(_)] => self.switch_ns("ns", target),
                _ => Err(EvalError::syntax("ns", "expected (ns name doc?)")),
            },
            "doc" => self.eval_doc(args),
            "source" => self.eval_source(args),
            _ => return None,
        };
        Some(result)
    }

    fn eval_body(&mut self, body: &[Value], env: &Env) -> Result<Value> {
        let mut last = Value::Nil;
        for form in body {
            last = self.eval(form, env)?;
        }
        Ok(last)
    }

    fn eval_if(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let (test, then, otherwise) = match args {
            [test, then] => (test, then, None),
            [test, then, otherwise] => (test, then, Some(otherwise)),
            _ => return Err(EvalError::syntax("if", "expected (if test then else?)")),
        };
        if self.eval(test, env)?.is_truthy() {
            self.eval(then, env)
        } else {
            match otherwise {
                Some(form) => self.eval(form, env),
                None => Ok(Value::Nil),
            }
        }
    }

    fn def_name(&self, form: &'static str, name: &Value) -> Result<String> {
        match name {
            Value::Symbol(sym) => match sym.ns() {
                None => Ok(sym.name().to_string()),
                Some(ns) if ns == self.ns.name() => Ok(sym.name().to_string()),
                Some(_) => Err(EvalError::syntax(
                    form,
                    format!("can't create defs outside of current ns: {sym}"),
                )),
            },
            other => Err(EvalError::syntax(
                form,
                format!("first argument must be a symbol, found {}", other.type_tag()),
            )),
        }
    }

    fn var_meta(&self, doc: Option<String>, arglists: Option<Value>) -> VarMeta {
        let mut meta = VarMeta {
            doc,
            arglists,
            ..VarMeta::default()
        };
        if let Some(source) = &self.source {
            meta.file = Some(source.file.clone());
            meta.line = Some(source.line);
            meta.column = Some(source.column);
            meta.source = Some(source.text.clone());
        }
        meta
    }

    fn eval_def(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let (name, doc, init) = match args {
            [name] => (name, None, None),
            [name, init] => (name, None, Some(init)),
            [name, Value::Str(doc), init] => (name, Some(doc.to_string()), Some(init)),
            _ => return Err(EvalError::syntax("def", "expected (def name doc? value?)")),
        };
        let name = self.def_name("def", name)?;
        // Interned first so the init form can refer to the var.
        let var = self.ns.intern(&name);
        let value = match init {
            Some(form) => Some(self.eval(form, env)?),
            None => None,
        };
        let arglists = match &value {
            Some(Value::Fn(lambda)) => Some(Value::list(vec![lambda.params_form.clone()])?),
            _ => None,
        };
        var.define(value, self.var_meta(doc, arglists));
        Ok(Value::Var(var))
    }

    fn eval_defn(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let (name_form, rest) = args
            .split_first()
            .ok_or_else(|| EvalError::syntax("defn", "missing name"))?;
        let name = self.def_name("defn", name_form)?;
        let (doc, rest) = match rest {
            [Value::Str(doc), tail @ ..] if !tail.is_empty() => (Some(doc.to_string()), tail),
            _ => (None, rest),
        };
        let (params, body) = rest
            .split_first()
            .ok_or_else(|| EvalError::syntax("defn", "missing parameter vector"))?;

        let var = self.ns.intern(&name);
        let lambda = self.make_lambda("defn", Some(name.as_str()), false, params, body, env)?;
        let arglists = Value::list(vec![lambda.params_form.clone()])?;
        var.define(
            Some(Value::Fn(Arc::new(lambda))),
            self.var_meta(doc, Some(arglists)),
        );
        Ok(Value::Var(var))
    }

    fn eval_fn(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let (name, rest) = match args {
            [Value::Symbol(sym), rest @ ..] if sym.ns().is_none() => (Some(sym.name()), rest),
            _ => (None, args),
        };
        let (params, body) = rest
            .split_first()
            .ok_or_else(|| EvalError::syntax("fn", "missing parameter vector"))?;
        let lambda = self.make_lambda("fn", name, name.is_some(), params, body, env)?;
        Ok(Value::Fn(Arc::new(lambda)))
    }

    fn make_lambda(
        &self,
        form: &'static str,
        name: Option<&str>,
        self_named: bool,
        params_form: &Value,
        body: &[Value],
        env: &Env,
    ) -> Result<Lambda> {
        let Value::Vector(items) = params_form else {
            return Err(EvalError::syntax(form, "parameters must be a vector"));
        };
        let mut params = Vec::with_capacity(items.len());
        let mut rest = None;
        let mut iter = items.iter();
        while let Some(item) = iter.next() {
            let name = param_name(form, item)?;
            if &*name == "&" {
                let rest_name = iter
                    .next()
                    .ok_or_else(|| EvalError::syntax(form, "missing name after &"))?;
                rest = Some(param_name(form, rest_name)?);
                if iter.next().is_some() {
                    return Err(EvalError::syntax(form, "only one parameter may follow &"));
                }
                break;
            }
            params.push(name);
        }

        Ok(Lambda {
            name: name.map(Arc::from),
            self_named,
            params,
            rest,
            params_form: params_form.clone(),
            body: Arc::new(body.to_vec()),
            env: env.clone(),
            ns: self.ns.clone(),
        })
    }

    fn eval_let(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let Some((Value::Vector(bindings), body)) = args.split_first() else {
            return Err(EvalError::syntax("let", "bindings must be a vector"));
        };
        if bindings.len() % 2 != 0 {
            return Err(EvalError::syntax(
                "let",
                "bindings must contain an even number of forms",
            ));
        }
        let mut local = env.clone();
        for pair in bindings.chunks(2) {
            let name = param_name("let", &pair[0])?;
            let value = self.eval(&pair[1], &local)?;
            local = local.bind(name, value);
        }
        self.eval_body(body, &local)
    }

    fn eval_var(&mut self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::Symbol(sym)] => self
                .rt
                .resolve(&self.ns, sym)
                .map(Value::Var)
                .ok_or_else(|| EvalError::Unresolved(sym.to_string())),
            _ => Err(EvalError::syntax("var", "expected a symbol")),
        }
    }

    fn eval_and(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let mut last = Value::Bool(true);
        for form in args {
            last = self.eval(form, env)?;
            if !last.is_truthy() {
                break;
            }
        }
        Ok(last)
    }

    fn eval_or(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let mut last = Value::Nil;
        for form in args {
            last = self.eval(form, env)?;
            if last.is_truthy() {
                break;
            }
        }
        Ok(last)
    }

    fn eval_cond(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        if args.len() % 2 != 0 {
            return Err(EvalError::syntax(
                "cond",
                "requires an even number of forms",
            ));
        }
        for pair in args.chunks(2) {
            if self.eval(&pair[0], env)?.is_truthy() {
                return self.eval(&pair[1], env);
            }
        }
        Ok(Value::Nil)
    }

    fn eval_try(&mut self, args: &[Value], env: &Env) -> Result<Value> {
        let catch = match args.last() {
            Some(Value::List(items)) if is_symbol(items.first(), "catch") => Some(items),
            _ => None,
        };
        let body = if catch.is_some() {
            &args[..args.len() - 1]
        } else {
            args
        };

        match (self.eval_body(body, env), catch) {
            (Ok(value), _) => Ok(value),
            (Err(err), Some(clause)) => {
                let (binding, handler) = match clause.as_slice() {
                    [_, binding, handler @ ..] => (param_name("catch", binding)?, handler),
                    _ => return Err(EvalError::syntax("catch", "expected (catch name body...)")),
                };
                let local = env.bind(binding, err.caught_value());
                self.eval_body(handler, &local)
            }
            (Err(err), None) => Err(err),
        }
    }

    fn switch_ns(&mut self, form: &'static str, target: &Value) -> Result<Value> {
        let Value::Symbol(sym) = target else {
            return Err(EvalError::syntax(form, "namespace name must be a symbol"));
        };
        let name = sym.to_string();
        self.ns = self.rt.find_or_create_namespace(&name);
        Ok(Value::Namespace(self.ns.clone()))
    }

    fn eval_doc(&mut self, args: &[Value]) -> Result<Value> {
        let [Value::Symbol(sym)] = args else {
            return Err(EvalError::syntax("doc", "expected a symbol"));
        };
        if let Some(var) = self.rt.resolve(&self.ns, sym) {
            let meta = var.var_meta();
            let mut text = format!("-------------------------\n{}\n", var.symbol());
            if let Some(arglists) = &meta.arglists {
                text.push_str(&crate::printer::pr_str(arglists));
                text.push('\n');
            }
            if let Some(doc) = &meta.doc {
                text.push_str("  ");
                text.push_str(doc);
                text.push('\n');
            }
            io::write_stdout(&text);
        }
        Ok(Value::Nil)
    }

    fn eval_source(&mut self, args: &[Value]) -> Result<Value> {
        let [Value::Symbol(sym)] = args else {
            return Err(EvalError::syntax("source", "expected a symbol"));
        };
        match self.rt.resolve(&self.ns, sym).and_then(|var| var.source()) {
            Some(source) => io::write_stdout(&format!("{source}\n")),
            None => io::write_stdout("Source not found\n"),
        }
        Ok(Value::Nil)
    }
}

fn is_symbol(value: Option<&Value>, name: &str) -> bool {
    matches!(value, Some(Value::Symbol(sym)) if sym.ns().is_none() && sym.name() == name)
}

fn param_name(form: &'static str, value: &Value) -> Result<Arc<str>> {
    match value {
        Value::Symbol(sym) if sym.ns().is_none() => Ok(Arc::from(sym.name())),
        other => Err(EvalError::syntax(
            form,
            format!("binding names must be unqualified symbols, found {}", crate::printer::pr_str(other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::{io, printer, reader, Interp, Runtime, USER_NS};

    fn eval(rt: &Runtime, src: &str) -> crate::Result<String> {
        rt.eval_str(src, USER_NS).map(|v| printer::pr_str(&v))
    }

    #[test]
    fn special_forms_evaluate() {
        let rt = Runtime::new().unwrap();
        assert_eq!(eval(&rt, "(if nil 1 2)").unwrap(), "2");
        assert_eq!(eval(&rt, "(let [a 1 b (+ a 1)] (* a b))").unwrap(), "2");
        assert_eq!(eval(&rt, "(and 1 nil 2)").unwrap(), "nil");
        assert_eq!(eval(&rt, "(or nil false 3)").unwrap(), "3");
        assert_eq!(eval(&rt, "(cond false 1 :else 2)").unwrap(), "2");
        assert_eq!(eval(&rt, "'(a b)").unwrap(), "(a b)");
        assert_eq!(eval(&rt, "((fn [& xs] xs) 1 2)").unwrap(), "(1 2)");
    }

    #[test]
    fn named_fn_can_recurse() {
        let rt = Runtime::new().unwrap();
        let src = "((fn fact [n] (if (= n 0) 1 (* n (fact (- n 1))))) 5)";
        assert_eq!(eval(&rt, src).unwrap(), "120");
    }

    #[test]
    fn try_catches_thrown_values_and_failures() {
        let rt = Runtime::new().unwrap();
        assert_eq!(eval(&rt, "(try (throw :boom) (catch e e))").unwrap(), ":boom");
        assert_eq!(
            eval(&rt, "(try (undefined-thing) (catch e e))").unwrap(),
            "\"Unable to resolve symbol: undefined-thing in this context\""
        );
    }

    #[test]
    fn depth_limit_is_an_error_not_a_crash() {
        let rt = Runtime::new().unwrap();
        let form = reader::read_one("((fn f [n] (f (+ n 1))) 0)").unwrap();
        let ns = rt.find_or_create_namespace(USER_NS);
        let err = Interp::new(&rt, ns)
            .with_max_depth(50)
            .eval_toplevel(&form, None)
            .unwrap_err();
        assert!(matches!(err, crate::EvalError::DepthExceeded(50)));
    }

    #[test]
    fn long_closure_chains_drop_in_constant_stack() {
        let rt = Runtime::new().unwrap();
        let src = "(do (reduce (fn [f _] (fn [] f)) nil (range 200000)) :done)";
        assert_eq!(eval(&rt, src).unwrap(), ":done");
    }

    #[test]
    fn in_ns_only_affects_the_current_evaluation() {
        let rt = Runtime::new().unwrap();
        eval(&rt, "(do (in-ns 'scratch) (def x 1))").unwrap();
        assert!(rt.find_namespace("scratch").unwrap().lookup("x").is_some());
        assert!(rt.find_namespace(USER_NS).unwrap().lookup("x").is_none());
    }

    #[test]
    fn doc_and_source_print_to_stdout() {
        let rt = Runtime::new().unwrap();
        let captured = io::capture_output(|| eval(&rt, "(source inc)"));
        assert_eq!(captured.value.unwrap(), "nil");
        assert!(captured.stdout.starts_with("(defn inc"));

        let captured = io::capture_output(|| eval(&rt, "(doc first)"));
        assert!(captured.stdout.contains("quill.core/first"));
        assert!(captured.stdout.contains("([coll])"));
    }

    #[test]
    fn defs_outside_current_namespace_are_rejected() {
        let rt = Runtime::new().unwrap();
        let err = eval(&rt, "(def quill.core/x 1)").unwrap_err();
        assert!(err.to_string().contains("outside of current ns"));
    }
}
