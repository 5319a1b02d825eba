//! Value serialization
//!
//! [`pr_str`] produces *readable* text: for plain data (nil, booleans,
//! numbers, strings, keywords, symbols, lists, vectors, maps) reading the
//! output back with [`crate::reader::read_one`] yields an equal value.
//! [`print_str`] is the display form used by `str` and `println`, where
//! strings appear without quotes.

use crate::value::Value;
use std::fmt::Write;

pub fn pr_str(value: &Value) -> String {
    let mut out = String::new();
    Printer { readably: true, in_atom: false }.write(&mut out, value);
    out
}

pub fn print_str(value: &Value) -> String {
    let mut out = String::new();
    Printer { readably: false, in_atom: false }.write(&mut out, value);
    out
}

struct Printer {
    readably: bool,
    in_atom: bool,
}

impl Printer {
    fn write(&mut self, out: &mut String, value: &Value) {
        match value {
            Value::Nil => out.push_str("nil"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Float(f) => write_float(out, *f),
            Value::Str(s) if self.readably => write_escaped(out, s),
            Value::Str(s) => out.push_str(s),
            Value::Keyword(sym) => {
                let _ = write!(out, ":{sym}");
            }
            Value::Symbol(sym) => {
                let _ = write!(out, "{sym}");
            }
            Value::List(items) => self.write_seq(out, "(", items, ")"),
            Value::Vector(items) => self.write_seq(out, "[", items, "]"),
            Value::Map(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(out, k);
                    out.push(' ');
                    self.write(out, v);
                }
                out.push('}');
            }
            Value::Fn(lambda) => {
                let _ = write!(out, "#function[{}]", lambda.display_name());
            }
            Value::Native(native) => {
                let _ = write!(out, "#function[quill.core/{}]", native.name);
            }
            Value::Var(var) => {
                let _ = write!(out, "#'{}/{}", var.ns_name(), var.name());
            }
            Value::Namespace(ns) => {
                let _ = write!(out, "#namespace[{}]", ns.name());
            }
            // An atom may hold itself; only the outermost one shows contents.
            Value::Atom(_) if self.in_atom => out.push_str("#atom[...]"),
            Value::Atom(atom) => {
                out.push_str("#atom[");
                self.in_atom = true;
                self.write(out, &atom.get());
                self.in_atom = false;
                out.push(']');
            }
        }
    }

    fn write_seq(&mut self, out: &mut String, open: &str, items: &[Value], close: &str) {
        out.push_str(open);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            self.write(out, item);
        }
        out.push_str(close);
    }
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("##NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "##Inf" } else { "##-Inf" });
    } else {
        // Debug keeps a `.0` on whole numbers and switches to exponents at the extremes.
        let _ = write!(out, "{f:?}");
    }
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}
