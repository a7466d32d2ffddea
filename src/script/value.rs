//! Runtime values of plain script.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::ast::{Expr, Function};
use super::context::{Context, ScopeRef};
use super::printer;
use crate::error::RuntimeError;

/// Nesting depth past which `inspect` abbreviates arrays.
const INSPECT_DEPTH: usize = 2;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(ArrayRef),
    Function(Rc<Closure>),
    Native(Rc<NativeFunction>),
}

/// A script function together with the scope it was created in.
pub struct Closure {
    pub function: Rc<Function>,
    pub scope: ScopeRef,
}

impl Closure {
    pub fn name(&self) -> Option<&str> {
        self.function.name.as_deref()
    }
}

type ArrayRef = Rc<RefCell<Vec<Value>>>;

pub type NativeFn = fn(&mut Context, &[Value]) -> Result<Value, RuntimeError>;

/// A global implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Function(_) | Value::Native(_) => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_string()),
            Value::Function(_) | Value::Native(_) => f64::NAN,
        }
    }

    /// Reduces arrays to their string form; other values pass through.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) => Value::str(&self.to_string()),
            other => other.clone(),
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(_), Value::Str(_)) | (Value::Str(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Array(_), Value::Array(_)) => self.strict_equals(other),
            (Value::Array(_), _) => self.to_primitive().loose_equals(other),
            (_, Value::Array(_)) => self.loose_equals(&other.to_primitive()),
            _ => self.strict_equals(other),
        }
    }

    /// Developer-facing rendering used when the REPL echoes a result.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        self.inspect_into(&mut out, 0);
        out
    }

    fn inspect_into(&self, out: &mut String, depth: usize) {
        match self {
            Value::Str(s) => {
                out.push('\'');
                for ch in s.chars() {
                    match ch {
                        '\'' => out.push_str("\\'"),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        c => out.push(c),
                    }
                }
                out.push('\'');
            }
            Value::Array(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    out.push_str("[]");
                } else if depth > INSPECT_DEPTH {
                    out.push_str("[Array]");
                } else {
                    out.push_str("[ ");
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        item.inspect_into(out, depth + 1);
                    }
                    out.push_str(" ]");
                }
            }
            Value::Function(closure) => match closure.name() {
                Some(name) => out.push_str(&format!("[Function: {name}]")),
                None => out.push_str("[Function (anonymous)]"),
            },
            Value::Native(native) => out.push_str(&format!("[Function: {}]", native.name)),
            other => out.push_str(&other.to_string()),
        }
    }
}

/// String conversion as performed by `+` and `print`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                let mut out = String::new();
                join_into(items, &mut out, &mut Vec::new());
                f.write_str(&out)
            }
            Value::Function(closure) => {
                f.write_str(&printer::print_expr(&Expr::Function(closure.function.clone())))
            }
            Value::Native(native) => write!(f, "function {}() {{ [native code] }}", native.name),
        }
    }
}

/// Joins array elements with commas. An array already being joined further
/// up renders as the empty string.
fn join_into(items: &ArrayRef, out: &mut String, joining: &mut Vec<*const RefCell<Vec<Value>>>) {
    let ptr = Rc::as_ptr(items);
    if joining.contains(&ptr) {
        return;
    }
    joining.push(ptr);
    for (i, item) in items.borrow().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item {
            Value::Array(inner) => join_into(inner, out, joining),
            item if item.is_nullish() => {}
            item => out.push_str(&item.to_string()),
        }
    }
    joining.pop();
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

/// Formats a number the way script string conversion does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return n.to_string();
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Exponentiation with script semantics for NaN exponents and unit bases.
pub fn power(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}
