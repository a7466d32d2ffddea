//! Evaluation contexts: the persistent global state code runs against.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use super::value::{NativeFunction, Value, power};
use crate::error::RuntimeError;

pub type ScopeRef = Rc<RefCell<Scope>>;

/// What `a ** b` is translated into a call of. Intrinsics live in a scope
/// above the globals, so script declarations cannot replace them.
pub const POW_INTRINSIC: &str = "@pow";

/// One level of variable bindings.
#[derive(Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<ScopeRef>,
}

impl Scope {
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Scope::default()))
    }

    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: Some(parent.clone()),
        }))
    }

    /// Binds `name` in this scope, replacing any previous binding here.
    pub fn declare(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    /// Binds `name` to `undefined` unless this scope already has it.
    pub fn declare_hoisted(&mut self, name: &str) {
        self.vars.entry(name.to_string()).or_default();
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        match self.vars.get(name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref()?.borrow().lookup(name),
        }
    }

    /// Updates the nearest binding of `name`; returns false if there is none.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.vars.get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => false,
        }
    }
}

/// Global bindings plus the console `print` writes to.
///
/// Successive evaluations against the same context observe each other's
/// declarations. Dropping a context and creating a new one starts over.
pub struct Context {
    globals: ScopeRef,
    console: Box<dyn Write>,
}

impl Context {
    /// A fresh context whose console is the process stdout.
    pub fn new() -> Self {
        Self::with_console(Box::new(io::stdout()))
    }

    pub fn with_console(console: Box<dyn Write>) -> Self {
        let intrinsics = Scope::root();
        install(&intrinsics, INTRINSICS);
        let globals = Scope::child(&intrinsics);
        install(&globals, NATIVES);
        Self { globals, console }
    }

    pub fn globals(&self) -> &ScopeRef {
        &self.globals
    }

    /// The current value of a global, if declared.
    pub fn binding(&self, name: &str) -> Option<Value> {
        self.globals.borrow().lookup(name)
    }

    pub fn set_binding(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().declare(name, value);
    }

    /// Names of all globals, sorted.
    pub fn binding_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.globals.borrow().vars.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn console(&mut self) -> &mut dyn Write {
        self.console.as_mut()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn install(scope: &ScopeRef, natives: &[NativeFunction]) {
    let mut scope = scope.borrow_mut();
    for native in natives {
        scope.declare(
            native.name,
            Value::Native(Rc::new(NativeFunction {
                name: native.name,
                func: native.func,
            })),
        );
    }
}

const INTRINSICS: &[NativeFunction] = &[NativeFunction {
    name: POW_INTRINSIC,
    func: native_pow,
}];

const NATIVES: &[NativeFunction] = &[
    NativeFunction {
        name: "print",
        func: native_print,
    },
    NativeFunction {
        name: "pow",
        func: native_pow,
    },
];

fn native_print(ctx: &mut Context, args: &[Value]) -> Result<Value, RuntimeError> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(ctx.console(), "{line}")
        .map_err(|e| RuntimeError::type_error(format!("print failed: {e}")))?;
    Ok(Value::Undefined)
}

fn native_pow(_ctx: &mut Context, args: &[Value]) -> Result<Value, RuntimeError> {
    let arg = |i: usize| args.get(i).map_or(f64::NAN, Value::to_number);
    Ok(Value::Number(power(arg(0), arg(1))))
}
