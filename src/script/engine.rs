//! Tree-walking executor for plain script.

use std::rc::Rc;

use tracing::trace;

use super::ast::*;
use super::context::{Context, Scope, ScopeRef};
use super::parser::{Syntax, parse};
use super::printer::print_expr;
use super::value::{Closure, Value};
use crate::error::{RuntimeError, SyntaxError, line_col};

/// Default limit on nested script function calls.
pub const DEFAULT_CALL_DEPTH: usize = 128;

/// Arrays never grow past this many elements through index assignment.
const MAX_ARRAY_LEN: usize = 1 << 24;

/// Code that passed validation and can be run in any context.
#[derive(Debug, Clone)]
pub struct Script {
    label: String,
    program: Program,
}

impl Script {
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Validates and runs plain script.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    max_call_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_CALL_DEPTH,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_depth(max_call_depth: usize) -> Self {
        Self { max_call_depth }
    }

    /// Parses `code` as plain script without running it.
    ///
    /// `label` names the virtual file in error messages.
    pub fn check(&self, code: &str, label: &str) -> Result<Script, SyntaxError> {
        let program = parse(code, Syntax::PLAIN).map_err(|e| {
            let (line, column) = line_col(code, e.span.start);
            SyntaxError {
                label: label.to_string(),
                message: e.message,
                line,
                column,
            }
        })?;
        Ok(Script {
            label: label.to_string(),
            program,
        })
    }

    /// Runs a validated script, returning the value of the last expression
    /// statement executed at top level.
    pub fn run(&self, script: &Script, ctx: &mut Context) -> Result<Value, RuntimeError> {
        trace!(label = %script.label, "running script");
        let globals = ctx.globals().clone();
        let mut exec = Executor {
            ctx,
            max_depth: self.max_call_depth,
            depth: 0,
            completion: Value::Undefined,
        };
        exec.hoist(&script.program.body, &globals);
        for stmt in &script.program.body {
            exec.statement(stmt, &globals)?;
        }
        Ok(exec.completion)
    }
}

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

struct Executor<'a> {
    ctx: &'a mut Context,
    max_depth: usize,
    depth: usize,
    completion: Value,
}

type Exec<T> = Result<T, RuntimeError>;

impl Executor<'_> {
    /// Declares every `var` and function of `body` in `scope` before it runs.
    fn hoist(&mut self, body: &[Stmt], scope: &ScopeRef) {
        for stmt in body {
            match stmt {
                Stmt::Decl { decls, .. } => {
                    for decl in decls {
                        scope.borrow_mut().declare_hoisted(&decl.name);
                    }
                }
                Stmt::Function(function) => {
                    if let Some(name) = &function.name {
                        let closure = closure(function, scope);
                        scope.borrow_mut().declare(name, closure);
                    }
                }
                Stmt::If {
                    then, otherwise, ..
                } => {
                    self.hoist(std::slice::from_ref(then.as_ref()), scope);
                    if let Some(otherwise) = otherwise {
                        self.hoist(std::slice::from_ref(otherwise.as_ref()), scope);
                    }
                }
                Stmt::While { body, .. } => self.hoist(std::slice::from_ref(body.as_ref()), scope),
                Stmt::Block(body) => self.hoist(body, scope),
                _ => {}
            }
        }
    }

    fn block(&mut self, body: &[Stmt], scope: &ScopeRef) -> Exec<Flow> {
        for stmt in body {
            match self.statement(stmt, scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn statement(&mut self, stmt: &Stmt, scope: &ScopeRef) -> Exec<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                let value = self.expr(expr, scope)?;
                if self.depth == 0 {
                    self.completion = value;
                }
            }
            Stmt::Decl { decls, .. } => {
                for decl in decls {
                    if let Some(init) = &decl.init {
                        let value = self.expr(init, scope)?;
                        scope.borrow_mut().declare(&decl.name, value);
                    }
                }
            }
            Stmt::Function(_) | Stmt::Empty => {}
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.expr(expr, scope)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                if self.expr(test, scope)?.truthy() {
                    return self.statement(then, scope);
                } else if let Some(otherwise) = otherwise {
                    return self.statement(otherwise, scope);
                }
            }
            Stmt::While { test, body } => {
                while self.expr(test, scope)?.truthy() {
                    match self.statement(body, scope)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            Stmt::Block(body) => return self.block(body, scope),
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Throw(value) => {
                let value = self.expr(value, scope)?;
                return Err(RuntimeError::uncaught(value.inspect()));
            }
        }
        Ok(Flow::Normal)
    }

    fn expr(&mut self, expr: &Expr, scope: &ScopeRef) -> Exec<Value> {
        Ok(match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Str(s) => Value::str(s),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null => Value::Null,
            Expr::Undefined => Value::Undefined,
            Expr::Ident(name) => lookup(scope, name)?,
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.expr(item, scope)?);
                }
                Value::array(values)
            }
            Expr::Function(function) => match &function.name {
                Some(name) => {
                    let own = Scope::child(scope);
                    let value = closure(function, &own);
                    own.borrow_mut().declare(name, value.clone());
                    value
                }
                None => closure(function, scope),
            },
            Expr::Template(_) => return Err(untranslated("template literals")),
            Expr::Arrow(_) => return Err(untranslated("arrow functions")),
            Expr::Unary { op, expr } => self.unary(*op, expr, scope)?,
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => {
                    let left = self.expr(lhs, scope)?;
                    if left.truthy() { self.expr(rhs, scope)? } else { left }
                }
                BinaryOp::Or => {
                    let left = self.expr(lhs, scope)?;
                    if left.truthy() { left } else { self.expr(rhs, scope)? }
                }
                _ => {
                    let left = self.expr(lhs, scope)?;
                    let right = self.expr(rhs, scope)?;
                    binary(*op, &left, &right)?
                }
            },
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.expr(test, scope)?.truthy() {
                    self.expr(then, scope)?
                } else {
                    self.expr(otherwise, scope)?
                }
            }
            Expr::Assign { op, target, value } => self.assign(*op, target, value, scope)?,
            Expr::Call { callee, args } => {
                let function = self.expr(callee, scope)?;
                if !function.is_callable() {
                    return Err(RuntimeError::type_error(format!(
                        "{} is not a function",
                        print_expr(callee)
                    )));
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.expr(arg, scope)?);
                }
                self.call(&function, values)?
            }
            Expr::Index { object, index } => {
                let object = self.expr(object, scope)?;
                let index = self.expr(index, scope)?;
                get_index(&object, &index)?
            }
            Expr::Member { object, name } => {
                let object = self.expr(object, scope)?;
                get_property(&object, name)?
            }
        })
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, scope: &ScopeRef) -> Exec<Value> {
        if let (UnaryOp::TypeOf, Expr::Ident(name)) = (op, operand) {
            let value = scope.borrow().lookup(name).unwrap_or_default();
            return Ok(Value::str(value.type_of()));
        }
        let value = self.expr(operand, scope)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::str(value.type_of()),
        })
    }

    fn assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, scope: &ScopeRef) -> Exec<Value> {
        match target {
            Expr::Ident(name) => {
                let value = match op.binary() {
                    None => self.expr(value, scope)?,
                    Some(bin) => {
                        let current = lookup(scope, name)?;
                        let rhs = self.expr(value, scope)?;
                        binary(bin, &current, &rhs)?
                    }
                };
                if !scope.borrow_mut().assign(name, value.clone()) {
                    return Err(RuntimeError::reference(format!("{name} is not defined")));
                }
                Ok(value)
            }
            Expr::Index { object, index } => {
                let object = self.expr(object, scope)?;
                let index = self.expr(index, scope)?;
                let value = match op.binary() {
                    None => self.expr(value, scope)?,
                    Some(bin) => {
                        let current = get_index(&object, &index)?;
                        let rhs = self.expr(value, scope)?;
                        binary(bin, &current, &rhs)?
                    }
                };
                set_index(&object, &index, value.clone())?;
                Ok(value)
            }
            other => Err(RuntimeError::type_error(format!(
                "cannot assign to {}",
                print_expr(other)
            ))),
        }
    }

    fn call(&mut self, function: &Value, args: Vec<Value>) -> Exec<Value> {
        let closure = match function {
            Value::Native(native) => return (native.func)(&mut *self.ctx, &args),
            Value::Function(closure) => closure.clone(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "{} is not a function",
                    other.inspect()
                )));
            }
        };
        if self.depth >= self.max_depth {
            return Err(RuntimeError::range("Maximum call stack size exceeded"));
        }
        self.depth += 1;
        let result = self.invoke(&closure, args);
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, closure: &Closure, args: Vec<Value>) -> Exec<Value> {
        let scope = Scope::child(&closure.scope);
        let function = &closure.function;
        let mut args = args.into_iter();
        for param in &function.params {
            if param.default.is_some() {
                return Err(untranslated("default parameters"));
            }
            scope.borrow_mut().declare(&param.name, args.next().unwrap_or_default());
        }
        self.hoist(&function.body, &scope);
        match self.block(&function.body, &scope)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }
}

fn closure(function: &Rc<Function>, scope: &ScopeRef) -> Value {
    Value::Function(Rc::new(Closure {
        function: function.clone(),
        scope: scope.clone(),
    }))
}

/// Extended syntax only reaches the engine if a script skipped translation.
fn untranslated(what: &str) -> RuntimeError {
    RuntimeError::type_error(format!("{what} must be translated before they can run"))
}

fn lookup(scope: &ScopeRef, name: &str) -> Exec<Value> {
    scope
        .borrow()
        .lookup(name)
        .ok_or_else(|| RuntimeError::reference(format!("{name} is not defined")))
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Exec<Value> {
    Ok(match op {
        BinaryOp::Add => {
            let (left, right) = (left.to_primitive(), right.to_primitive());
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                Value::str(&format!("{left}{right}"))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            Value::Bool(compare(op, &left.to_primitive(), &right.to_primitive()))
        }
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Pow => return Err(untranslated("`**` expressions")),
        BinaryOp::And | BinaryOp::Or => {
            return Err(RuntimeError::type_error(format!(
                "`{}` cannot be applied eagerly",
                op.symbol()
            )));
        }
    })
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}

/// An index usable as an array position.
fn array_position(index: &Value) -> Option<usize> {
    match index {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < MAX_ARRAY_LEN as f64 => {
            Some(*n as usize)
        }
        Value::Str(s) => s.parse::<usize>().ok(),
        _ => None,
    }
}

fn read_error(object: &Value, key: &str) -> RuntimeError {
    RuntimeError::type_error(format!(
        "Cannot read properties of {object} (reading '{key}')"
    ))
}

fn get_property(object: &Value, name: &str) -> Exec<Value> {
    if object.is_nullish() {
        return Err(read_error(object, name));
    }
    Ok(match (object, name) {
        (Value::Array(items), "length") => Value::Number(items.borrow().len() as f64),
        (Value::Str(s), "length") => Value::Number(s.chars().count() as f64),
        _ => Value::Undefined,
    })
}

fn get_index(object: &Value, index: &Value) -> Exec<Value> {
    if object.is_nullish() {
        return Err(read_error(object, &index.to_string()));
    }
    match (object, array_position(index)) {
        (Value::Array(items), Some(i)) => Ok(items.borrow().get(i).cloned().unwrap_or_default()),
        (Value::Str(s), Some(i)) => Ok(s
            .chars()
            .nth(i)
            .map(|c| Value::str(c.encode_utf8(&mut [0; 4])))
            .unwrap_or_default()),
        _ => get_property(object, &index.to_string()),
    }
}

fn set_index(object: &Value, index: &Value, value: Value) -> Exec<()> {
    let Value::Array(items) = object else {
        return Err(RuntimeError::type_error(format!(
            "Cannot set properties of {} (setting '{index}')",
            object.inspect()
        )));
    };
    let Some(i) = array_position(index) else {
        return Err(RuntimeError::range(format!("Invalid array index {}", index.inspect())));
    };
    let mut items = items.borrow_mut();
    if i >= items.len() {
        items.resize(i + 1, Value::Undefined);
    }
    items[i] = value;
    Ok(())
}
