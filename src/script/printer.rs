//! Pretty-printer turning an AST back into source text.
//!
//! Parentheses are emitted only where operator precedence requires them, so
//! re-parsing the output yields the same tree.

use super::ast::*;
use super::value::format_number;

const PREC_ASSIGN: u8 = 1;
const PREC_CONDITIONAL: u8 = 2;
const PREC_UNARY: u8 = 10;
const PREC_POSTFIX: u8 = 11;
const PREC_PRIMARY: u8 = 12;

/// Prints a program, one top-level statement per line.
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    for stmt in &program.body {
        printer.statement(stmt);
    }
    printer.finish()
}

/// Prints a single expression.
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, PREC_ASSIGN);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn finish(mut self) -> String {
        while self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn statement(&mut self, stmt: &Stmt) {
        self.line_start();
        self.statement_body(stmt);
        self.out.push('\n');
    }

    /// Prints a statement without leading indentation or trailing newline.
    fn statement_body(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                if starts_with_function(expr) {
                    self.out.push('(');
                    self.expr(expr, PREC_ASSIGN);
                    self.out.push(')');
                } else {
                    self.expr(expr, PREC_ASSIGN);
                }
                self.out.push(';');
            }
            Stmt::Decl { kind, decls } => {
                self.out.push_str(kind.keyword());
                self.out.push(' ');
                for (i, decl) in decls.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(&decl.name);
                    if let Some(init) = &decl.init {
                        self.out.push_str(" = ");
                        self.expr(init, PREC_ASSIGN);
                    }
                }
                self.out.push(';');
            }
            Stmt::Function(function) => self.function(function),
            Stmt::Return(value) => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(value, PREC_ASSIGN);
                }
                self.out.push(';');
            }
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                self.out.push_str("if (");
                self.expr(test, PREC_ASSIGN);
                self.out.push_str(") ");
                self.braced(then);
                match otherwise.as_deref() {
                    Some(nested @ Stmt::If { .. }) => {
                        self.out.push_str(" else ");
                        self.statement_body(nested);
                    }
                    Some(other) => {
                        self.out.push_str(" else ");
                        self.braced(other);
                    }
                    None => {}
                }
            }
            Stmt::While { test, body } => {
                self.out.push_str("while (");
                self.expr(test, PREC_ASSIGN);
                self.out.push_str(") ");
                self.braced(body);
            }
            Stmt::Block(body) => self.block(body),
            Stmt::Break => self.out.push_str("break;"),
            Stmt::Continue => self.out.push_str("continue;"),
            Stmt::Throw(value) => {
                self.out.push_str("throw ");
                self.expr(value, PREC_ASSIGN);
                self.out.push(';');
            }
            Stmt::Empty => self.out.push(';'),
        }
    }

    /// Prints a statement as a block, wrapping non-block statements in braces.
    fn braced(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(body) => self.block(body),
            other => self.block(std::slice::from_ref(other)),
        }
    }

    fn block(&mut self, body: &[Stmt]) {
        if body.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in body {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.line_start();
        self.out.push('}');
    }

    fn params(&mut self, params: &[Param]) {
        self.out.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&param.name);
            if let Some(default) = &param.default {
                self.out.push_str(" = ");
                self.expr(default, PREC_ASSIGN);
            }
        }
        self.out.push(')');
    }

    fn function(&mut self, function: &Function) {
        self.out.push_str("function ");
        if let Some(name) = &function.name {
            self.out.push_str(name);
        }
        self.params(&function.params);
        self.out.push(' ');
        self.block(&function.body);
    }

    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        let prec = precedence(expr);
        let wrap = prec < min_prec;
        if wrap {
            self.out.push('(');
        }
        self.expr_inner(expr);
        if wrap {
            self.out.push(')');
        }
    }

    fn expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(n) => self.out.push_str(&number_literal(*n)),
            Expr::Str(s) => quote_into(&mut self.out, s),
            Expr::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Expr::Null => self.out.push_str("null"),
            Expr::Undefined => self.out.push_str("undefined"),
            Expr::Ident(name) => self.out.push_str(name),
            Expr::Array(items) => {
                self.out.push('[');
                self.comma_list(items);
                self.out.push(']');
            }
            Expr::Template(parts) => {
                self.out.push('`');
                for part in parts {
                    match part {
                        TemplatePart::Str(s) => {
                            for ch in s.chars() {
                                match ch {
                                    '`' => self.out.push_str("\\`"),
                                    '\\' => self.out.push_str("\\\\"),
                                    '$' => self.out.push_str("\\$"),
                                    c => self.out.push(c),
                                }
                            }
                        }
                        TemplatePart::Expr(e) => {
                            self.out.push_str("${");
                            self.expr(e, PREC_ASSIGN);
                            self.out.push('}');
                        }
                    }
                }
                self.out.push('`');
            }
            Expr::Function(function) => self.function(function),
            Expr::Arrow(arrow) => {
                self.params(&arrow.params);
                self.out.push_str(" => ");
                match &arrow.body {
                    ArrowBody::Expr(e) => self.expr(e, PREC_ASSIGN),
                    ArrowBody::Block(body) => self.block(body),
                }
            }
            Expr::Unary { op, expr } => {
                self.out.push_str(op.symbol());
                let mut operand = Printer {
                    out: String::new(),
                    indent: self.indent,
                };
                operand.expr(expr, PREC_UNARY);
                let clash = matches!(
                    (op, operand.out.chars().next()),
                    (UnaryOp::Neg, Some('-')) | (UnaryOp::Plus, Some('+'))
                );
                if clash {
                    self.out.push(' ');
                }
                self.out.push_str(&operand.out);
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let (left_min, right_min) = if *op == BinaryOp::Pow {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.expr(lhs, left_min);
                self.out.push(' ');
                self.out.push_str(op.symbol());
                self.out.push(' ');
                self.expr(rhs, right_min);
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                self.expr(test, PREC_CONDITIONAL + 1);
                self.out.push_str(" ? ");
                self.expr(then, PREC_ASSIGN);
                self.out.push_str(" : ");
                self.expr(otherwise, PREC_ASSIGN);
            }
            Expr::Assign { op, target, value } => {
                self.expr(target, PREC_POSTFIX);
                self.out.push(' ');
                self.out.push_str(op.symbol());
                self.out.push(' ');
                self.expr(value, PREC_ASSIGN);
            }
            Expr::Call { callee, args } => {
                self.expr(callee, PREC_POSTFIX);
                self.out.push('(');
                self.comma_list(args);
                self.out.push(')');
            }
            Expr::Index { object, index } => {
                self.expr(object, PREC_POSTFIX);
                self.out.push('[');
                self.expr(index, PREC_ASSIGN);
                self.out.push(']');
            }
            Expr::Member { object, name } => {
                if matches!(**object, Expr::Number(_)) {
                    self.out.push('(');
                    self.expr_inner(object);
                    self.out.push(')');
                } else {
                    self.expr(object, PREC_POSTFIX);
                }
                self.out.push('.');
                self.out.push_str(name);
            }
        }
    }

    fn comma_list(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(item, PREC_ASSIGN);
        }
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Assign { .. } | Expr::Arrow(_) => PREC_ASSIGN,
        Expr::Conditional { .. } => PREC_CONDITIONAL,
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => PREC_UNARY,
        Expr::Call { .. } | Expr::Index { .. } | Expr::Member { .. } => PREC_POSTFIX,
        _ => PREC_PRIMARY,
    }
}

/// A statement beginning with `function` would be read as a declaration.
fn starts_with_function(expr: &Expr) -> bool {
    match expr {
        Expr::Function(_) => true,
        Expr::Binary { lhs, .. } => precedence(lhs) >= PREC_UNARY && starts_with_function(lhs),
        Expr::Call { callee: inner, .. }
        | Expr::Index { object: inner, .. }
        | Expr::Member { object: inner, .. } => starts_with_function(inner),
        Expr::Conditional { test, .. } => {
            precedence(test) > PREC_CONDITIONAL && starts_with_function(test)
        }
        Expr::Assign { target, .. } => starts_with_function(target),
        _ => false,
    }
}

fn number_literal(n: f64) -> String {
    if n.is_infinite() {
        "1e999".to_string()
    } else {
        format_number(n)
    }
}

/// Writes `s` as a double-quoted string literal.
pub fn quote_into(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
