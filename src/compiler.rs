//! Source-to-source translation from extended script to plain script.

use std::rc::Rc;

use tracing::debug;

use crate::error::{CompileError, line_col};
use crate::options::CompilerOptions;
use crate::script::ast::*;
use crate::script::context::POW_INTRINSIC;
use crate::script::printer::print_program;
use crate::script::{Syntax, parse};

/// Prologue every translation starts with.
pub const STRICT_PROLOGUE: &str = "\"use strict\";";

/// Translates source text into plain, directly executable script.
///
/// Implementations must be pure with respect to the options: the same source
/// and options always produce the same output.
pub trait Transpiler {
    fn compile(&self, source: &str, options: &CompilerOptions) -> Result<String, CompileError>;
}

/// The built-in translator for extended script.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptCompiler;

impl Transpiler for ScriptCompiler {
    fn compile(&self, source: &str, options: &CompilerOptions) -> Result<String, CompileError> {
        let syntax = syntax_from_options(options);
        debug!(?syntax, "compiling {} bytes", source.len());
        let program = parse(source, syntax).map_err(|e| {
            let (line, column) = line_col(source, e.span.start);
            CompileError {
                message: e.message,
                line,
                column,
            }
        })?;
        let lowered = lower_program(program);
        let body = print_program(&lowered);
        // Lowering nests deeper than the source; the result must still fit
        // the plain parser's limits.
        if let Err(e) = parse(&body, Syntax::PLAIN) {
            debug!(error = %e.message, "translation rejected by plain parser");
            return Err(CompileError {
                message: format!("{} after translation", e.message),
                line: 1,
                column: 1,
            });
        }
        if body.is_empty() {
            Ok(STRICT_PROLOGUE.to_string())
        } else {
            Ok(format!("{STRICT_PROLOGUE}\n{body}"))
        }
    }
}

/// The syntax extensions enabled by the current options.
pub fn syntax_from_options(options: &CompilerOptions) -> Syntax {
    Syntax {
        arrow_functions: options.flag("arrowFunctions"),
        block_binding: options.flag("blockBinding"),
        template_literals: options.flag("templateLiterals"),
        default_parameters: options.flag("defaultParameters"),
        exponentiation: options.flag("exponentiation"),
        numeric_literals: options.flag("numericLiterals"),
        intrinsics: false,
    }
}

fn lower_program(program: Program) -> Program {
    Program {
        body: program.body.iter().map(lower_stmt).collect(),
    }
}

fn lower_block(body: &[Stmt]) -> Vec<Stmt> {
    body.iter().map(lower_stmt).collect()
}

fn lower_stmt(stmt: &Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(e) => Stmt::Expr(lower_expr(e)),
        Stmt::Decl { decls, .. } => Stmt::Decl {
            kind: DeclKind::Var,
            decls: decls
                .iter()
                .map(|d| Declarator {
                    name: d.name.clone(),
                    init: d.init.as_ref().map(lower_expr),
                })
                .collect(),
        },
        Stmt::Function(f) => Stmt::Function(Rc::new(lower_function(f.name.clone(), &f.params, &f.body))),
        Stmt::Return(value) => Stmt::Return(value.as_ref().map(lower_expr)),
        Stmt::If {
            test,
            then,
            otherwise,
        } => Stmt::If {
            test: lower_expr(test),
            then: Box::new(lower_stmt(then)),
            otherwise: otherwise.as_ref().map(|s| Box::new(lower_stmt(s))),
        },
        Stmt::While { test, body } => Stmt::While {
            test: lower_expr(test),
            body: Box::new(lower_stmt(body)),
        },
        Stmt::Block(body) => Stmt::Block(lower_block(body)),
        Stmt::Throw(e) => Stmt::Throw(lower_expr(e)),
        Stmt::Break => Stmt::Break,
        Stmt::Continue => Stmt::Continue,
        Stmt::Empty => Stmt::Empty,
    }
}

/// Moves default parameter values into `if (p === undefined)` guards.
fn lower_function(name: Option<String>, params: &[Param], body: &[Stmt]) -> Function {
    let mut lowered = Vec::with_capacity(body.len() + params.len());
    for param in params {
        if let Some(default) = &param.default {
            lowered.push(Stmt::If {
                test: Expr::binary(
                    BinaryOp::StrictEq,
                    Expr::Ident(param.name.clone()),
                    Expr::Undefined,
                ),
                then: Box::new(Stmt::Block(vec![Stmt::Expr(Expr::Assign {
                    op: AssignOp::Assign,
                    target: Box::new(Expr::Ident(param.name.clone())),
                    value: Box::new(lower_expr(default)),
                })])),
                otherwise: None,
            });
        }
    }
    lowered.extend(body.iter().map(lower_stmt));
    Function {
        name,
        params: params
            .iter()
            .map(|p| Param {
                name: p.name.clone(),
                default: None,
            })
            .collect(),
        body: lowered,
    }
}

fn lower_expr(expr: &Expr) -> Expr {
    match expr {
        Expr::Number(_)
        | Expr::Str(_)
        | Expr::Bool(_)
        | Expr::Null
        | Expr::Undefined
        | Expr::Ident(_) => expr.clone(),
        Expr::Array(items) => Expr::Array(items.iter().map(lower_expr).collect()),
        Expr::Template(parts) => lower_template(parts),
        Expr::Function(f) => {
            Expr::Function(Rc::new(lower_function(f.name.clone(), &f.params, &f.body)))
        }
        Expr::Arrow(arrow) => {
            let body = match &arrow.body {
                ArrowBody::Expr(e) => vec![Stmt::Return(Some((**e).clone()))],
                ArrowBody::Block(body) => body.clone(),
            };
            Expr::Function(Rc::new(lower_function(None, &arrow.params, &body)))
        }
        Expr::Unary { op, expr } => Expr::Unary {
            op: *op,
            expr: Box::new(lower_expr(expr)),
        },
        Expr::Binary {
            op: BinaryOp::Pow,
            lhs,
            rhs,
        } => Expr::call(
            Expr::Ident(POW_INTRINSIC.to_string()),
            vec![lower_expr(lhs), lower_expr(rhs)],
        ),
        Expr::Binary { op, lhs, rhs } => Expr::binary(*op, lower_expr(lhs), lower_expr(rhs)),
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => Expr::Conditional {
            test: Box::new(lower_expr(test)),
            then: Box::new(lower_expr(then)),
            otherwise: Box::new(lower_expr(otherwise)),
        },
        Expr::Assign { op, target, value } => Expr::Assign {
            op: *op,
            target: Box::new(lower_expr(target)),
            value: Box::new(lower_expr(value)),
        },
        Expr::Call { callee, args } => {
            Expr::call(lower_expr(callee), args.iter().map(lower_expr).collect())
        }
        Expr::Index { object, index } => Expr::Index {
            object: Box::new(lower_expr(object)),
            index: Box::new(lower_expr(index)),
        },
        Expr::Member { object, name } => Expr::Member {
            object: Box::new(lower_expr(object)),
            name: name.clone(),
        },
    }
}

/// Rewrites a template as string concatenation that starts from a string.
fn lower_template(parts: &[TemplatePart]) -> Expr {
    let (mut acc, rest) = match parts {
        [TemplatePart::Str(s), rest @ ..] => (Expr::Str(s.clone()), rest),
        _ => (Expr::Str(String::new()), parts),
    };
    for part in rest {
        let next = match part {
            TemplatePart::Str(s) if s.is_empty() => continue,
            TemplatePart::Str(s) => Expr::Str(s.clone()),
            TemplatePart::Expr(e) => lower_expr(e),
        };
        acc = Expr::binary(BinaryOp::Add, acc, next);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Engine;

    fn compile(source: &str) -> Result<String, CompileError> {
        ScriptCompiler.compile(source, &CompilerOptions::default())
    }

    fn compile_with(source: &str, patch: &str) -> Result<String, CompileError> {
        let mut options = CompilerOptions::default();
        options.apply(patch);
        ScriptCompiler.compile(source, &options)
    }

    #[test]
    fn output_starts_with_strict_prologue() {
        assert_eq!(compile("1+1").unwrap(), "\"use strict\";\n1 + 1;");
        assert_eq!(compile("").unwrap(), "\"use strict\";");
    }

    #[test]
    fn block_bindings_become_var() {
        assert_eq!(
            compile("let a = 1; const b = 2").unwrap(),
            "\"use strict\";\nvar a = 1;\nvar b = 2;"
        );
    }

    #[test]
    fn arrows_become_functions() {
        assert_eq!(
            compile("var sq = x => x * x").unwrap(),
            "\"use strict\";\nvar sq = function (x) {\n  return x * x;\n};"
        );
    }

    #[test]
    fn templates_become_concatenation() {
        assert_eq!(
            compile("`a ${1 + 2} b`").unwrap(),
            "\"use strict\";\n\"a \" + (1 + 2) + \" b\";"
        );
        assert_eq!(compile("`${x}`").unwrap(), "\"use strict\";\n\"\" + x;");
    }

    #[test]
    fn default_parameters_become_guards() {
        assert_eq!(
            compile("function f(a, b = 1) { return a + b }").unwrap(),
            "\"use strict\";\nfunction f(a, b) {\n  if (b === undefined) {\n    b = 1;\n  }\n  return a + b;\n}"
        );
    }

    #[test]
    fn exponentiation_is_gated() {
        let err = compile("2 ** 3").unwrap_err();
        assert!(err.message.contains("exponentiation"), "{}", err.message);
        assert_eq!(
            compile_with("2 ** 3 ** 2", "+exponentiation").unwrap(),
            "\"use strict\";\n@pow(2, @pow(3, 2));"
        );
    }

    #[test]
    fn exponent_lowering_ignores_user_pow() {
        let out = compile_with("var pow = 0; 2 ** 3", "+exponentiation").unwrap();
        assert_eq!(out, "\"use strict\";\nvar pow = 0;\n@pow(2, 3);");
        assert!(compile("@pow(2, 3)").is_err());
    }

    #[test]
    fn translation_stays_within_plain_nesting_limit() {
        let engine = Engine::new();
        for n in 1..=80 {
            let source = format!("{}1", "x => ".repeat(n));
            if let Ok(out) = compile(&source) {
                assert!(engine.check(&out, "t").is_ok(), "{n} nested arrows");
            }
        }
        assert!(compile(&format!("{}1", "x => ".repeat(10))).is_ok());
        let err = compile(&format!("{}1", "x => ".repeat(60))).unwrap_err();
        assert_eq!(err.message, "code is nested too deeply after translation");
    }

    #[test]
    fn long_sums_are_compile_errors() {
        let err = compile(&format!("{}1", "1+".repeat(5000))).unwrap_err();
        assert_eq!(err.message, "code is nested too deeply");
    }

    #[test]
    fn numeric_literals_print_as_decimal() {
        assert_eq!(compile("0b101 + 0o17").unwrap(), "\"use strict\";\n5 + 15;");
        assert!(compile_with("0b101", "-numericLiterals").is_err());
    }

    #[test]
    fn disabled_arrows_name_the_option() {
        let err = compile_with("x => x", "-arrowFunctions").unwrap_err();
        assert!(err.message.contains("arrowFunctions"), "{}", err.message);
    }

    #[test]
    fn compile_errors_carry_position() {
        let err = compile("function(").unwrap_err();
        assert_eq!(err.line, 1);
        let err = compile("var x = 1;\nclass Foo {}").unwrap_err();
        assert_eq!((err.line, err.column), (2, 1));
    }

    #[test]
    fn output_is_plain_script() {
        let source = "const add = (a, b = 2) => a + b; let s = `sum ${add(1)}`";
        let out = compile(source).unwrap();
        assert!(parse(&out, Syntax::PLAIN).is_ok(), "{out}");
    }
}
