//! Recursive-descent parser for both script dialects.

use super::ParseError;
use super::ast::*;
use super::lexer::{Radix, SpannedToken, TemplateChunk, Token, tokenize};
use std::rc::Rc;

/// Nesting limit for statements and expressions.
const MAX_DEPTH: usize = 100;

/// Which extended-syntax features the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Syntax {
    pub arrow_functions: bool,
    pub block_binding: bool,
    pub template_literals: bool,
    pub default_parameters: bool,
    pub exponentiation: bool,
    pub numeric_literals: bool,
    /// `@name` references to engine intrinsics, which only translated code
    /// contains.
    pub intrinsics: bool,
}

impl Syntax {
    /// Plain script: every extension disabled, intrinsics allowed.
    pub const PLAIN: Syntax = Syntax {
        arrow_functions: false,
        block_binding: false,
        template_literals: false,
        default_parameters: false,
        exponentiation: false,
        numeric_literals: false,
        intrinsics: true,
    };

    /// Every extension enabled.
    pub const EXTENDED: Syntax = Syntax {
        arrow_functions: true,
        block_binding: true,
        template_literals: true,
        default_parameters: true,
        exponentiation: true,
        numeric_literals: true,
        intrinsics: false,
    };
}

/// Parses a complete program in the given dialect.
pub fn parse(source: &str, syntax: Syntax) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens, syntax, 0).parse_program()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    syntax: Syntax,
    depth: usize,
    function_depth: usize,
    loop_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>, syntax: Syntax, depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            syntax,
            depth,
            function_depth: 0,
            loop_depth: 0,
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.at(&Token::Eof) {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |t| &t.token)
    }

    fn peek_at(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).map_or(&Token::Eof, |t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(Span::default(), |t| t.span)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn newline_before(&self) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.newline_before)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len().saturating_sub(1) {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> ParseError {
        ParseError::new(format!("unexpected {}", self.peek().describe()), self.span())
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected {} but found {}", token.describe(), self.peek().describe()),
                self.span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name) = self.peek() {
            if is_intrinsic(name) {
                return Err(ParseError::new(
                    format!("unexpected intrinsic `{name}`"),
                    self.span(),
                ));
            }
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::new(
                format!("expected identifier but found {}", self.peek().describe()),
                self.span(),
            ))
        }
    }

    /// Rejects a construct whose feature is disabled in the active dialect.
    fn require(&self, enabled: bool, what: &str, option: &str) -> Result<(), ParseError> {
        if enabled {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("{what} require the `{option}` option"),
                self.span(),
            ))
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new("code is nested too deeply", self.span()));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Statement terminator with automatic insertion before `}`, at end of
    /// input and at a line break.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semi)
            || self.at(&Token::RBrace)
            || self.at(&Token::Eof)
            || self.newline_before()
        {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected `;` but found {}", self.peek().describe()),
                self.span(),
            ))
        }
    }

    // ── Statements ─────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.enter()?;
        let stmt = self.parse_statement_inner();
        self.leave();
        stmt
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Token::Var => self.parse_declaration(DeclKind::Var),
            Token::Let => {
                self.require(self.syntax.block_binding, "`let` declarations", "blockBinding")?;
                self.parse_declaration(DeclKind::Let)
            }
            Token::Const => {
                self.require(self.syntax.block_binding, "`const` declarations", "blockBinding")?;
                self.parse_declaration(DeclKind::Const)
            }
            Token::Function => {
                self.advance();
                if !matches!(self.peek(), Token::Ident(_)) {
                    return Err(ParseError::new(
                        "function statements require a name",
                        self.span(),
                    ));
                }
                let function = self.parse_function_rest()?;
                Ok(Stmt::Function(Rc::new(function)))
            }
            Token::Return => {
                if self.function_depth == 0 {
                    return Err(ParseError::new("illegal return statement", self.span()));
                }
                self.advance();
                let value = if self.at(&Token::Semi)
                    || self.at(&Token::RBrace)
                    || self.at(&Token::Eof)
                    || self.newline_before()
                {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(value))
            }
            Token::If => {
                self.advance();
                self.expect(&Token::LParen)?;
                let test = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                let then = Box::new(self.parse_statement()?);
                let otherwise = if self.eat(&Token::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    test,
                    then,
                    otherwise,
                })
            }
            Token::While => {
                self.advance();
                self.expect(&Token::LParen)?;
                let test = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                self.loop_depth += 1;
                let body = self.parse_statement();
                self.loop_depth -= 1;
                Ok(Stmt::While {
                    test,
                    body: Box::new(body?),
                })
            }
            Token::Break | Token::Continue => {
                let is_break = self.at(&Token::Break);
                if self.loop_depth == 0 {
                    let word = if is_break { "break" } else { "continue" };
                    return Err(ParseError::new(
                        format!("illegal {word} statement"),
                        self.span(),
                    ));
                }
                self.advance();
                self.consume_semicolon()?;
                Ok(if is_break { Stmt::Break } else { Stmt::Continue })
            }
            Token::Throw => {
                self.advance();
                if self.newline_before() {
                    return Err(ParseError::new("illegal newline after throw", self.span()));
                }
                let value = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Throw(value))
            }
            Token::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::Semi => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Token::Reserved(word) => Err(ParseError::new(
                format!("`{word}` is not supported"),
                self.span(),
            )),
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_declaration(&mut self, kind: DeclKind) -> Result<Stmt, ParseError> {
        self.advance();
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat(&Token::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if kind == DeclKind::Const && init.is_none() {
                return Err(ParseError::new(
                    "missing initializer in const declaration",
                    self.span(),
                ));
            }
            decls.push(Declarator { name, init });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.consume_semicolon()?;
        Ok(Stmt::Decl { kind, decls })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&Token::LBrace)?;
        let mut body = Vec::new();
        while !self.at(&Token::RBrace) {
            if self.at(&Token::Eof) {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(body)
    }

    /// Body of a function or block-bodied arrow: resets loop tracking.
    fn parse_function_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let saved_loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loops;
        body
    }

    /// Parses `name? (params) { body }` after the `function` keyword.
    fn parse_function_rest(&mut self) -> Result<Function, ParseError> {
        let name = match self.peek() {
            Token::Ident(_) => Some(self.expect_ident()?),
            _ => None,
        };
        let params = self.parse_params()?;
        let body = self.parse_function_body()?;
        Ok(Function { name, params, body })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        while !self.at(&Token::RParen) {
            let name = self.expect_ident()?;
            let default = if self.at(&Token::Eq) {
                self.require(self.syntax.default_parameters, "default parameters", "defaultParameters")?;
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param { name, default });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    // ── Expressions ────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.parse_assignment_inner();
        self.leave();
        expr
    }

    fn parse_assignment_inner(&mut self) -> Result<Expr, ParseError> {
        if self.arrow_ahead() {
            return self.parse_arrow();
        }
        let target = self.parse_conditional()?;
        let op = match self.peek() {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::Add,
            Token::MinusEq => AssignOp::Sub,
            Token::StarEq => AssignOp::Mul,
            Token::SlashEq => AssignOp::Div,
            Token::PercentEq => AssignOp::Rem,
            _ => return Ok(target),
        };
        if !target.is_assignable() {
            return Err(ParseError::new("invalid assignment target", self.span()));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// Detects `x =>` or `( ... ) =>` without consuming tokens.
    fn arrow_ahead(&self) -> bool {
        match self.peek() {
            Token::Ident(_) => matches!(self.peek_at(1), Token::FatArrow),
            Token::LParen => {
                let mut depth = 0usize;
                let mut n = 0;
                loop {
                    match self.peek_at(n) {
                        Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                        Token::RParen | Token::RBracket | Token::RBrace => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(self.peek_at(n + 1), Token::FatArrow);
                            }
                        }
                        Token::Eof => return false,
                        _ => {}
                    }
                    n += 1;
                }
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> Result<Expr, ParseError> {
        self.require(self.syntax.arrow_functions, "arrow functions", "arrowFunctions")?;
        let params = if self.at(&Token::LParen) {
            self.parse_params()?
        } else {
            vec![Param {
                name: self.expect_ident()?,
                default: None,
            }]
        };
        self.expect(&Token::FatArrow)?;
        let body = if self.at(&Token::LBrace) {
            ArrowBody::Block(self.parse_function_body()?)
        } else {
            ArrowBody::Expr(Box::new(self.parse_assignment()?))
        };
        Ok(Expr::Arrow(Rc::new(Arrow { params, body })))
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let test = self.parse_binary(BinaryOp::Or.precedence())?;
        if !self.eat(&Token::Question) {
            return Ok(test);
        }
        let then = self.parse_assignment()?;
        self.expect(&Token::Colon)?;
        let otherwise = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn peek_binary(&self) -> Option<BinaryOp> {
        Some(match self.peek() {
            Token::OrOr => BinaryOp::Or,
            Token::AndAnd => BinaryOp::And,
            Token::EqEq => BinaryOp::Eq,
            Token::Ne => BinaryOp::Ne,
            Token::EqEqEq => BinaryOp::StrictEq,
            Token::NeEq => BinaryOp::StrictNe,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
            Token::StarStar => BinaryOp::Pow,
            _ => return None,
        })
    }

    /// Precedence climbing; `**` is right-associative.
    ///
    /// Each folded operator nests the tree one level deeper and is charged
    /// against the depth limit.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let expr = self.parse_binary_folds(min_prec);
        self.depth = depth;
        expr
    }

    fn parse_binary_folds(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.peek_binary() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            if op == BinaryOp::Pow {
                self.require(self.syntax.exponentiation, "`**` expressions", "exponentiation")?;
            }
            self.enter()?;
            self.advance();
            let next_min = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::TypeOf => UnaryOp::TypeOf,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let expr = self.parse_unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr?),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let expr = self.parse_postfix_chain();
        self.depth = depth;
        expr
    }

    /// Calls, indexing and member access; each step is one nesting level.
    fn parse_postfix_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(self.peek(), Token::LParen | Token::LBracket | Token::Dot) {
                self.enter()?;
            }
            match self.peek() {
                Token::LParen => {
                    self.advance();
                    let args = self.parse_list(&Token::RParen)?;
                    expr = Expr::call(expr, args);
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Token::Dot => {
                    self.advance();
                    let name = self.expect_ident()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        name,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list(&mut self, close: &Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(self.parse_assignment()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let expr = match self.peek().clone() {
            Token::Number(value, radix) => {
                if matches!(radix, Radix::Binary | Radix::Octal) {
                    self.require(
                        self.syntax.numeric_literals,
                        "binary and octal literals",
                        "numericLiterals",
                    )?;
                }
                Expr::Number(value)
            }
            Token::Str(s) => Expr::Str(s),
            Token::Template(chunks) => {
                self.require(self.syntax.template_literals, "template literals", "templateLiterals")?;
                self.parse_template(chunks)?
            }
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Null => Expr::Null,
            Token::Undefined => Expr::Undefined,
            Token::Ident(name) if is_intrinsic(&name) && !self.syntax.intrinsics => {
                return Err(ParseError::new(
                    format!("`{name}` is only available to translated code"),
                    self.span(),
                ));
            }
            Token::Ident(name) => Expr::Ident(name),
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Token::LBracket => {
                self.advance();
                return Ok(Expr::Array(self.parse_list(&Token::RBracket)?));
            }
            Token::Function => {
                self.advance();
                return Ok(Expr::Function(Rc::new(self.parse_function_rest()?)));
            }
            Token::Reserved(word) => {
                return Err(ParseError::new(
                    format!("`{word}` is not supported"),
                    self.span(),
                ));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expr)
    }

    /// Substitutions are charged one nesting level each, since translation
    /// folds them into a chain of concatenations.
    fn parse_template(&mut self, chunks: Vec<TemplateChunk>) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let parts = self.parse_template_parts(chunks);
        self.depth = depth;
        Ok(Expr::Template(parts?))
    }

    fn parse_template_parts(
        &mut self,
        chunks: Vec<TemplateChunk>,
    ) -> Result<Vec<TemplatePart>, ParseError> {
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match chunk {
                TemplateChunk::Str(s) => parts.push(TemplatePart::Str(s)),
                TemplateChunk::Expr { source, offset } => {
                    self.enter()?;
                    let shift = |mut e: ParseError| {
                        e.span = e.span.shifted(offset);
                        e
                    };
                    let tokens = tokenize(&source).map_err(shift)?;
                    let mut sub = Parser::new(tokens, self.syntax, self.depth);
                    sub.function_depth = self.function_depth;
                    let expr = sub.parse_expression().map_err(shift)?;
                    if !sub.at(&Token::Eof) {
                        return Err(shift(sub.unexpected()));
                    }
                    parts.push(TemplatePart::Expr(expr));
                }
            }
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        let program = parse(source, Syntax::EXTENDED).unwrap();
        match program.body.into_iter().next() {
            Some(Stmt::Expr(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn num(n: f64) -> Expr {
        Expr::Number(n)
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            expr("1 + 2 * 3"),
            Expr::binary(
                BinaryOp::Add,
                num(1.0),
                Expr::binary(BinaryOp::Mul, num(2.0), num(3.0))
            )
        );
        assert_eq!(
            expr("1 - 2 - 3"),
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(BinaryOp::Sub, num(1.0), num(2.0)),
                num(3.0)
            )
        );
        assert_eq!(
            expr("2 ** 3 ** 2"),
            Expr::binary(
                BinaryOp::Pow,
                num(2.0),
                Expr::binary(BinaryOp::Pow, num(3.0), num(2.0))
            )
        );
    }

    #[test]
    fn arrow_forms() {
        assert!(matches!(expr("x => x"), Expr::Arrow(_)));
        assert!(matches!(expr("(a, b) => { return a; }"), Expr::Arrow(_)));
        assert!(matches!(expr("(a + b)"), Expr::Binary { .. }));
    }

    #[test]
    fn statements_with_and_without_semicolons() {
        let program = parse("var a = 1\nvar b = 2; a + b", Syntax::PLAIN).unwrap();
        assert_eq!(program.body.len(), 3);
        assert!(parse("var a = 1 var b = 2", Syntax::PLAIN).is_err());
    }

    #[test]
    fn plain_dialect_rejects_extensions() {
        for source in [
            "let x = 1",
            "const x = 1",
            "x => x",
            "`t`",
            "2 ** 2",
            "0b11",
            "function f(a = 1) {}",
        ] {
            let err = parse(source, Syntax::PLAIN).unwrap_err();
            assert!(err.message.contains("require the"), "{source}: {}", err.message);
        }
    }

    #[test]
    fn gated_error_names_the_option() {
        let err = parse("2 ** 2", Syntax::PLAIN).unwrap_err();
        assert_eq!(err.message, "`**` expressions require the `exponentiation` option");
    }

    #[test]
    fn control_flow_placement_is_checked() {
        assert!(parse("return 1", Syntax::PLAIN).is_err());
        assert!(parse("break", Syntax::PLAIN).is_err());
        assert!(parse("while (true) { break; }", Syntax::PLAIN).is_ok());
        assert!(parse("while (true) { function f() { break; } }", Syntax::PLAIN).is_err());
        assert!(parse("function f() { return; }", Syntax::PLAIN).is_ok());
    }

    #[test]
    fn malformed_input() {
        assert!(parse("function(", Syntax::EXTENDED).is_err());
        assert!(parse("function () {}", Syntax::PLAIN).is_err());
        assert!(parse("1 = 2", Syntax::PLAIN).is_err());
        assert!(parse("class A {}", Syntax::EXTENDED).is_err());
        assert!(parse("(1", Syntax::PLAIN).is_err());
    }

    #[test]
    fn template_substitution_errors_point_into_source() {
        let err = parse("`a ${1 +}`", Syntax::EXTENDED).unwrap_err();
        assert!(err.span.start >= 5, "span {:?}", err.span);
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = parse(&source, Syntax::PLAIN).unwrap_err();
        assert_eq!(err.message, "code is nested too deeply");
    }

    #[test]
    fn long_operator_chains_count_as_nesting() {
        let sum = format!("{}1", "1 + ".repeat(5000));
        let err = parse(&sum, Syntax::PLAIN).unwrap_err();
        assert_eq!(err.message, "code is nested too deeply");

        let calls = format!("f{}", "()".repeat(5000));
        assert!(parse(&calls, Syntax::PLAIN).is_err());
        let members = format!("a{}", ".b".repeat(5000));
        assert!(parse(&members, Syntax::PLAIN).is_err());

        let substitutions = format!("`{}`", "${x}".repeat(5000));
        assert!(parse(&substitutions, Syntax::EXTENDED).is_err());
    }

    #[test]
    fn moderate_chains_still_parse() {
        let sum = format!("{}1", "1 + ".repeat(40));
        assert!(parse(&sum, Syntax::PLAIN).is_ok());
        assert!(parse("a.b.c(1)[2].d()", Syntax::PLAIN).is_ok());
        // the limit applies per expression, not per program
        let program = "x = 1 + 1 + 1 + 1;\n".repeat(200);
        assert!(parse(&program, Syntax::PLAIN).is_ok());
    }

    #[test]
    fn intrinsics_only_in_translated_code() {
        assert!(parse("@pow(2, 3)", Syntax::PLAIN).is_ok());
        let err = parse("@pow(2, 3)", Syntax::EXTENDED).unwrap_err();
        assert!(err.message.contains("translated code"), "{}", err.message);
        assert!(parse("var @pow = 1", Syntax::PLAIN).is_err());
        assert!(parse("@pow = 1", Syntax::PLAIN).is_err());
        assert!(parse("function f(@pow) {}", Syntax::PLAIN).is_err());
    }
}
