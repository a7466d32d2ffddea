//! Tokenizer for plain and extended script.
//!
//! The lexer accepts the full extended token set; the parser decides which
//! tokens the active dialect allows.

use super::ParseError;
use super::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Hex,
    Binary,
    Octal,
}

/// Raw piece of a template literal; expression chunks are parsed later.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    Str(String),
    Expr { source: String, offset: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64, Radix),
    Str(String),
    Template(Vec<TemplateChunk>),
    Ident(String),
    /// Words reserved by the language but not supported (`class`, `yield`, ...).
    Reserved(String),

    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    Break,
    Continue,
    Throw,
    True,
    False,
    Null,
    Undefined,
    TypeOf,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Dot,
    Question,
    Colon,
    FatArrow,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    EqEq,
    Ne,
    EqEqEq,
    NeEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

impl Token {
    /// Short human-readable form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n, _) => format!("number {n}"),
            Token::Str(_) => "string".to_string(),
            Token::Template(_) => "template literal".to_string(),
            Token::Ident(name) => format!("identifier `{name}`"),
            Token::Reserved(word) => format!("reserved word `{word}`"),
            Token::Eof => "end of input".to_string(),
            other => format!("`{}`", other.text()),
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Token::Var => "var",
            Token::Let => "let",
            Token::Const => "const",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Throw => "throw",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Undefined => "undefined",
            Token::TypeOf => "typeof",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::Dot => ".",
            Token::Question => "?",
            Token::Colon => ":",
            Token::FatArrow => "=>",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::Ne => "!=",
            Token::EqEqEq => "===",
            Token::NeEq => "!==",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Bang => "!",
            Token::Number(..)
            | Token::Str(_)
            | Token::Template(_)
            | Token::Ident(_)
            | Token::Reserved(_)
            | Token::Eof => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

const RESERVED: [&str; 12] = [
    "class", "yield", "async", "await", "import", "export", "new", "this", "for", "do",
    "switch", "try",
];

pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<SpannedToken>,
    newline_before: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::new(),
            newline_before: false,
        }
    }

    fn run(mut self) -> Result<Vec<SpannedToken>, ParseError> {
        loop {
            self.skip_whitespace_and_comments()?;
            let start = self.pos;
            let Some(ch) = self.peek() else {
                break;
            };
            match ch {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '{' => self.single(Token::LBrace),
                '}' => self.single(Token::RBrace),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                ',' => self.single(Token::Comma),
                ';' => self.single(Token::Semi),
                '?' => self.single(Token::Question),
                ':' => self.single(Token::Colon),
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.lex_number(start)?
                }
                '.' => self.single(Token::Dot),
                '+' => self.operator(&[("+=", Token::PlusEq)], Token::Plus),
                '-' => self.operator(&[("-=", Token::MinusEq)], Token::Minus),
                '*' => self.operator(
                    &[("**", Token::StarStar), ("*=", Token::StarEq)],
                    Token::Star,
                ),
                '/' => self.operator(&[("/=", Token::SlashEq)], Token::Slash),
                '%' => self.operator(&[("%=", Token::PercentEq)], Token::Percent),
                '=' => self.operator(
                    &[
                        ("===", Token::EqEqEq),
                        ("==", Token::EqEq),
                        ("=>", Token::FatArrow),
                    ],
                    Token::Eq,
                ),
                '!' => self.operator(&[("!==", Token::NeEq), ("!=", Token::Ne)], Token::Bang),
                '<' => self.operator(&[("<=", Token::Le)], Token::Lt),
                '>' => self.operator(&[(">=", Token::Ge)], Token::Gt),
                '&' if self.source[self.pos..].starts_with("&&") => {
                    self.pos += 2;
                    self.push(Token::AndAnd, start);
                }
                '|' if self.source[self.pos..].starts_with("||") => {
                    self.pos += 2;
                    self.push(Token::OrOr, start);
                }
                '"' | '\'' => {
                    self.pos += 1;
                    let s = self.lex_string(ch, start)?;
                    self.push(Token::Str(s), start);
                }
                '`' => {
                    self.pos += 1;
                    let chunks = self.lex_template(start)?;
                    self.push(Token::Template(chunks), start);
                }
                c if c.is_ascii_digit() => self.lex_number(start)?,
                c if is_ident_start(c) => self.lex_ident(start),
                '@' if self.peek_at(1).is_some_and(is_ident_start) => {
                    self.bump();
                    self.lex_ident(start);
                }
                other => {
                    return Err(ParseError::new(
                        format!("unexpected character '{other}'"),
                        Span::new(start, start + other.len_utf8()),
                    ));
                }
            }
        }
        let end = self.source.len();
        self.tokens.push(SpannedToken {
            token: Token::Eof,
            span: Span::new(end, end),
            newline_before: self.newline_before,
        });
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn push(&mut self, token: Token, start: usize) {
        self.tokens.push(SpannedToken {
            token,
            span: Span::new(start, self.pos),
            newline_before: std::mem::take(&mut self.newline_before),
        });
    }

    fn single(&mut self, token: Token) {
        let start = self.pos;
        self.pos += 1;
        self.push(token, start);
    }

    /// Longest-match operator lexing; `longer` is tried in order.
    fn operator(&mut self, longer: &[(&str, Token)], fallback: Token) {
        let start = self.pos;
        for (text, token) in longer {
            if self.source[self.pos..].starts_with(text) {
                self.pos += text.len();
                self.push(token.clone(), start);
                return;
            }
        }
        self.pos += 1;
        self.push(fallback, start);
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = &self.source[self.pos..];
            match self.peek() {
                Some('\n') => {
                    self.newline_before = true;
                    self.pos += 1;
                }
                Some(c) if c.is_whitespace() => self.pos += c.len_utf8(),
                _ if rest.starts_with("//") => {
                    let len = rest.find('\n').unwrap_or(rest.len());
                    self.pos += len;
                }
                _ if rest.starts_with("/*") => {
                    let Some(len) = rest[2..].find("*/") else {
                        return Err(ParseError::new(
                            "unterminated comment",
                            Span::new(self.pos, self.source.len()),
                        ));
                    };
                    if rest[..len + 2].contains('\n') {
                        self.newline_before = true;
                    }
                    self.pos += len + 4;
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_ident(&mut self, start: usize) {
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        let word = &self.source[start..self.pos];
        let token = match word {
            "var" => Token::Var,
            "let" => Token::Let,
            "const" => Token::Const,
            "function" => Token::Function,
            "return" => Token::Return,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "throw" => Token::Throw,
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "undefined" => Token::Undefined,
            "typeof" => Token::TypeOf,
            w if RESERVED.contains(&w) => Token::Reserved(w.to_string()),
            w => Token::Ident(w.to_string()),
        };
        self.push(token, start);
    }

    fn lex_number(&mut self, start: usize) -> Result<(), ParseError> {
        let rest = &self.source[self.pos..];
        let prefixed = [("0x", Radix::Hex, 16), ("0X", Radix::Hex, 16), ("0b", Radix::Binary, 2), ("0B", Radix::Binary, 2), ("0o", Radix::Octal, 8), ("0O", Radix::Octal, 8)];
        for (prefix, radix, base) in prefixed {
            if rest.starts_with(prefix) {
                self.pos += 2;
                let digits_start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                    self.bump();
                }
                let digits = &self.source[digits_start..self.pos];
                let value = u64::from_str_radix(digits, base).map_err(|_| {
                    ParseError::new(
                        format!("invalid numeric literal '{}'", &self.source[start..self.pos]),
                        Span::new(start, self.pos),
                    )
                })?;
                self.push(Token::Number(value as f64, radix), start);
                return Ok(());
            }
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_none_or(|c| c.is_ascii_digit() || !is_ident_start(c)) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(ParseError::new(
                "identifier starts immediately after numeric literal",
                Span::new(start, self.pos + 1),
            ));
        }
        let text = &self.source[start..self.pos];
        let value: f64 = text.parse().map_err(|_| {
            ParseError::new(format!("invalid numeric literal '{text}'"), Span::new(start, self.pos))
        })?;
        self.push(Token::Number(value, Radix::Decimal), start);
        Ok(())
    }

    /// Reads an escape sequence after the backslash.
    fn lex_escape(&mut self, start: usize) -> Result<char, ParseError> {
        let Some(ch) = self.bump() else {
            return Err(ParseError::new(
                "unterminated string literal",
                Span::new(start, self.pos),
            ));
        };
        Ok(match ch {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'x' => self.hex_escape(2, "invalid hexadecimal escape sequence")?,
            'u' => self.hex_escape(4, "invalid unicode escape sequence")?,
            other => other,
        })
    }

    /// Reads exactly `digits` hex digits as a code point.
    fn hex_escape(&mut self, digits: usize, message: &str) -> Result<char, ParseError> {
        let hex_start = self.pos;
        for _ in 0..digits {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(ParseError::new(message, Span::new(hex_start, self.pos)));
            }
            self.bump();
        }
        u32::from_str_radix(&self.source[hex_start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ParseError::new(message, Span::new(hex_start, self.pos)))
    }

    fn lex_string(&mut self, quote: char, start: usize) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.lex_escape(start)?),
                Some('\n') | None => {
                    return Err(ParseError::new(
                        "unterminated string literal",
                        Span::new(start, self.pos),
                    ));
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn lex_template(&mut self, start: usize) -> Result<Vec<TemplateChunk>, ParseError> {
        let mut chunks = Vec::new();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('`') => break,
                Some('\\') => text.push(self.lex_escape(start)?),
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    if !text.is_empty() {
                        chunks.push(TemplateChunk::Str(std::mem::take(&mut text)));
                    }
                    let offset = self.pos;
                    let source = self.template_expr(start)?;
                    chunks.push(TemplateChunk::Expr { source, offset });
                }
                Some(c) => text.push(c),
                None => {
                    return Err(ParseError::new(
                        "unterminated template literal",
                        Span::new(start, self.pos),
                    ));
                }
            }
        }
        if !text.is_empty() || chunks.is_empty() {
            chunks.push(TemplateChunk::Str(text));
        }
        Ok(chunks)
    }

    /// Collects the source of a `${...}` substitution up to its closing brace.
    fn template_expr(&mut self, start: usize) -> Result<String, ParseError> {
        let expr_start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        while let Some(c) = self.bump() {
            match (quote, c) {
                (Some(_), '\\') => {
                    self.bump();
                }
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '{') => depth += 1,
                (None, '}') if depth == 0 => {
                    return Ok(self.source[expr_start..self.pos - 1].to_string());
                }
                (None, '}') => depth -= 1,
                (None, _) => {}
            }
        }
        Err(ParseError::new(
            "unterminated template substitution",
            Span::new(start, self.pos),
        ))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            kinds("a === b !== c ** d => e"),
            vec![
                Token::Ident("a".into()),
                Token::EqEqEq,
                Token::Ident("b".into()),
                Token::NeEq,
                Token::Ident("c".into()),
                Token::StarStar,
                Token::Ident("d".into()),
                Token::FatArrow,
                Token::Ident("e".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn numbers_in_every_radix() {
        assert_eq!(
            kinds("1.5 0x1F 0b101 0o17 2e3 .5"),
            vec![
                Token::Number(1.5, Radix::Decimal),
                Token::Number(31.0, Radix::Hex),
                Token::Number(5.0, Radix::Binary),
                Token::Number(15.0, Radix::Octal),
                Token::Number(2000.0, Radix::Decimal),
                Token::Number(0.5, Radix::Decimal),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb" "A""#),
            vec![
                Token::Str("it's".into()),
                Token::Str("a\nb".into()),
                Token::Str("A".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn hex_escapes() {
        assert_eq!(
            kinds(r"'\x41\x7a' '\u0041'"),
            vec![Token::Str("Az".into()), Token::Str("A".into()), Token::Eof]
        );
        let err = tokenize(r"'\x4'").unwrap_err();
        assert_eq!(err.message, "invalid hexadecimal escape sequence");
        assert!(tokenize(r"'\xg1'").is_err());
    }

    #[test]
    fn template_chunks_keep_expression_source() {
        let tokens = kinds("`a ${x + 1} b ${ {} }`");
        let Token::Template(chunks) = &tokens[0] else {
            panic!("expected template, got {:?}", tokens[0]);
        };
        assert_eq!(chunks[0], TemplateChunk::Str("a ".into()));
        assert_eq!(
            chunks[1],
            TemplateChunk::Expr {
                source: "x + 1".into(),
                offset: 5
            }
        );
        assert_eq!(chunks[2], TemplateChunk::Str(" b ".into()));
        assert!(matches!(&chunks[3], TemplateChunk::Expr { source, .. } if source == " {} "));
    }

    #[test]
    fn comments_and_newlines() {
        let tokens = tokenize("a // note\n/* block */ b").unwrap();
        assert_eq!(tokens[0].token, Token::Ident("a".into()));
        assert!(!tokens[0].newline_before);
        assert_eq!(tokens[1].token, Token::Ident("b".into()));
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn intrinsic_names_keep_their_sigil() {
        assert_eq!(
            kinds("@pow(1)"),
            vec![
                Token::Ident("@pow".into()),
                Token::LParen,
                Token::Number(1.0, Radix::Decimal),
                Token::RParen,
                Token::Eof,
            ]
        );
        assert!(tokenize("@ pow").is_err());
    }

    #[test]
    fn reserved_words_are_flagged() {
        assert_eq!(
            kinds("class"),
            vec![Token::Reserved("class".into()), Token::Eof]
        );
    }

    #[test]
    fn lexing_errors() {
        assert!(tokenize("'open").is_err());
        assert!(tokenize("`open ${x").is_err());
        assert!(tokenize("/* open").is_err());
        assert!(tokenize("3abc").is_err());
        assert!(tokenize("a # b").is_err());
    }
}
