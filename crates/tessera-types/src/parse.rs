//! Parser for the textual type syntax used in package manifests.
//!
//! The syntax follows the source language's own spelling of types:
//! `int`, `*T`, `[]T`, `[4]T`, `map[K]V`, `chan T`, `func(int, ...string) (bool, error)`,
//! `struct{x int; y *T}`, `interface{String() string}`, `any`, `(int, bool)` for
//! tuples, and qualified names `path/to/pkg.Name`. An unqualified name that is
//! not predeclared refers to a named type of the current package.

use crate::error::TypeParseError;
use crate::ty::{BasicKind, ChanDir, Field, Method, Signature, TyId, TyKind, TypeTable};
use logos::Logos;
use miette::SourceSpan;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    #[token("...")]
    Ellipsis,
    #[token("<-")]
    Arrow,

    #[token("*")]
    Star,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    #[regex(r"[0-9]+")]
    Int,

    // Qualified names keep their package path: `example.com/pkg.Name`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_./\-]*")]
    Ident,

    #[regex(r"[ \t\n\r]+", logos::skip)]
    Whitespace,

    #[error]
    Error,
}

impl TokenKind {
    fn text(self) -> &'static str {
        match self {
            TokenKind::Ellipsis => "...",
            TokenKind::Arrow => "<-",
            TokenKind::Star => "*",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Semi => ";",
            TokenKind::Comma => ",",
            TokenKind::Int => "integer",
            TokenKind::Ident => "identifier",
            TokenKind::Whitespace | TokenKind::Error => "?",
        }
    }
}

#[derive(Debug, Clone)]
struct Token<'a> {
    kind: TokenKind,
    lexeme: &'a str,
    span: Range<usize>,
}

fn lex(src: &str) -> Result<Vec<Token<'_>>, TypeParseError> {
    let mut lexer = TokenKind::lexer(src);
    let mut tokens = Vec::new();
    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        if kind == TokenKind::Error {
            let c = src[span.start..].chars().next().unwrap_or_default();
            return Err(TypeParseError::new(src, span.start, c.len_utf8(), format!("unexpected character `{}`", c)));
        }
        tokens.push(Token { kind, lexeme: lexer.slice(), span });
    }
    Ok(tokens)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    table: &'a mut TypeTable,
    pkg: &'a str,
}

/// Parses `src` into an interned type. Unqualified, non-predeclared names are
/// resolved as named types of `current_pkg`.
pub fn parse_type(table: &mut TypeTable, src: &str, current_pkg: &str) -> Result<TyId, TypeParseError> {
    let tokens = lex(src)?;
    let mut parser = Parser { src, tokens, pos: 0, table, pkg: current_pkg };
    let ty = parser.ty()?;
    parser.expect_eof()?;
    Ok(ty)
}

/// Parses a function type (`func(...) ...`) and returns its signature type.
pub fn parse_signature(table: &mut TypeTable, src: &str, current_pkg: &str) -> Result<TyId, TypeParseError> {
    let ty = parse_type(table, src, current_pkg)?;
    if table.as_signature(ty).is_none() {
        return Err(TypeParseError::new(src, 0, src.len(), "expected a function type".to_string()));
    }
    Ok(ty)
}

impl<'a> Parser<'a> {
    /// The next token's kind, or `None` at the end of input.
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|token| token.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> TypeParseError {
        let span = self.tokens.get(self.pos).map_or(self.src.len()..self.src.len(), |token| token.span.clone());
        TypeParseError::new(self.src, span.start, span.len().max(1), message.into())
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), TypeParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected `{}`", kind.text())))
        }
    }

    fn expect_eof(&self) -> Result<(), TypeParseError> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.error_here("unexpected trailing input")),
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeParseError> {
        if !self.at(TokenKind::Ident) {
            return Err(self.error_here("expected an identifier"));
        }
        Ok(self.bump().map_or("", |token| token.lexeme))
    }

    fn array_len(&mut self) -> Result<u64, TypeParseError> {
        if !self.at(TokenKind::Int) {
            return Err(self.error_here("expected array length"));
        }
        let text = self.tokens[self.pos].lexeme;
        let len = text.parse::<u64>().map_err(|_| self.error_here(format!("array length `{}` out of range", text)))?;
        self.bump();
        Ok(len)
    }

    /// Whether the next token can start a type (used to detect optional results).
    fn at_type_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(TokenKind::Ident | TokenKind::Arrow | TokenKind::Star | TokenKind::LBracket | TokenKind::LParen)
        )
    }

    fn ty(&mut self) -> Result<TyId, TypeParseError> {
        match self.peek() {
            Some(TokenKind::Star) => {
                self.bump();
                let elem = self.ty()?;
                Ok(self.table.pointer(elem))
            }
            Some(TokenKind::LBracket) => {
                self.bump();
                if self.eat(TokenKind::RBracket) {
                    let elem = self.ty()?;
                    return Ok(self.table.slice(elem));
                }
                let len = self.array_len()?;
                self.expect(TokenKind::RBracket)?;
                let elem = self.ty()?;
                Ok(self.table.array(elem, len))
            }
            Some(TokenKind::LParen) => {
                self.bump();
                let elems = self.type_list(TokenKind::RParen)?;
                self.expect(TokenKind::RParen)?;
                Ok(self.table.tuple(elems))
            }
            Some(TokenKind::Arrow) => {
                self.bump();
                match self.ident()? {
                    "chan" => {
                        let elem = self.ty()?;
                        Ok(self.table.chan(elem, ChanDir::Recv))
                    }
                    _ => Err(self.error_here("expected `chan` after `<-`")),
                }
            }
            Some(TokenKind::Ident) => {
                let name = self.ident()?;
                self.named_or_keyword(name)
            }
            _ => Err(self.error_here("expected a type")),
        }
    }

    fn named_or_keyword(&mut self, name: &str) -> Result<TyId, TypeParseError> {
        match name {
            "map" => {
                self.expect(TokenKind::LBracket)?;
                let key = self.ty()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.ty()?;
                Ok(self.table.map(key, value))
            }
            "chan" => {
                let dir = if self.eat(TokenKind::Arrow) { ChanDir::Send } else { ChanDir::Both };
                let elem = self.ty()?;
                Ok(self.table.chan(elem, dir))
            }
            "func" => self.signature(),
            "struct" => self.struct_body(),
            "interface" => self.interface_body(),
            "any" => Ok(self.table.any()),
            "error" => Ok(error_type(self.table)),
            _ => {
                if let Some(kind) = BasicKind::from_name(name) {
                    return Ok(self.table.basic(kind));
                }
                Ok(match name.rsplit_once('.') {
                    Some((pkg, local)) if !pkg.is_empty() && !local.is_empty() => {
                        self.table.declare_named(pkg, local)
                    }
                    _ => self.table.declare_named(self.pkg, name),
                })
            }
        }
    }

    fn type_list(&mut self, close: TokenKind) -> Result<Vec<TyId>, TypeParseError> {
        let mut elems = Vec::new();
        if self.at(close) {
            return Ok(elems);
        }
        loop {
            elems.push(self.ty()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(elems)
    }

    fn signature(&mut self) -> Result<TyId, TypeParseError> {
        let sig = self.signature_parts()?;
        Ok(self.table.intern(TyKind::Signature(sig)))
    }

    fn signature_parts(&mut self) -> Result<Signature, TypeParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut variadic = false;
        if !self.at(TokenKind::RParen) {
            loop {
                if self.eat(TokenKind::Ellipsis) {
                    let elem = self.ty()?;
                    params.push(self.table.slice(elem));
                    variadic = true;
                    break;
                }
                params.push(self.ty()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let results = if self.eat(TokenKind::LParen) {
            let results = self.type_list(TokenKind::RParen)?;
            self.expect(TokenKind::RParen)?;
            results
        } else if self.at_type_start() {
            vec![self.ty()?]
        } else {
            Vec::new()
        };
        Ok(Signature { params, results, variadic })
    }

    fn struct_body(&mut self) -> Result<TyId, TypeParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while self.peek().is_some() && !self.at(TokenKind::RBrace) {
            let name = self.ident()?.to_string();
            let ty = self.ty()?;
            fields.push(Field { name, ty, embedded: false });
            if !self.eat(TokenKind::Semi) && !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.table.struct_of(fields))
    }

    fn interface_body(&mut self) -> Result<TyId, TypeParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        while self.peek().is_some() && !self.at(TokenKind::RBrace) {
            let name = self.ident()?.to_string();
            let sig = self.signature_parts()?;
            let sig = self.table.intern(TyKind::Signature(sig));
            methods.push(Method { name, sig });
            if !self.eat(TokenKind::Semi) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.table.interface(methods))
    }
}

/// The predeclared `error` interface: `interface{Error() string}`.
pub fn error_type(table: &mut TypeTable) -> TyId {
    if let Some(ty) = table.lookup_named("", "error") {
        return ty;
    }
    let string = table.basic(BasicKind::String);
    let sig = table.signature(Vec::new(), vec![string]);
    let iface = table.interface(vec![Method { name: "Error".to_string(), sig }]);
    table.named("", "error", iface)
}

impl TypeParseError {
    pub(crate) fn new(src: &str, offset: usize, len: usize, message: String) -> Self {
        TypeParseError {
            src: src.to_string(),
            span: SourceSpan::from((offset, len)),
            message,
        }
    }
}
