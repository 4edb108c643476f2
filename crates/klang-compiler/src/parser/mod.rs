//! Recursive-descent parser with unbounded backtracking (spec §4.2).
//!
//! Every production that needs to try more than one alternative takes a
//! checkpoint with `save()` and rolls back with `restore()` on failure, so
//! a rejected alternative never leaves consumed tokens behind. Fatal
//! grammar errors report a diagnostic and return `Err(ParseError)`; callers
//! either propagate the failure or resynchronize at a statement/
//! declaration boundary.

mod grammar;

use crate::ast::{QualifiedName, Unit};
use crate::diagnostics::{parser_codes, Diagnostics, Severity};
use crate::lexer::{Op, Punct, Token, TokenCursor, TokenKind};
use klang_core::Span;

/// How deep expression parsing may recurse before giving up (spec §9's
/// fuel-guard design note, applied to the expression grammar specifically
/// since that's the only unbounded-recursion production).
#[derive(Clone, Copy, Debug)]
pub struct ParseLimits {
    pub max_expr_depth: u32,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_expr_depth: 256 }
    }
}

/// Marker error: the diagnostic has already been reported, this just
/// signals "stop trying this alternative" up the call stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError;

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'t, 'd> {
    cursor: TokenCursor<'t>,
    diagnostics: &'d mut Diagnostics,
    limits: ParseLimits,
    expr_depth: u32,
    last_span: Span,
}

impl<'t, 'd> Parser<'t, 'd> {
    pub fn new(tokens: &'t [Token], diagnostics: &'d mut Diagnostics) -> Self {
        Self::with_limits(tokens, diagnostics, ParseLimits::default())
    }

    pub fn with_limits(tokens: &'t [Token], diagnostics: &'d mut Diagnostics, limits: ParseLimits) -> Self {
        let start_span = tokens.first().map(|t| t.span).unwrap_or(Span::point(klang_core::SourceCoord::START));
        Self {
            cursor: TokenCursor::new(tokens),
            diagnostics,
            limits,
            expr_depth: 0,
            last_span: start_span,
        }
    }

    /// Single entry point for a compilation unit (spec §4.2).
    pub fn parse_unit(mut self) -> Unit {
        grammar::declarations::parse_unit(&mut self)
    }

    // ---- cursor helpers -------------------------------------------------

    fn current(&self) -> &'t Token {
        self.cursor.pick()
    }

    fn bump(&mut self) -> &'t Token {
        let tok = self.cursor.get();
        self.last_span = tok.span;
        tok
    }

    /// Span of the most recently consumed token; used to close off a span
    /// that started before a variable-length production (e.g. a qualified
    /// name) without re-deriving it from the cursor position.
    fn prev_span(&self) -> Span {
        self.last_span
    }

    fn save(&self) -> usize {
        self.cursor.tell()
    }

    fn restore(&mut self, mark: usize) {
        self.cursor.seek(mark);
    }

    fn eof(&self) -> bool {
        self.cursor.eof()
    }

    /// Unconditionally consume one token, for error-recovery skipping.
    fn skip_one(&mut self) {
        if !self.eof() {
            self.bump();
        }
    }

    fn report(&mut self, code: crate::diagnostics::DiagnosticCode, span: Span, message: impl Into<String>) {
        self.diagnostics.report(Severity::Error, code, span, message);
    }

    /// Report and fail without consuming the offending token.
    fn error_here(&mut self, code: crate::diagnostics::DiagnosticCode, message: impl Into<String>) -> ParseError {
        let span = self.current().span;
        self.report(code, span, message);
        ParseError
    }

    /// Report and consume the offending token (used for resynchronization
    /// points where swallowing one bad token is the recovery strategy).
    fn error_and_bump(&mut self, code: crate::diagnostics::DiagnosticCode, message: impl Into<String>) -> ParseError {
        let span = self.current().span;
        self.report(code, span, message);
        self.bump();
        ParseError
    }

    // ---- token-kind predicates and matchers -----------------------------

    fn at_punct(&self, p: Punct) -> bool {
        matches!(self.current().kind, TokenKind::Punct(found) if found == p)
    }

    fn at_op(&self, o: Op) -> bool {
        matches!(self.current().kind, TokenKind::Op(found) if found == o)
    }

    fn at_keyword(&self, k: crate::lexer::Keyword) -> bool {
        matches!(self.current().kind, TokenKind::Keyword(found) if found == k)
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.at_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, o: Op) -> bool {
        if self.at_op(o) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, k: crate::lexer::Keyword) -> bool {
        if self.at_keyword(k) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: Punct, what: &str) -> ParseResult<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.error_here(parser_codes::EXPECTED_TOKEN, format!("expected {what}")))
        }
    }

    fn expect_op(&mut self, o: Op, what: &str) -> ParseResult<()> {
        if self.eat_op(o) {
            Ok(())
        } else {
            Err(self.error_here(parser_codes::EXPECTED_TOKEN, format!("expected {what}")))
        }
    }

    fn expect_keyword(&mut self, k: crate::lexer::Keyword, what: &str) -> ParseResult<()> {
        if self.eat_keyword(k) {
            Ok(())
        } else {
            Err(self.error_here(parser_codes::EXPECTED_TOKEN, format!("expected {what}")))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        if matches!(self.current().kind, TokenKind::Identifier) {
            Ok(self.bump().text.clone())
        } else {
            Err(self.error_here(parser_codes::EXPECTED_TOKEN, format!("expected {what}")))
        }
    }

    /// `('::')? identifier ('::' identifier)*`
    fn parse_qualified_name(&mut self) -> ParseResult<QualifiedName> {
        let root_prefix = self.eat_punct(Punct::ColonColon);
        let mut parts = vec![self.expect_identifier("an identifier")?];
        while self.eat_punct(Punct::ColonColon) {
            parts.push(self.expect_identifier("an identifier after '::'")?);
        }
        Ok(QualifiedName::new(root_prefix, parts))
    }

    /// Run `f` as a speculative alternative: if it fails, the cursor and
    /// any diagnostics it raised are rolled back as if it had never run.
    fn try_speculative<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> Option<T> {
        let mark = self.save();
        let dmark = self.diagnostics.len();
        match f(self) {
            Ok(v) => Some(v),
            Err(_) => {
                self.restore(mark);
                self.diagnostics.truncate(dmark);
                None
            }
        }
    }

    fn enter_recursion(&mut self) -> bool {
        if self.expr_depth >= self.limits.max_expr_depth {
            return false;
        }
        self.expr_depth += 1;
        true
    }

    fn exit_recursion(&mut self) {
        self.expr_depth -= 1;
    }
}

#[cfg(test)]
mod tests;
