//! Diagnostic records and the sink every later stage reports through.
//!
//! Each subsystem owns a 16-bit class of codes (spec §7): lexer `0x0xxx`,
//! parser `0x1xxx`, model builder `0x2xxx`, type system `0x3xxx`, resolver
//! `0x4xxx`. `Diagnostics` collects records in emission order;
//! `DiagnosticsPrinter` renders them the way spec §6.5 requires.

use klang_core::Span;
use std::fmt;

/// Severity of a diagnostic record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A 32-bit diagnostic code. The top 16 bits select the subsystem class,
/// the bottom 16 bits select the specific condition within it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DiagnosticCode(pub u32);

impl DiagnosticCode {
    pub const fn new(subsystem: u32, condition: u32) -> Self {
        DiagnosticCode((subsystem << 16) | condition)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05x}", self.0)
    }
}

/// Lexer diagnostics, class `0x0xxx`.
pub mod lexer_codes {
    use super::DiagnosticCode;
    pub const UNKNOWN_OPERATOR: DiagnosticCode = DiagnosticCode::new(0, 0x0001);
    pub const BAD_ESCAPE: DiagnosticCode = DiagnosticCode::new(0, 0x0002);
    pub const EMPTY_NUMERIC_AFTER_BASE_PREFIX: DiagnosticCode = DiagnosticCode::new(0, 0x0003);
    pub const ILL_FORMED_NUMERIC_SUFFIX: DiagnosticCode = DiagnosticCode::new(0, 0x0004);
    pub const UNTERMINATED_STRING: DiagnosticCode = DiagnosticCode::new(0, 0x0005);
    pub const UNTERMINATED_CHAR: DiagnosticCode = DiagnosticCode::new(0, 0x0006);
    pub const UNTERMINATED_BLOCK_COMMENT: DiagnosticCode = DiagnosticCode::new(0, 0x0007);
    pub const UNEXPECTED_CHARACTER: DiagnosticCode = DiagnosticCode::new(0, 0x0008);
}

/// Parser diagnostics, class `0x1xxx`.
pub mod parser_codes {
    use super::DiagnosticCode;
    pub const EXPECTED_TOKEN: DiagnosticCode = DiagnosticCode::new(1, 0x0001);
    pub const EXPECTED_EXPRESSION: DiagnosticCode = DiagnosticCode::new(1, 0x0002);
    pub const EXPECTED_TYPE: DiagnosticCode = DiagnosticCode::new(1, 0x0003);
    pub const EXPECTED_STATEMENT: DiagnosticCode = DiagnosticCode::new(1, 0x0004);
    pub const EXPECTED_DECLARATION: DiagnosticCode = DiagnosticCode::new(1, 0x0005);
    pub const UNEXPECTED_TOKEN: DiagnosticCode = DiagnosticCode::new(1, 0x0006);
}

/// Model builder diagnostics, class `0x2xxx`.
pub mod builder_codes {
    use super::DiagnosticCode;
    pub const VARIABLE_OUTSIDE_HOLDER: DiagnosticCode = DiagnosticCode::new(2, 0x0004);
    pub const RETURN_OUTSIDE_FUNCTION: DiagnosticCode = DiagnosticCode::new(2, 0x0007);
    pub const UNSUPPORTED_OPERATOR: DiagnosticCode = DiagnosticCode::new(2, 0x0008);
    pub const DUPLICATE_DEFINITION: DiagnosticCode = DiagnosticCode::new(2, 0x0009);
}

/// Type system diagnostics, class `0x3xxx`.
pub mod type_codes {
    use super::DiagnosticCode;
    pub const UNKNOWN_TYPE_NAME: DiagnosticCode = DiagnosticCode::new(3, 0x0001);
}

/// Resolver diagnostics, class `0x4xxx`.
pub mod resolver_codes {
    use super::DiagnosticCode;
    pub const UNRESOLVED_SYMBOL: DiagnosticCode = DiagnosticCode::new(4, 0x0001);
    pub const NOT_A_MEMBER: DiagnosticCode = DiagnosticCode::new(4, 0x0002);
    pub const NOT_NUMERIC: DiagnosticCode = DiagnosticCode::new(4, 0x0003);
    pub const NO_IMPLICIT_CONVERSION: DiagnosticCode = DiagnosticCode::new(4, 0x0004);
    pub const NOT_AN_LVALUE: DiagnosticCode = DiagnosticCode::new(4, 0x0005);
    pub const NOT_A_POINTER: DiagnosticCode = DiagnosticCode::new(4, 0x0006);
    pub const NOT_AN_ARRAY_OR_POINTER: DiagnosticCode = DiagnosticCode::new(4, 0x0007);
    pub const NOT_CALLABLE: DiagnosticCode = DiagnosticCode::new(4, 0x0008);
    pub const WRONG_ARGUMENT_COUNT: DiagnosticCode = DiagnosticCode::new(4, 0x0009);
    pub const AMBIGUOUS_CONVERSION: DiagnosticCode = DiagnosticCode::new(4, 0x000a);
    pub const ILLEGAL_CAST: DiagnosticCode = DiagnosticCode::new(4, 0x000b);
}

/// A single diagnostic record (spec §6.5).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub span: Span,
    pub message: String,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            span,
            message: message.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Collects diagnostics in emission order for a single compilation unit.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.records.push(diag);
    }

    pub fn report(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        span: Span,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(severity, code, span, message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.records
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    /// Number of records emitted so far. Used by speculative parsing to
    /// discard diagnostics raised by a rejected alternative.
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }
}

/// Renders diagnostics as `line,col - <severity> <5-hex code> : <message>`,
/// one per line, in emission order. No colour, no multi-line spans — this
/// spec requires neither.
pub struct DiagnosticsPrinter<'a> {
    diagnostics: &'a Diagnostics,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(diagnostics: &'a Diagnostics) -> Self {
        Self { diagnostics }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, d) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&render_one(d));
        }
        out
    }
}

fn render_one(d: &Diagnostic) -> String {
    format!(
        "{},{} - {} {} : {}",
        d.span.start.line, d.span.start.col, d.severity, d.code, d.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use klang_core::SourceCoord;

    fn span_at(line: u32, col: u32) -> Span {
        let coord = SourceCoord {
            pos: 0,
            line,
            col,
        };
        Span::point(coord)
    }

    #[test]
    fn renders_single_diagnostic_in_spec_format() {
        let mut diags = Diagnostics::new();
        diags.report(
            Severity::Error,
            resolver_codes::UNRESOLVED_SYMBOL,
            span_at(3, 12),
            "unresolved symbol 'q'",
        );
        let rendered = DiagnosticsPrinter::new(&diags).render();
        insta::assert_snapshot!(rendered, @"3,12 - error 40001 : unresolved symbol 'q'");
    }

    #[test]
    fn renders_multiple_diagnostics_in_emission_order() {
        let mut diags = Diagnostics::new();
        diags.report(Severity::Warning, lexer_codes::BAD_ESCAPE, span_at(1, 5), "bad escape");
        diags.report(Severity::Error, parser_codes::UNEXPECTED_TOKEN, span_at(2, 1), "unexpected token");
        let rendered = DiagnosticsPrinter::new(&diags).render();
        insta::assert_snapshot!(rendered, @r"
        1,5 - warning 00002 : bad escape
        2,1 - error 10006 : unexpected token
        ");
    }

    #[test]
    fn error_count_ignores_warnings_and_info() {
        let mut diags = Diagnostics::new();
        diags.report(Severity::Warning, lexer_codes::BAD_ESCAPE, span_at(1, 1), "w");
        diags.report(Severity::Info, lexer_codes::BAD_ESCAPE, span_at(1, 1), "i");
        assert_eq!(diags.error_count(), 0);
        assert!(!diags.has_errors());
        diags.report(Severity::Error, lexer_codes::BAD_ESCAPE, span_at(1, 1), "e");
        assert_eq!(diags.error_count(), 1);
        assert!(diags.has_errors());
    }
}
