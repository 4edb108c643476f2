//! K compiler front-end: lexer, parser, model builder, type resolver and
//! name mangler.
//!
//! - `lexer` - tokenizer
//! - `parser` / `ast` - recursive-descent parser and abstract syntax tree
//! - `model` - flattened, arena-based semantic model (namespaces, structs,
//!   functions, statements, expressions) built from the AST
//! - `types` - the type registry and type-system rules
//! - `resolve` - name/type resolution over the model
//! - `mangle` - link-name mangling
//! - `diagnostics` - error reporting
//! - `unit` - high-level `Unit` facade tying the pipeline together

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod mangle;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod types;
pub mod unit;

pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use unit::Unit;

/// Errors that can occur while compiling a unit. Both variants carry the
/// diagnostics collected up to the point of failure, so a caller can
/// still render a full report rather than just the first error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("parsing failed with {} errors", .0.error_count())]
    ParsingError(Diagnostics),

    #[error("resolution failed with {} errors", .0.error_count())]
    ResolutionError(Diagnostics),
}

pub type Result<T> = std::result::Result<T, Error>;
