//! Single entry point for a compilation unit (spec §4.2): lexes, parses,
//! builds the model and resolves it, handing back either the finished
//! [`Unit`] or the diagnostics collected up to the first fatal stage.

use crate::ast;
use crate::diagnostics::Diagnostics;
use crate::lexer::lex;
use crate::mangle;
use crate::model::{self, FunctionId, Model, VariableId};
use crate::parser::{ParseLimits, Parser};
use crate::resolve::resolve_model;
use crate::{Error, Result};

/// Tunables for a single compilation. Currently just the expression
/// parser's recursion fuel (spec §9).
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitConfig {
    pub parse_limits: ParseLimits,
}

/// A lexed, parsed, built and resolved compilation unit — the model a
/// downstream code generator consumes.
pub struct Unit {
    ast: ast::Unit,
    model: Model,
    diagnostics: Diagnostics,
}

impl Unit {
    /// Runs the full pipeline over `src` with default limits.
    pub fn compile_str(src: &str) -> Result<Self> {
        Self::compile_str_with(src, UnitConfig::default())
    }

    pub fn compile_str_with(src: &str, config: UnitConfig) -> Result<Self> {
        let mut diagnostics = Diagnostics::new();

        let tokens = lex(src, &mut diagnostics);
        let parser = Parser::with_limits(&tokens, &mut diagnostics, config.parse_limits);
        let ast = parser.parse_unit();
        if diagnostics.has_errors() {
            return Err(Error::ParsingError(diagnostics));
        }

        let mut model = model::build_model(&ast, &mut diagnostics);
        if diagnostics.has_errors() {
            return Err(Error::ResolutionError(diagnostics));
        }

        resolve_model(&mut model, &mut diagnostics);
        if diagnostics.has_errors() {
            return Err(Error::ResolutionError(diagnostics));
        }

        Ok(Self { ast, model, diagnostics })
    }

    pub fn ast(&self) -> &ast::Unit {
        &self.ast
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn mangle_function(&self, id: FunctionId) -> String {
        mangle::mangle_function(&self.model, id)
    }

    pub fn mangle_global_variable(&self, id: VariableId) -> String {
        mangle::mangle_global_variable(&self.model, id)
    }
}

#[cfg(test)]
mod tests;
