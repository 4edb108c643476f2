//! Declaration grammar (spec §4.2):
//! `unit := module_decl? import* declaration*`
//! `module_decl := 'module' qualified_identifier ';'`
//! `import := 'import' identifier ';'`
//!
//! Declarations: visibility label, namespace, function, variable, struct.
//! A visibility label (`public:`/`protected:`/`private:`) sets the
//! visibility carried by subsequent declarations in the same list until
//! the next label, mirroring how the source reads.

use super::super::{ParseResult, Parser};
use super::expressions::parse_conditional_expr;
use super::statements::parse_block;
use super::types::parse_type_spec;
use crate::ast::{
    Decl, FunctionDecl, Import, NamespaceDecl, ParameterDecl, Specifiers, StructDecl, Unit,
    VariableDecl, Visibility,
};
use crate::diagnostics::parser_codes;
use crate::lexer::{Keyword, Op, Punct, TokenKind};

pub(crate) fn parse_unit(p: &mut Parser<'_, '_>) -> Unit {
    let start = p.current().span;
    let module_name = parse_module_decl(p);
    let mut imports = Vec::new();
    while p.at_keyword(Keyword::Import) {
        match parse_import(p) {
            Ok(import) => imports.push(import),
            Err(_) => resync_to_declaration_boundary(p),
        }
    }
    let declarations = parse_declaration_list(p, DeclContext::TopLevel);
    let end = p.prev_span();
    Unit { module_name, imports, declarations, span: start.to(end) }
}

fn parse_module_decl(p: &mut Parser<'_, '_>) -> Option<crate::ast::QualifiedName> {
    if !p.at_keyword(Keyword::Module) {
        return None;
    }
    p.try_speculative(|p| {
        p.bump();
        let name = p.parse_qualified_name()?;
        p.expect_punct(Punct::Semicolon, "';'")?;
        Ok(name)
    })
}

fn parse_import(p: &mut Parser<'_, '_>) -> ParseResult<Import> {
    let start = p.current().span;
    p.expect_keyword(Keyword::Import, "'import'")?;
    let name = p.expect_identifier("an imported name")?;
    let end = p.current().span;
    p.expect_punct(Punct::Semicolon, "';'")?;
    Ok(Import { name, span: start.to(end) })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DeclContext {
    TopLevel,
    Namespace,
    Struct,
}

fn at_declaration_terminator(p: &Parser<'_, '_>, ctx: DeclContext) -> bool {
    match ctx {
        DeclContext::TopLevel => p.eof(),
        DeclContext::Namespace | DeclContext::Struct => p.at_punct(Punct::BraceClose) || p.eof(),
    }
}

fn resync_to_declaration_boundary(p: &mut Parser<'_, '_>) {
    while !p.eof() && !p.at_punct(Punct::BraceClose) {
        if p.eat_punct(Punct::Semicolon) || p.eat_punct(Punct::BraceOpen) {
            // A stray opening brace likely starts the body we failed to
            // parse the header of; skip its contents too.
            let mut depth = 1u32;
            while depth > 0 && !p.eof() {
                if p.eat_punct(Punct::BraceOpen) {
                    depth += 1;
                } else if p.eat_punct(Punct::BraceClose) {
                    depth -= 1;
                } else {
                    p.skip_one();
                }
            }
            return;
        }
        p.skip_one();
    }
}

fn visibility_label(p: &mut Parser<'_, '_>) -> Option<Visibility> {
    let vis = if p.at_keyword(Keyword::Public) {
        Visibility::Public
    } else if p.at_keyword(Keyword::Protected) {
        Visibility::Protected
    } else if p.at_keyword(Keyword::Private) {
        Visibility::Private
    } else {
        return None;
    };
    p.try_speculative(|p| {
        p.bump();
        p.expect_op(Op::Colon, "':'")?;
        Ok(vis)
    })
}

fn parse_declaration_list(p: &mut Parser<'_, '_>, ctx: DeclContext) -> Vec<Decl> {
    let mut out = Vec::new();
    let mut visibility = None;
    while !at_declaration_terminator(p, ctx) {
        if let Some(vis) = visibility_label(p) {
            visibility = Some(vis);
            continue;
        }
        match parse_one_declaration(p, visibility, ctx) {
            Ok(decl) => out.push(decl),
            Err(_) => resync_to_declaration_boundary(p),
        }
    }
    out
}

fn parse_specifiers(p: &mut Parser<'_, '_>, visibility: Option<Visibility>) -> Specifiers {
    let mut specifiers = Specifiers { visibility, ..Specifiers::default() };
    loop {
        if p.eat_keyword(Keyword::Static) {
            specifiers.is_static = true;
        } else if p.eat_keyword(Keyword::Const) {
            specifiers.is_const = true;
        } else if p.eat_keyword(Keyword::Abstract) {
            specifiers.is_abstract = true;
        } else if p.eat_keyword(Keyword::Final) {
            specifiers.is_final = true;
        } else {
            break;
        }
    }
    specifiers
}

fn parse_one_declaration(p: &mut Parser<'_, '_>, visibility: Option<Visibility>, ctx: DeclContext) -> ParseResult<Decl> {
    if p.at_keyword(Keyword::Namespace) {
        if ctx == DeclContext::Struct {
            return Err(p.error_and_bump(parser_codes::EXPECTED_DECLARATION, "a namespace cannot nest inside a struct"));
        }
        return parse_namespace(p).map(Decl::Namespace);
    }
    let specifiers = parse_specifiers(p, visibility);
    if p.at_keyword(Keyword::Struct) {
        return parse_struct(p, specifiers).map(Decl::Struct);
    }
    parse_function_or_variable(p, specifiers)
}

fn parse_namespace(p: &mut Parser<'_, '_>) -> ParseResult<NamespaceDecl> {
    let start = p.current().span;
    p.expect_keyword(Keyword::Namespace, "'namespace'")?;
    let name = if matches!(p.current().kind, TokenKind::Identifier) {
        Some(p.bump().text.clone())
    } else {
        None
    };
    p.expect_punct(Punct::BraceOpen, "'{'")?;
    let declarations = parse_declaration_list(p, DeclContext::Namespace);
    let end = p.current().span;
    p.expect_punct(Punct::BraceClose, "'}'")?;
    Ok(NamespaceDecl { name, declarations, span: start.to(end) })
}

fn parse_struct(p: &mut Parser<'_, '_>, specifiers: Specifiers) -> ParseResult<StructDecl> {
    let start = p.current().span;
    p.expect_keyword(Keyword::Struct, "'struct'")?;
    let name = p.expect_identifier("a struct name")?;
    p.expect_punct(Punct::BraceOpen, "'{'")?;
    let members = parse_declaration_list(p, DeclContext::Struct);
    let end = p.current().span;
    p.expect_punct(Punct::BraceClose, "'}'")?;

    let mut fields = Vec::new();
    let mut methods = Vec::new();
    for member in members {
        match member {
            Decl::Variable(v) => fields.push(v),
            Decl::Function(f) => methods.push(f),
            Decl::Namespace(_) | Decl::Struct(_) => {
                // Rejected during `parse_one_declaration` above for
                // namespaces; nested structs aren't part of this grammar
                // either, so they're dropped rather than nested here.
            }
        }
    }
    Ok(StructDecl { specifiers, name, fields, methods, span: start.to(end) })
}

fn parse_function_or_variable(p: &mut Parser<'_, '_>, specifiers: Specifiers) -> ParseResult<Decl> {
    let start = p.current().span;
    let name = p.expect_identifier("a declaration name")?;
    if p.eat_punct(Punct::ParenOpen) {
        parse_function_rest(p, specifiers, name, start).map(Decl::Function)
    } else if p.eat_op(Op::Colon) {
        parse_variable_rest(p, specifiers, name, start).map(Decl::Variable)
    } else {
        Err(p.error_here(parser_codes::EXPECTED_DECLARATION, "expected '(' or ':' after declaration name"))
    }
}

fn parse_parameter_list(p: &mut Parser<'_, '_>) -> ParseResult<Vec<ParameterDecl>> {
    let mut params = Vec::new();
    if p.at_punct(Punct::ParenClose) {
        return Ok(params);
    }
    loop {
        let start = p.current().span;
        let name = p.expect_identifier("a parameter name")?;
        p.expect_op(Op::Colon, "':'")?;
        let ty = parse_type_spec(p)?;
        let end = p.prev_span();
        params.push(ParameterDecl { name, ty, span: start.to(end) });
        if !p.eat_punct(Punct::Comma) {
            break;
        }
    }
    Ok(params)
}

fn parse_function_rest(
    p: &mut Parser<'_, '_>,
    specifiers: Specifiers,
    name: String,
    start: klang_core::Span,
) -> ParseResult<FunctionDecl> {
    let parameters = parse_parameter_list(p)?;
    p.expect_punct(Punct::ParenClose, "')'")?;
    let return_type = if p.eat_op(Op::Colon) { Some(parse_type_spec(p)?) } else { None };
    let body = if p.at_punct(Punct::BraceOpen) {
        Some(parse_block(p)?)
    } else {
        p.expect_punct(Punct::Semicolon, "';' or a function body")?;
        None
    };
    let end = p.prev_span();
    Ok(FunctionDecl { specifiers, name, parameters, return_type, body, span: start.to(end) })
}

fn parse_variable_rest(
    p: &mut Parser<'_, '_>,
    specifiers: Specifiers,
    name: String,
    start: klang_core::Span,
) -> ParseResult<VariableDecl> {
    let ty = parse_type_spec(p)?;
    let initializer = if p.eat_op(Op::Assign) { Some(parse_conditional_expr(p)?) } else { None };
    let end = p.current().span;
    p.expect_punct(Punct::Semicolon, "';'")?;
    Ok(VariableDecl { specifiers, name, ty, initializer, span: start.to(end) })
}
