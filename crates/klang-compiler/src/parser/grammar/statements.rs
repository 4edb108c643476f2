//! Statement grammar (spec §4.2):
//! `block | return | if_else | while | for | variable_decl | expression ';'`

use super::super::{ParseResult, Parser};
use super::expressions::{parse_conditional_expr, parse_expr};
use super::types::parse_type_spec;
use crate::ast::{Block, Specifiers, Stmt, VariableDecl};
use crate::lexer::{Keyword, Op, Punct, TokenKind};

pub(crate) fn parse_block(p: &mut Parser<'_, '_>) -> ParseResult<Block> {
    let start = p.current().span;
    p.expect_punct(Punct::BraceOpen, "'{'")?;
    let mut statements = Vec::new();
    while !p.at_punct(Punct::BraceClose) && !p.eof() {
        match parse_statement(p) {
            Ok(stmt) => statements.push(stmt),
            Err(_) => resync_to_statement_boundary(p),
        }
    }
    let end = p.current().span;
    p.expect_punct(Punct::BraceClose, "'}'")?;
    Ok(Block { statements, span: start.to(end) })
}

/// Skip tokens until the next `;` (consumed) or `}`/EOF (left for the
/// caller), so a single malformed statement doesn't abort the whole block.
fn resync_to_statement_boundary(p: &mut Parser<'_, '_>) {
    while !p.eof() && !p.at_punct(Punct::BraceClose) {
        if p.eat_punct(Punct::Semicolon) {
            return;
        }
        p.skip_one();
    }
}

pub(crate) fn parse_statement(p: &mut Parser<'_, '_>) -> ParseResult<Stmt> {
    if p.at_punct(Punct::BraceOpen) {
        return Ok(Stmt::Block(parse_block(p)?));
    }
    if p.at_keyword(Keyword::Return) {
        return parse_return(p);
    }
    if p.at_keyword(Keyword::If) {
        return parse_if(p);
    }
    if p.at_keyword(Keyword::While) {
        return parse_while(p);
    }
    if p.at_keyword(Keyword::For) {
        return parse_for(p);
    }
    if let Some(result) = try_parse_local_var_decl(p) {
        return result.map(Stmt::VarDecl);
    }
    parse_expr_statement(p)
}

fn parse_return(p: &mut Parser<'_, '_>) -> ParseResult<Stmt> {
    let start = p.current().span;
    p.expect_keyword(Keyword::Return, "'return'")?;
    let value = if p.at_punct(Punct::Semicolon) { None } else { Some(parse_expr(p)?) };
    let end = p.current().span;
    p.expect_punct(Punct::Semicolon, "';'")?;
    Ok(Stmt::Return { value, span: start.to(end) })
}

fn parse_if(p: &mut Parser<'_, '_>) -> ParseResult<Stmt> {
    let start = p.current().span;
    p.expect_keyword(Keyword::If, "'if'")?;
    p.expect_punct(Punct::ParenOpen, "'('")?;
    let condition = parse_expr(p)?;
    p.expect_punct(Punct::ParenClose, "')'")?;
    let then_branch = Box::new(parse_statement(p)?);
    let else_branch = if p.eat_keyword(Keyword::Else) {
        Some(Box::new(parse_statement(p)?))
    } else {
        None
    };
    let span = start.to(p.prev_span());
    Ok(Stmt::If { condition, then_branch, else_branch, span })
}

fn parse_while(p: &mut Parser<'_, '_>) -> ParseResult<Stmt> {
    let start = p.current().span;
    p.expect_keyword(Keyword::While, "'while'")?;
    p.expect_punct(Punct::ParenOpen, "'('")?;
    let condition = parse_expr(p)?;
    p.expect_punct(Punct::ParenClose, "')'")?;
    let body = Box::new(parse_statement(p)?);
    let span = start.to(p.prev_span());
    Ok(Stmt::While { condition, body, span })
}

fn parse_for(p: &mut Parser<'_, '_>) -> ParseResult<Stmt> {
    let start = p.current().span;
    p.expect_keyword(Keyword::For, "'for'")?;
    p.expect_punct(Punct::ParenOpen, "'('")?;

    let init = match try_parse_local_var_decl(p) {
        Some(Ok(vd)) => Some(Box::new(Stmt::VarDecl(vd))),
        Some(Err(e)) => return Err(e),
        None => {
            if p.eat_punct(Punct::Semicolon) {
                None
            } else {
                let expr_span = p.current().span;
                let expr = parse_expr(p)?;
                let span = expr.span();
                p.expect_punct(Punct::Semicolon, "';'")?;
                Some(Box::new(Stmt::Expr { expr, span: expr_span.to(span) }))
            }
        }
    };

    let condition = if p.at_punct(Punct::Semicolon) {
        None
    } else {
        Some(parse_expr(p)?)
    };
    p.expect_punct(Punct::Semicolon, "';'")?;

    let step = if p.at_punct(Punct::ParenClose) { None } else { Some(parse_expr(p)?) };
    p.expect_punct(Punct::ParenClose, "')'")?;

    let body = Box::new(parse_statement(p)?);
    let span = start.to(p.prev_span());
    Ok(Stmt::For { init, condition, step, body, span })
}

fn parse_expr_statement(p: &mut Parser<'_, '_>) -> ParseResult<Stmt> {
    let start = p.current().span;
    let expr = parse_expr(p)?;
    let end = p.current().span;
    p.expect_punct(Punct::Semicolon, "';'")?;
    Ok(Stmt::Expr { expr, span: start.to(end) })
}

/// `('static'|'const')* identifier ':' type ('=' conditional)? ';'`
///
/// Returns `None` (cursor untouched) if the upcoming tokens don't match
/// this shape at all, so the caller can fall back to an expression
/// statement. Once the `identifier ':'` prefix is matched the production
/// is committed: a further failure propagates rather than rolling back.
pub(super) fn try_parse_local_var_decl(p: &mut Parser<'_, '_>) -> Option<ParseResult<VariableDecl>> {
    let mark = p.save();
    let start = p.current().span;
    let mut specifiers = Specifiers::default();
    loop {
        if p.eat_keyword(Keyword::Static) {
            specifiers.is_static = true;
        } else if p.eat_keyword(Keyword::Const) {
            specifiers.is_const = true;
        } else {
            break;
        }
    }
    if !matches!(p.current().kind, TokenKind::Identifier) {
        p.restore(mark);
        return None;
    }
    let name = p.bump().text.clone();
    if !p.eat_op(Op::Colon) {
        p.restore(mark);
        return None;
    }
    Some(finish_var_decl(p, specifiers, name, start))
}

fn finish_var_decl(
    p: &mut Parser<'_, '_>,
    specifiers: Specifiers,
    name: String,
    start: klang_core::Span,
) -> ParseResult<VariableDecl> {
    let ty = parse_type_spec(p)?;
    let initializer = if p.eat_op(Op::Assign) {
        Some(parse_conditional_expr(p)?)
    } else {
        None
    };
    let end = p.current().span;
    p.expect_punct(Punct::Semicolon, "';'")?;
    Ok(VariableDecl { specifiers, name, ty, initializer, span: start.to(end) })
}
