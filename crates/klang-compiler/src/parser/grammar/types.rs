//! Type specifiers (spec §4.2): a primitive or qualified-name base,
//! followed by left-associative postfixes `*`, `&`, `[integer?]`.

use super::super::{ParseResult, Parser};
use crate::ast::{PrimitiveKeyword, TypeSpec};
use crate::diagnostics::parser_codes;
use crate::lexer::{Keyword, Op, Punct, TokenKind};

fn primitive_keyword(k: Keyword) -> Option<PrimitiveKeyword> {
    Some(match k {
        Keyword::Bool => PrimitiveKeyword::Bool,
        Keyword::Byte => PrimitiveKeyword::Byte,
        Keyword::Char => PrimitiveKeyword::Char,
        Keyword::Short => PrimitiveKeyword::Short,
        Keyword::Int => PrimitiveKeyword::Int,
        Keyword::Long => PrimitiveKeyword::Long,
        Keyword::Float => PrimitiveKeyword::Float,
        Keyword::Double => PrimitiveKeyword::Double,
        _ => return None,
    })
}

pub(crate) fn parse_type_spec(p: &mut Parser<'_, '_>) -> ParseResult<TypeSpec> {
    let mut ty = parse_base_type(p)?;
    loop {
        if p.at_op(Op::Star) {
            let start = ty.span();
            let span = p.bump().span;
            ty = TypeSpec::Pointer(Box::new(ty), start.to(span));
        } else if p.at_op(Op::Amp) {
            let start = ty.span();
            let span = p.bump().span;
            ty = TypeSpec::Reference(Box::new(ty), start.to(span));
        } else if p.at_punct(Punct::BracketOpen) {
            let start = ty.span();
            p.bump();
            let size = if p.at_punct(Punct::BracketClose) {
                None
            } else {
                Some(parse_array_size(p)?)
            };
            let end = p.current().span;
            p.expect_punct(Punct::BracketClose, "']'")?;
            ty = TypeSpec::Array {
                element: Box::new(ty),
                size,
                span: start.to(end),
            };
        } else {
            break;
        }
    }
    Ok(ty)
}

fn parse_array_size(p: &mut Parser<'_, '_>) -> ParseResult<u64> {
    match p.current().kind {
        TokenKind::Integer { base, content_len, prefix_len, .. } => {
            let tok = p.bump();
            let digits = &tok.text[prefix_len as usize..(prefix_len + content_len) as usize];
            let radix = base as u32;
            u64::from_str_radix(digits, radix)
                .map_err(|_| p.error_here(parser_codes::EXPECTED_TOKEN, "malformed array size"))
        }
        _ => Err(p.error_here(parser_codes::EXPECTED_TOKEN, "expected an array size")),
    }
}

fn parse_base_type(p: &mut Parser<'_, '_>) -> ParseResult<TypeSpec> {
    let start = p.current().span;
    let unsigned = p.eat_keyword(Keyword::Unsigned);

    if let TokenKind::Keyword(k) = p.current().kind {
        if let Some(kw) = primitive_keyword(k) {
            let span = p.bump().span;
            return Ok(TypeSpec::Primitive {
                keyword: kw,
                unsigned,
                span: start.to(span),
            });
        }
    }

    if unsigned {
        // `unsigned` with no following primitive defaults to `unsigned int`.
        return Ok(TypeSpec::Primitive {
            keyword: PrimitiveKeyword::Int,
            unsigned: true,
            span: start,
        });
    }

    if matches!(p.current().kind, TokenKind::Identifier) || p.at_punct(Punct::ColonColon) {
        let name_start = p.current().span;
        let name = p.parse_qualified_name()?;
        let span = name_start.to(p.prev_span());
        return Ok(TypeSpec::Identified(name, span));
    }

    Err(p.error_here(parser_codes::EXPECTED_TYPE, "expected a type"))
}
