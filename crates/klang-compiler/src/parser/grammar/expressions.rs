//! Expression grammar (spec §4.2), highest to lowest precedence:
//! primary → postfix → unary → cast → pointer-to-member → multiplicative
//! → additive → shift → relational → equality → bit-and → bit-xor →
//! bit-or → logical-and → logical-or → conditional → assignment →
//! expression list.
//!
//! Every binary level is implemented right-recursively, so the resulting
//! tree is right-associative top to bottom, matching the stated design.

use super::super::{ParseResult, Parser};
use super::types::parse_type_spec;
use crate::ast::{BinOp, Expr, Literal, UnaryOp};
use crate::diagnostics::parser_codes;
use crate::lexer::{Keyword, Op, Punct, TokenKind};

/// Full expression including the top-level comma operator; used for
/// statement expressions and variable initializers.
pub(crate) fn parse_expr(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    parse_expr_list(p)
}

/// Assignment-level expression, excluding the comma operator; used
/// wherever commas are separators (call arguments, subscripts).
pub(crate) fn parse_assignment_expr(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    parse_assignment(p)
}

/// Conditional-level expression (no top-level assignment); used for
/// variable initializers (spec §4.2: `'=' conditional`).
pub(crate) fn parse_conditional_expr(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    parse_conditional(p)
}

fn parse_expr_list(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    let start = p.current().span;
    let mut items = vec![parse_assignment(p)?];
    let mut last_span = items[0].span();
    while p.eat_punct(Punct::Comma) {
        let next = parse_assignment(p)?;
        last_span = next.span();
        items.push(next);
    }
    if items.len() == 1 {
        Ok(items.pop().unwrap())
    } else {
        Ok(Expr::ExprList(items, start.to(last_span)))
    }
}

fn assignment_op(o: Op) -> Option<BinOp> {
    Some(match o {
        Op::Assign => BinOp::Assign,
        Op::PlusEq => BinOp::AddAssign,
        Op::MinusEq => BinOp::SubAssign,
        Op::StarEq => BinOp::MulAssign,
        Op::SlashEq => BinOp::DivAssign,
        Op::PercentEq => BinOp::ModAssign,
        Op::ShlEq => BinOp::ShlAssign,
        Op::ShrEq => BinOp::ShrAssign,
        Op::AmpEq => BinOp::BitAndAssign,
        Op::PipeEq => BinOp::BitOrAssign,
        Op::CaretEq => BinOp::BitXorAssign,
        _ => return None,
    })
}

fn parse_assignment(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    let left = parse_conditional(p)?;
    let op = match p.current().kind {
        TokenKind::Op(o) => assignment_op(o),
        _ => None,
    };
    match op {
        Some(op) => {
            p.bump();
            let right = parse_assignment(p)?; // right-associative
            let span = left.span().to(right.span());
            Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right), span })
        }
        None => Ok(left),
    }
}

fn parse_conditional(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    let condition = parse_logical_or(p)?;
    if p.eat_op(Op::Question) {
        let then_value = parse_assignment(p)?;
        p.expect_op(Op::Colon, "':'")?;
        let else_value = parse_assignment(p)?; // right-associative chaining of nested ternaries
        let span = condition.span().to(else_value.span());
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
            span,
        })
    } else {
        Ok(condition)
    }
}

macro_rules! left_binds_right_assoc {
    ($name:ident, $next:ident, [$(($tok:pat, $op:expr)),+ $(,)?]) => {
        fn $name(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
            let left = $next(p)?;
            let op = match p.current().kind {
                $( TokenKind::Op($tok) => Some($op), )+
                _ => None,
            };
            match op {
                Some(op) => {
                    p.bump();
                    let right = $name(p)?;
                    let span = left.span().to(right.span());
                    Ok(Expr::Binary { op, left: Box::new(left), right: Box::new(right), span })
                }
                None => Ok(left),
            }
        }
    };
}

left_binds_right_assoc!(parse_logical_or, parse_logical_and, [(Op::PipePipe, BinOp::Or)]);
left_binds_right_assoc!(parse_logical_and, parse_bit_or, [(Op::AmpAmp, BinOp::And)]);
left_binds_right_assoc!(parse_bit_or, parse_bit_xor, [(Op::Pipe, BinOp::BitOr)]);
left_binds_right_assoc!(parse_bit_xor, parse_bit_and, [(Op::Caret, BinOp::BitXor)]);
left_binds_right_assoc!(parse_bit_and, parse_equality, [(Op::Amp, BinOp::BitAnd)]);
left_binds_right_assoc!(
    parse_equality,
    parse_relational,
    [(Op::Eq, BinOp::Eq), (Op::Ne, BinOp::Ne)]
);
left_binds_right_assoc!(
    parse_relational,
    parse_shift,
    [
        (Op::Lt, BinOp::Lt),
        (Op::Le, BinOp::Le),
        (Op::Gt, BinOp::Gt),
        (Op::Ge, BinOp::Ge),
    ]
);
left_binds_right_assoc!(
    parse_shift,
    parse_additive,
    [(Op::Shl, BinOp::Shl), (Op::Shr, BinOp::Shr)]
);
left_binds_right_assoc!(
    parse_additive,
    parse_multiplicative,
    [(Op::Plus, BinOp::Add), (Op::Minus, BinOp::Sub)]
);
left_binds_right_assoc!(
    parse_multiplicative,
    parse_ptr_to_member,
    [
        (Op::Star, BinOp::Mul),
        (Op::Slash, BinOp::Div),
        (Op::Percent, BinOp::Mod),
    ]
);
left_binds_right_assoc!(
    parse_ptr_to_member,
    parse_cast,
    [
        (Op::DotStar, BinOp::PtrToMemberObject),
        (Op::ArrowStar, BinOp::PtrToMemberPointer),
    ]
);

/// `(type) cast_expr`, tried speculatively before falling through to a
/// plain unary expression (and, below that, a parenthesized grouping).
///
/// A bare `(identifier)` is syntactically a valid type specifier too
/// (zero postfixes), so it's ambiguous with a parenthesized identifier
/// expression without a symbol table. The whole cast — type *and*
/// operand — is attempted as one speculative unit: if no valid operand
/// follows the closing paren, the attempt rolls back entirely and
/// `parse_unary` reparses the parens as a grouped expression instead.
fn parse_cast(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    if p.at_punct(Punct::ParenOpen) {
        let start = p.current().span;
        let probed = p.try_speculative(|p| {
            p.bump();
            let ty = parse_type_spec(p)?;
            p.expect_punct(Punct::ParenClose, "')'")?;
            let operand = parse_cast(p)?;
            Ok((ty, operand))
        });
        if let Some((target, operand)) = probed {
            let span = start.to(operand.span());
            return Ok(Expr::Cast { target, operand: Box::new(operand), span });
        }
    }
    parse_unary(p)
}

fn prefix_unary_op(o: Op) -> Option<UnaryOp> {
    Some(match o {
        Op::PlusPlus => UnaryOp::PreIncrement,
        Op::MinusMinus => UnaryOp::PreDecrement,
        Op::Star => UnaryOp::Deref,
        Op::Amp => UnaryOp::AddressOf,
        Op::Plus => UnaryOp::Plus,
        Op::Minus => UnaryOp::Negate,
        Op::Bang => UnaryOp::LogicalNot,
        Op::Tilde => UnaryOp::BitNot,
        _ => return None,
    })
}

fn parse_unary(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    let start = p.current().span;
    let op = match p.current().kind {
        TokenKind::Op(o) => prefix_unary_op(o),
        _ => None,
    };
    match op {
        Some(op) => {
            p.bump();
            if !p.enter_recursion() {
                return Err(p.error_here(parser_codes::EXPECTED_EXPRESSION, "expression nested too deeply"));
            }
            let operand = parse_unary(p)?;
            p.exit_recursion();
            let span = start.to(operand.span());
            Ok(Expr::Unary { op, operand: Box::new(operand), span })
        }
        None => parse_postfix(p),
    }
}

fn parse_postfix(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    let mut expr = parse_primary(p)?;
    loop {
        if p.at_op(Op::PlusPlus) {
            let span = p.bump().span;
            expr = Expr::Unary { op: UnaryOp::PostIncrement, span: expr.span().to(span), operand: Box::new(expr) };
        } else if p.at_op(Op::MinusMinus) {
            let span = p.bump().span;
            expr = Expr::Unary { op: UnaryOp::PostDecrement, span: expr.span().to(span), operand: Box::new(expr) };
        } else if p.eat_punct(Punct::BracketOpen) {
            let index = parse_expr(p)?;
            let end = p.current().span;
            p.expect_punct(Punct::BracketClose, "']'")?;
            let span = expr.span().to(end);
            expr = Expr::Subscript { array: Box::new(expr), index: Box::new(index), span };
        } else if p.eat_punct(Punct::ParenOpen) {
            let arguments = parse_argument_list(p)?;
            let end = p.current().span;
            p.expect_punct(Punct::ParenClose, "')'")?;
            let span = expr.span().to(end);
            expr = Expr::Call { callee: Box::new(expr), arguments, span };
        } else if p.eat_op(Op::Dot) {
            let member_span = p.current().span;
            let member = p.expect_identifier("a member name after '.'")?;
            let span = expr.span().to(member_span);
            expr = Expr::Member { object: Box::new(expr), member, via_pointer: false, span };
        } else if p.eat_op(Op::Arrow) {
            let member_span = p.current().span;
            let member = p.expect_identifier("a member name after '->'")?;
            let span = expr.span().to(member_span);
            expr = Expr::Member { object: Box::new(expr), member, via_pointer: true, span };
        } else {
            break;
        }
    }
    Ok(expr)
}

fn parse_argument_list(p: &mut Parser<'_, '_>) -> ParseResult<Vec<Expr>> {
    let mut args = Vec::new();
    if p.at_punct(Punct::ParenClose) {
        return Ok(args);
    }
    args.push(parse_assignment_expr(p)?);
    while p.eat_punct(Punct::Comma) {
        args.push(parse_assignment_expr(p)?);
    }
    Ok(args)
}

fn parse_primary(p: &mut Parser<'_, '_>) -> ParseResult<Expr> {
    match p.current().kind {
        TokenKind::Integer { base, unsigned, size, prefix_len, content_len } => {
            let tok = p.bump();
            let start = prefix_len as usize;
            let end = start + content_len as usize;
            let digits = tok.text[start..end].to_string();
            Ok(Expr::Literal(Literal::Integer { base, unsigned, size, digits }, tok.span))
        }
        TokenKind::Float { size, content_len } => {
            let tok = p.bump();
            let digits = tok.text[..content_len as usize].to_string();
            Ok(Expr::Literal(Literal::Float { size, digits }, tok.span))
        }
        TokenKind::Char => {
            let tok = p.bump();
            let value = decode_char_text(&tok.text);
            Ok(Expr::Literal(Literal::Char(value), tok.span))
        }
        TokenKind::Str => {
            let tok = p.bump();
            let value = decode_string_text(&tok.text);
            Ok(Expr::Literal(Literal::Str(value), tok.span))
        }
        TokenKind::Bool(b) => {
            let tok = p.bump();
            Ok(Expr::Literal(Literal::Bool(b), tok.span))
        }
        TokenKind::Null => {
            let tok = p.bump();
            Ok(Expr::Literal(Literal::Null, tok.span))
        }
        TokenKind::Keyword(Keyword::This) => {
            let tok = p.bump();
            Ok(Expr::This(tok.span))
        }
        TokenKind::Identifier => {
            let start = p.current().span;
            let name = p.parse_qualified_name()?;
            let span = start.to(p.prev_span());
            Ok(Expr::Identifier(name, span))
        }
        TokenKind::Punct(Punct::ColonColon) => {
            let start = p.current().span;
            let name = p.parse_qualified_name()?;
            let span = start.to(p.prev_span());
            Ok(Expr::Identifier(name, span))
        }
        TokenKind::Punct(Punct::ParenOpen) => {
            p.bump();
            let inner = parse_expr(p)?;
            p.expect_punct(Punct::ParenClose, "')'")?;
            Ok(inner)
        }
        _ => Err(p.error_and_bump(parser_codes::EXPECTED_EXPRESSION, "expected an expression")),
    }
}

fn decode_escaped(s: &str) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < s.len() {
        if s.as_bytes()[i] == b'\\' {
            if let Some(esc) = crate::lexer::escapes::decode(&s[i + 1..]) {
                out.push(esc.value);
                i += 1 + esc.len;
                continue;
            }
        }
        let ch = s[i..].chars().next().expect("non-empty slice has a char");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn decode_string_text(raw: &str) -> String {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
    decode_escaped(inner)
}

fn decode_char_text(raw: &str) -> char {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
    decode_escaped(inner).chars().next().unwrap_or('\0')
}
