use super::*;
use crate::diagnostics::Diagnostics;

fn lex_ok(src: &str) -> Vec<Token> {
    let mut diags = Diagnostics::new();
    let toks = lex(src, &mut diags);
    assert!(
        !diags.has_errors(),
        "unexpected lexer errors for {src:?}: {diags:?}"
    );
    toks
}

fn kinds(toks: &[Token]) -> Vec<String> {
    toks.iter().map(|t| format!("{:?}", t.kind)).collect()
}

#[test]
fn empty_input_produces_only_eof() {
    let toks = lex_ok("");
    assert_eq!(toks.len(), 1);
    assert!(matches!(toks[0].kind, TokenKind::Eof));
}

#[test]
fn keywords_are_recognized() {
    let toks = lex_ok("module import namespace public protected private static const abstract final this return");
    let kw: Vec<_> = toks[..toks.len() - 1]
        .iter()
        .map(|t| match t.kind {
            TokenKind::Keyword(k) => k,
            _ => panic!("expected keyword, got {:?}", t.kind),
        })
        .collect();
    assert_eq!(
        kw,
        vec![
            Keyword::Module,
            Keyword::Import,
            Keyword::Namespace,
            Keyword::Public,
            Keyword::Protected,
            Keyword::Private,
            Keyword::Static,
            Keyword::Const,
            Keyword::Abstract,
            Keyword::Final,
            Keyword::This,
            Keyword::Return,
        ]
    );
}

#[test]
fn identifiers_and_literals_are_distinguished_from_keywords() {
    let toks = lex_ok("foo true false null bar_2");
    assert!(matches!(toks[0].kind, TokenKind::Identifier));
    assert!(matches!(toks[1].kind, TokenKind::Bool(true)));
    assert!(matches!(toks[2].kind, TokenKind::Bool(false)));
    assert!(matches!(toks[3].kind, TokenKind::Null));
    assert!(matches!(toks[4].kind, TokenKind::Identifier));
}

#[test]
fn decimal_integer_literal() {
    let toks = lex_ok("42");
    match toks[0].kind {
        TokenKind::Integer {
            base,
            unsigned,
            size,
            prefix_len,
            content_len,
        } => {
            assert_eq!(base, NumericBase::Decimal);
            assert!(!unsigned);
            assert_eq!(size, IntegerSize::Int);
            assert_eq!(prefix_len, 0);
            assert_eq!(content_len, 2);
        }
        other => panic!("expected integer, got {other:?}"),
    }
    assert_eq!(toks[0].text, "42");
}

#[test]
fn hex_integer_literal_with_prefix() {
    let toks = lex_ok("0x1A");
    match toks[0].kind {
        TokenKind::Integer {
            base, prefix_len, content_len, ..
        } => {
            assert_eq!(base, NumericBase::Hexadecimal);
            assert_eq!(prefix_len, 2);
            assert_eq!(content_len, 2);
        }
        other => panic!("expected integer, got {other:?}"),
    }
}

#[test]
fn binary_and_octal_prefixes() {
    let toks = lex_ok("0b101 0o17");
    assert!(matches!(
        toks[0].kind,
        TokenKind::Integer {
            base: NumericBase::Binary,
            ..
        }
    ));
    assert!(matches!(
        toks[1].kind,
        TokenKind::Integer {
            base: NumericBase::Octal,
            ..
        }
    ));
}

#[test]
fn old_style_leading_zero_octal_chain() {
    let toks = lex_ok("0755");
    match toks[0].kind {
        TokenKind::Integer { base, prefix_len, .. } => {
            assert_eq!(base, NumericBase::Octal);
            assert_eq!(prefix_len, 1);
        }
        other => panic!("expected integer, got {other:?}"),
    }
}

#[test]
fn leading_zero_with_eight_or_nine_is_decimal() {
    let toks = lex_ok("089");
    match toks[0].kind {
        TokenKind::Integer { base, .. } => assert_eq!(base, NumericBase::Decimal),
        other => panic!("expected integer, got {other:?}"),
    }
}

#[test]
fn integer_suffixes_set_size_and_signedness() {
    let toks = lex_ok("1u 2l 3ll 4s 5b");
    let expect = [
        (true, IntegerSize::Int),
        (false, IntegerSize::Long),
        (false, IntegerSize::LongLong),
        (false, IntegerSize::Short),
        (false, IntegerSize::BigInt),
    ];
    for (tok, (unsigned, size)) in toks.iter().zip(expect.iter()) {
        match tok.kind {
            TokenKind::Integer {
                unsigned: u, size: s, ..
            } => {
                assert_eq!(u, *unsigned);
                assert_eq!(s, *size);
            }
            other => panic!("expected integer, got {other:?}"),
        }
    }
}

#[test]
fn float_literal_with_fraction_and_exponent() {
    let toks = lex_ok("3.14 1e10 2.5e-3f");
    assert!(matches!(toks[0].kind, TokenKind::Float { size: FloatSize::Double, .. }));
    assert!(matches!(toks[1].kind, TokenKind::Float { .. }));
    assert!(matches!(
        toks[2].kind,
        TokenKind::Float {
            size: FloatSize::Float,
            ..
        }
    ));
}

#[test]
fn bare_zero_is_a_decimal_integer() {
    let toks = lex_ok("0");
    match toks[0].kind {
        TokenKind::Integer { base, content_len, .. } => {
            assert_eq!(base, NumericBase::Decimal);
            assert_eq!(content_len, 1);
        }
        other => panic!("expected integer, got {other:?}"),
    }
}

#[test]
fn string_literal_content_and_span() {
    let toks = lex_ok(r#""hello""#);
    assert!(matches!(toks[0].kind, TokenKind::Str));
    assert_eq!(toks[0].text, r#""hello""#);
}

#[test]
fn string_literal_with_escapes() {
    let toks = lex_ok(r#""a\nb\"c""#);
    assert!(matches!(toks[0].kind, TokenKind::Str));
}

#[test]
fn char_literal() {
    let toks = lex_ok(r"'a'");
    assert!(matches!(toks[0].kind, TokenKind::Char));
    assert_eq!(toks[0].text, "'a'");
}

#[test]
fn char_literal_with_escape() {
    let toks = lex_ok(r"'\n'");
    assert!(matches!(toks[0].kind, TokenKind::Char));
}

#[test]
fn line_comment_is_kept_in_stream() {
    let toks = lex_ok("x // trailing\ny");
    assert_eq!(
        kinds(&toks),
        vec![
            format!("{:?}", TokenKind::Identifier),
            format!("{:?}", TokenKind::Comment(CommentKind::Line)),
            format!("{:?}", TokenKind::Identifier),
            format!("{:?}", TokenKind::Eof),
        ]
    );
}

#[test]
fn block_comment_spans_multiple_lines() {
    let toks = lex_ok("/* one\ntwo */ z");
    assert!(matches!(toks[0].kind, TokenKind::Comment(CommentKind::Block)));
    assert_eq!(toks[0].span.start.line, 1);
    assert_eq!(toks[0].span.end.line, 2);
}

#[test]
fn slash_alone_is_division_operator() {
    let toks = lex_ok("a / b");
    assert!(matches!(toks[1].kind, TokenKind::Op(Op::Slash)));
}

#[test]
fn longest_match_operators() {
    let toks = lex_ok("a <<= b");
    assert!(matches!(toks[1].kind, TokenKind::Op(Op::ShlEq)));
}

#[test]
fn punctuators_are_recognized() {
    let toks = lex_ok("( ) { } [ ] ; , :: @");
    let expected = [
        Punct::ParenOpen,
        Punct::ParenClose,
        Punct::BraceOpen,
        Punct::BraceClose,
        Punct::BracketOpen,
        Punct::BracketClose,
        Punct::Semicolon,
        Punct::Comma,
        Punct::ColonColon,
        Punct::At,
    ];
    for (tok, p) in toks.iter().zip(expected.iter()) {
        match tok.kind {
            TokenKind::Punct(got) => assert_eq!(format!("{got:?}"), format!("{p:?}")),
            other => panic!("expected punct, got {other:?}"),
        }
    }
}

#[test]
fn source_coordinates_track_lines_and_columns() {
    let toks = lex_ok("a\nb");
    assert_eq!(toks[0].span.start, klang_core::SourceCoord { pos: 0, line: 1, col: 1 });
    assert_eq!(toks[1].span.start, klang_core::SourceCoord { pos: 2, line: 2, col: 1 });
}

#[test]
fn crlf_counts_as_a_single_line_increment() {
    let toks = lex_ok("a\r\nb");
    assert_eq!(toks[1].span.start.line, 2);
    assert_eq!(toks[1].span.start.col, 1);
}

#[test]
fn content_equals_source_byte_range_for_every_lexeme() {
    let src = "foo = 42 + bar;";
    let toks = lex_ok(src);
    for t in &toks {
        if matches!(t.kind, TokenKind::Eof) {
            continue;
        }
        assert_eq!(&src[t.span.byte_range()], t.text);
    }
}

#[test]
fn unknown_character_reports_diagnostic_and_continues() {
    let mut diags = Diagnostics::new();
    let toks = lex("a $ b", &mut diags);
    assert!(diags.has_errors());
    // Lexing continues past the bad character.
    assert!(matches!(toks[0].kind, TokenKind::Identifier));
    assert!(matches!(toks.last().unwrap().kind, TokenKind::Eof));
}

#[test]
fn missing_digits_after_base_prefix_warns_and_continues() {
    let mut diags = Diagnostics::new();
    let toks = lex("0x ;", &mut diags);
    assert!(!diags.has_errors());
    assert!(!diags.is_empty());
    assert!(matches!(toks[0].kind, TokenKind::Integer { .. }));
}
