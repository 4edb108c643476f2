//! Punctuator and operator tables (spec §6.3).
//!
//! The lexer accumulates consecutive operator/punctuator characters and
//! then applies longest-prefix match repeatedly against this table. The
//! table is ordered by descending spelling length so that, e.g., `<<=`
//! beats `<<` beats `<`.

use super::token::{Op, Punct};

#[derive(Clone, Copy, Debug)]
pub enum Lexeme {
    Punct(Punct),
    Op(Op),
}

/// Ordered by descending length; entries of equal length may appear in any
/// order since their spellings are mutually exclusive prefixes.
pub static TABLE: &[(&str, Lexeme)] = &[
    ("<<=", Lexeme::Op(Op::ShlEq)),
    (">>=", Lexeme::Op(Op::ShrEq)),
    ("->*", Lexeme::Op(Op::ArrowStar)),
    ("<=>", Lexeme::Op(Op::Spaceship)),
    ("...", Lexeme::Punct(Punct::Ellipsis)),
    ("::", Lexeme::Punct(Punct::ColonColon)),
    ("->", Lexeme::Op(Op::Arrow)),
    (".*", Lexeme::Op(Op::DotStar)),
    ("==", Lexeme::Op(Op::Eq)),
    ("!=", Lexeme::Op(Op::Ne)),
    (">=", Lexeme::Op(Op::Ge)),
    ("<=", Lexeme::Op(Op::Le)),
    ("&&", Lexeme::Op(Op::AmpAmp)),
    ("||", Lexeme::Op(Op::PipePipe)),
    ("++", Lexeme::Op(Op::PlusPlus)),
    ("--", Lexeme::Op(Op::MinusMinus)),
    ("**", Lexeme::Op(Op::StarStar)),
    ("<<", Lexeme::Op(Op::Shl)),
    (">>", Lexeme::Op(Op::Shr)),
    ("+=", Lexeme::Op(Op::PlusEq)),
    ("-=", Lexeme::Op(Op::MinusEq)),
    ("*=", Lexeme::Op(Op::StarEq)),
    ("/=", Lexeme::Op(Op::SlashEq)),
    ("&=", Lexeme::Op(Op::AmpEq)),
    ("|=", Lexeme::Op(Op::PipeEq)),
    ("^=", Lexeme::Op(Op::CaretEq)),
    ("%=", Lexeme::Op(Op::PercentEq)),
    ("(", Lexeme::Punct(Punct::ParenOpen)),
    (")", Lexeme::Punct(Punct::ParenClose)),
    ("{", Lexeme::Punct(Punct::BraceOpen)),
    ("}", Lexeme::Punct(Punct::BraceClose)),
    ("[", Lexeme::Punct(Punct::BracketOpen)),
    ("]", Lexeme::Punct(Punct::BracketClose)),
    (";", Lexeme::Punct(Punct::Semicolon)),
    (",", Lexeme::Punct(Punct::Comma)),
    ("@", Lexeme::Punct(Punct::At)),
    (".", Lexeme::Op(Op::Dot)),
    ("?", Lexeme::Op(Op::Question)),
    (":", Lexeme::Op(Op::Colon)),
    ("!", Lexeme::Op(Op::Bang)),
    ("~", Lexeme::Op(Op::Tilde)),
    ("=", Lexeme::Op(Op::Assign)),
    ("+", Lexeme::Op(Op::Plus)),
    ("-", Lexeme::Op(Op::Minus)),
    ("*", Lexeme::Op(Op::Star)),
    ("/", Lexeme::Op(Op::Slash)),
    ("&", Lexeme::Op(Op::Amp)),
    ("|", Lexeme::Op(Op::Pipe)),
    ("^", Lexeme::Op(Op::Caret)),
    ("%", Lexeme::Op(Op::Percent)),
    (">", Lexeme::Op(Op::Gt)),
    ("<", Lexeme::Op(Op::Lt)),
];

/// Longest spelling in the table that `input` starts with, if any.
pub fn longest_match(input: &str) -> Option<(&'static str, Lexeme)> {
    TABLE
        .iter()
        .find(|(spelling, _)| input.starts_with(spelling))
        .map(|&(spelling, lexeme)| (spelling, lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_longest_shift_assign_over_shift_over_less_than() {
        let (spelling, _) = longest_match("<<=x").unwrap();
        assert_eq!(spelling, "<<=");
    }

    #[test]
    fn prefers_shift_over_single_less_than() {
        let (spelling, _) = longest_match("<< x").unwrap();
        assert_eq!(spelling, "<<");
    }

    #[test]
    fn falls_back_to_single_char() {
        let (spelling, _) = longest_match("< x").unwrap();
        assert_eq!(spelling, "<");
    }

    #[test]
    fn ellipsis_beats_two_dots_and_one_dot() {
        let (spelling, _) = longest_match("...rest").unwrap();
        assert_eq!(spelling, "...");
    }

    #[test]
    fn table_is_sorted_by_descending_length() {
        let lens: Vec<usize> = TABLE.iter().map(|(s, _)| s.len()).collect();
        let mut sorted = lens.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }
}
