//! Positional cursor over a lexed token stream (spec §4.1).
//!
//! `get` skips comments on read but counts them, so that `unget(n)` undoes
//! exactly the last `n` logical reads (comments included) rather than `n`
//! raw tokens. `tell`/`seek` back the parser's save/rollback pattern
//! (spec §4.2): a production takes a checkpoint, tries an alternative, and
//! seeks back to the checkpoint if it fails.

use super::token::{Token, TokenKind};

pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Position recorded before each logical `get`, so `unget(n)` can
    /// restore exactly the state before the nth-previous `get`.
    history: Vec<usize>,
}

impl<'a> TokenCursor<'a> {
    /// `tokens` must end with an `Eof` token.
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token stream must end with Eof"
        );
        Self {
            tokens,
            pos: 0,
            history: Vec::new(),
        }
    }

    fn skip_comments_from(&self, mut idx: usize) -> usize {
        while self.tokens[idx].is_trivia() && idx + 1 < self.tokens.len() {
            idx += 1;
        }
        idx
    }

    /// Advance past any comments and return the next token, consuming it.
    pub fn get(&mut self) -> &'a Token {
        self.history.push(self.pos);
        let idx = self.skip_comments_from(self.pos);
        self.pos = idx;
        if !matches!(self.tokens[idx].kind, TokenKind::Eof) {
            self.pos = idx + 1;
        }
        &self.tokens[idx]
    }

    /// Undo the last `n` logical `get` calls.
    pub fn unget(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(p) = self.history.pop() {
                self.pos = p;
            }
        }
    }

    /// Look at the next non-comment token without consuming it.
    pub fn pick(&self) -> &'a Token {
        let idx = self.skip_comments_from(self.pos);
        &self.tokens[idx]
    }

    /// Opaque checkpoint for backtracking.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Restore a checkpoint obtained from `tell`.
    pub fn seek(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub fn eof(&self) -> bool {
        matches!(self.pick().kind, TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::token::{CommentKind, Keyword};
    use klang_core::Span;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token {
            kind,
            span: Span::point(klang_core::SourceCoord::START),
            text: text.to_string(),
        }
    }

    fn sample() -> Vec<Token> {
        vec![
            tok(TokenKind::Keyword(Keyword::Return), "return"),
            tok(TokenKind::Comment(CommentKind::Line), "// hi"),
            tok(TokenKind::Identifier, "x"),
            tok(TokenKind::Eof, ""),
        ]
    }

    #[test]
    fn get_skips_comments() {
        let toks = sample();
        let mut cur = TokenCursor::new(&toks);
        assert!(matches!(cur.get().kind, TokenKind::Keyword(Keyword::Return)));
        assert!(matches!(cur.get().kind, TokenKind::Identifier));
        assert!(matches!(cur.get().kind, TokenKind::Eof));
    }

    #[test]
    fn pick_does_not_consume() {
        let toks = sample();
        let mut cur = TokenCursor::new(&toks);
        cur.get();
        assert!(matches!(cur.pick().kind, TokenKind::Identifier));
        assert!(matches!(cur.pick().kind, TokenKind::Identifier));
        assert!(matches!(cur.get().kind, TokenKind::Identifier));
    }

    #[test]
    fn unget_restores_comment_skip_too() {
        let toks = sample();
        let mut cur = TokenCursor::new(&toks);
        cur.get(); // return
        cur.get(); // x (skips the comment)
        cur.unget(1);
        // After ungetting the second get, we should see the comment-skipping
        // `x` token again, not the comment itself.
        assert!(matches!(cur.get().kind, TokenKind::Identifier));
    }

    #[test]
    fn tell_and_seek_round_trip() {
        let toks = sample();
        let mut cur = TokenCursor::new(&toks);
        cur.get();
        let mark = cur.tell();
        cur.get();
        cur.seek(mark);
        assert!(matches!(cur.get().kind, TokenKind::Identifier));
    }

    #[test]
    fn eof_at_the_end() {
        let toks = sample();
        let mut cur = TokenCursor::new(&toks);
        assert!(!cur.eof());
        cur.get();
        cur.get();
        assert!(cur.eof());
    }

    #[test]
    fn getting_past_eof_stays_at_eof() {
        let toks = sample();
        let mut cur = TokenCursor::new(&toks);
        cur.get();
        cur.get();
        cur.get();
        cur.get();
        assert!(cur.eof());
    }
}
