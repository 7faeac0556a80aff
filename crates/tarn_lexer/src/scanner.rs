//! The scanner: a lazy token stream over source text.

use crate::token::{fixed, Token, TokenKind};
use crate::{Pos, Span};
use std::str::Chars;
use thiserror::Error;
use unicode_ident::{is_xid_continue, is_xid_start};

/// Errors produced while scanning.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unknown operator {text:?}")]
    UnknownOperator { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span } => *span,
            LexError::UnknownOperator { span, .. } => *span,
        }
    }
}

/// A pull scanner over source text with one-rune lookahead.
///
/// `scan` yields tokens until the source is exhausted; `Ok(None)` is end of
/// input. Whitespace is skipped; comments are yielded as tokens so callers
/// decide whether to keep them.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Chars<'a>,
    /// Byte offset of `current` within `source`.
    offset: u32,
    current: Option<char>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            source,
            chars,
            offset: 0,
            current,
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn scan(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let start = self.offset;

        match self.current {
            None => Ok(None),
            Some(c) if is_identifier_start(c) => Ok(Some(self.identifier(start))),
            Some('"') => self.string(start).map(Some),
            Some(c) if c.is_ascii_digit() => Ok(Some(self.integer(start))),
            Some('/') if self.peek_next() == Some('/') => Ok(Some(self.comment(start))),
            Some(_) => self.operator(start).map(Some),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let current = self.current;
        if let Some(c) = current {
            self.offset += c.len_utf8() as u32;
            self.current = self.chars.next();
        }
        current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn token(&self, kind: TokenKind, start: u32) -> Token {
        let span = Span::new(Pos(start + 1), Pos(self.offset + 1));
        Token::new(kind, span, &self.source[start as usize..self.offset as usize])
    }

    fn identifier(&mut self, start: u32) -> Token {
        self.advance();
        while let Some(c) = self.current {
            if is_identifier_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start as usize..self.offset as usize];
        let kind = match fixed().lookup(text) {
            TokenKind::Invalid => TokenKind::Identifier,
            keyword => keyword,
        };
        self.token(kind, start)
    }

    fn string(&mut self, start: u32) -> Result<Token, LexError> {
        self.advance();
        loop {
            match self.advance() {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: Span::new(Pos(start + 1), Pos(self.offset + 1)),
                    })
                }
                Some('"') => break,
                Some(_) => {}
            }
        }
        Ok(self.token(TokenKind::String, start))
    }

    fn integer(&mut self, start: u32) -> Token {
        while let Some(c) = self.current {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        self.token(TokenKind::Integer, start)
    }

    fn comment(&mut self, start: u32) -> Token {
        // Both slashes, then everything up to and including the newline.
        self.advance();
        self.advance();
        loop {
            match self.advance() {
                None | Some('\n') => break,
                Some(_) => {}
            }
        }
        self.token(TokenKind::Comment, start)
    }

    fn operator(&mut self, start: u32) -> Result<Token, LexError> {
        let first = self.advance().expect("operator called at end of input");

        let mut node = fixed().step(first);
        if let Some(mut n) = node {
            while let Some(c) = self.current {
                match n.step(c) {
                    Some(next) => {
                        n = next;
                        self.advance();
                    }
                    None => break,
                }
            }
            node = Some(n);
        }

        match node.map(|n| n.kind()) {
            Some(TokenKind::Invalid) | None => Err(LexError::UnknownOperator {
                text: self.source[start as usize..self.offset as usize].to_string(),
                span: Span::new(Pos(start + 1), Pos(self.offset + 1)),
            }),
            Some(kind) => Ok(self.token(kind, start)),
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '@' || c == '_' || is_xid_start(c)
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(source: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = scanner.scan().expect("scan failed") {
            tokens.push(token);
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan_all(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_a_binding() {
        assert_eq!(
            kinds("const std = @import(\"std\");"),
            vec![
                TokenKind::Const,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::String,
                TokenKind::CloseParen,
                TokenKind::Semicolon,
            ],
        );
    }

    #[test]
    fn adjacent_operator_splits_identifiers() {
        let tokens = scan_all("x+y");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "x");
        assert_eq!(tokens[1].kind, TokenKind::Plus);
        assert_eq!(tokens[2].text, "y");
    }

    #[test]
    fn longest_match_wins() {
        assert_eq!(kinds("..."), vec![TokenKind::Ellipses]);
        assert_eq!(kinds(". . ."), vec![TokenKind::Dot; 3]);
    }

    #[test]
    fn two_dots_are_rejected() {
        let mut scanner = Scanner::new("..");
        let err = scanner.scan().unwrap_err();
        assert!(matches!(err, LexError::UnknownOperator { ref text, .. } if text == ".."));
    }

    #[test]
    fn keywords_fold_and_near_keywords_do_not() {
        assert_eq!(kinds("func funcs forSome forsome"), vec![
            TokenKind::Func,
            TokenKind::Identifier,
            TokenKind::ForSome,
            TokenKind::Identifier,
        ]);
    }

    #[test]
    fn builtin_names_scan_as_identifiers() {
        let tokens = scan_all("@import @extern");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "@import");
        assert_eq!(tokens[1].text, "@extern");
    }

    #[test]
    fn unicode_identifiers() {
        let tokens = scan_all("π _x1");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "π");
        assert_eq!(tokens[1].text, "_x1");
    }

    #[test]
    fn string_text_keeps_quotes() {
        let tokens = scan_all(r#""hi\n""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, r#""hi\n""#);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut scanner = Scanner::new("\"oops");
        assert!(matches!(
            scanner.scan(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let tokens = scan_all("1 // two\n3");
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert_eq!(tokens[1].text, "// two\n");
        assert_eq!(tokens[2].text, "3");
    }

    #[test]
    fn comment_at_end_of_input_is_not_an_error() {
        let tokens = scan_all("// trailing");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "// trailing");
    }

    #[test]
    fn positions_are_one_based_and_match_the_source() {
        let source = "const x = 12;";
        for token in scan_all(source) {
            let start = (token.span.start.0 - 1) as usize;
            let end = (token.span.end.0 - 1) as usize;
            assert!(token.span.start <= token.span.end);
            assert_eq!(&source[start..end], token.text);
        }
    }

    #[test]
    fn lone_slash_is_an_unknown_operator() {
        let mut scanner = Scanner::new("/x");
        assert!(matches!(
            scanner.scan(),
            Err(LexError::UnknownOperator { .. })
        ));
    }
}
