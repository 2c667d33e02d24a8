//! Input cursor shared by every grammar primitive.
//!
//! The cursor walks the source one `char` at a time, tracking the 1-based
//! line and column. Alternatives backtrack by restoring a [`Checkpoint`];
//! the error at the furthest position reached is remembered so that a
//! failed parse points at the first character no alternative could match.

use crate::parser::{ParseError, ParseErrorKind};
use crate::token::Span;

/// Saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: usize,
    line: usize,
    column: usize,
}

/// Position within the input being parsed.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    furthest: Option<ParseError>,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            furthest: None,
        }
    }

    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    #[must_use]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    #[must_use]
    pub const fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }

    /// Byte offset into the input.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.pos
    }

    /// Consume one character.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consume characters while `pred` holds and return them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        &self.input[start..self.pos]
    }

    #[must_use]
    pub const fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub const fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
    }

    /// Build an "expected ..." error at the current position.
    pub fn expected(&mut self, expected: impl Into<String>) -> ParseError {
        let err = ParseError {
            kind: ParseErrorKind::Expected {
                expected: expected.into(),
                found: self.peek(),
            },
            span: self.span(),
        };
        self.record(&err);
        err
    }

    pub(crate) fn record(&mut self, err: &ParseError) {
        let further = self
            .furthest
            .as_ref()
            .is_none_or(|current| err.span > current.span);
        if further {
            self.furthest = Some(err.clone());
        }
    }

    /// The error recorded at the furthest position, if any.
    pub fn take_furthest(&mut self) -> Option<ParseError> {
        self.furthest.take()
    }
}
