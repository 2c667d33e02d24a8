//! `key=value` pairs and `--key=value` flags.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use crate::Error;
use crate::cursor::Cursor;
use crate::parser::{
    PResult, ParseOptions, WhitespaceMode, keyword, literal, optional, parse_complete,
    punctuation, symbol, whitespace_run,
};
use crate::render::render_tokens;
use crate::token::{KeywordToken, LiteralToken, Token, TypedToken, ValueToken};

pub(crate) const FLAG_PREFIX: &str = "--";
pub(crate) const ASSIGNMENT: &str = "=";
/// Punctuation accepted between key and value. Whitespace is accepted too.
const SEPARATORS: [&str; 2] = [ASSIGNMENT, ":"];

fn inconsistent(what: &str) -> Error {
    Error::StructuralInconsistency(format!("key/value token {what}"))
}

fn is_separator(token: &Token) -> bool {
    match token {
        Token::Punctuation(p) => SEPARATORS.contains(&p.as_str()),
        Token::Whitespace(_) => true,
        _ => false,
    }
}

/// Optional `--`, the key, then optionally a separator (`=`, `:` or
/// whitespace) and the value.
pub fn key_value_tokens<K: TypedToken, V: TypedToken>(
    cursor: &mut Cursor<'_>,
    is_flag: bool,
    key: impl FnOnce(&mut Cursor<'_>) -> PResult<K>,
    value: impl FnOnce(&mut Cursor<'_>) -> PResult<V>,
) -> PResult<Vec<Token>> {
    let mut tokens = Vec::new();
    if is_flag {
        tokens.push(symbol(cursor, FLAG_PREFIX)?);
    }
    tokens.push(key(cursor)?.into_token());
    let assignment = optional(cursor, |c| {
        let punctuated = SEPARATORS
            .iter()
            .find_map(|separator| optional(c, |c| punctuation(c, separator)));
        let separator = match punctuated {
            Some(separator) => separator,
            None => whitespace_run(c).ok_or_else(|| c.expected("'=', ':' or whitespace"))?,
        };
        Ok([separator, value(c)?.into_token()])
    });
    tokens.extend(assignment.into_iter().flatten());
    Ok(tokens)
}

/// A key token, optionally followed by a separator and a value token.
///
/// In flag form the key is preceded by `--`.
#[derive(Debug, Clone)]
pub struct KeyValueToken<K, V> {
    tokens: Vec<Token>,
    options: ParseOptions,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: ValueToken, V: ValueToken> KeyValueToken<K, V> {
    /// Wrap raw tokens, checking that they have key/value shape.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error> {
        let mut rest = tokens.as_slice();
        if let [Token::Symbol(prefix), tail @ ..] = rest {
            if prefix == FLAG_PREFIX {
                rest = tail;
            }
        }
        let [key, tail @ ..] = rest else {
            return Err(inconsistent("has no key"));
        };
        if K::from_token(key).is_none() {
            return Err(inconsistent(&format!(
                "key is a {:?}, not a {:?}",
                key.kind(),
                K::KIND
            )));
        }
        match tail {
            [] => {}
            [separator, value] if is_separator(separator) && V::from_token(value).is_some() => {}
            _ => return Err(inconsistent("must end with a separator and a value")),
        }
        Ok(Self {
            tokens,
            options: ParseOptions::default(),
            _marker: PhantomData,
        })
    }

    /// Escape character used when the key or value is edited.
    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse `text` with the given key and value grammars.
    pub fn parse_with(
        text: &str,
        is_flag: bool,
        key: impl FnOnce(&mut Cursor<'_>) -> PResult<K>,
        value: impl FnOnce(&mut Cursor<'_>) -> PResult<V>,
    ) -> Result<Self, Error> {
        let tokens = parse_complete(text, |c| key_value_tokens(c, is_flag, key, value))?;
        Self::from_tokens(tokens)
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn is_flag(&self) -> bool {
        matches!(self.tokens.first(), Some(Token::Symbol(s)) if s == FLAG_PREFIX)
    }

    fn key_index(&self) -> usize {
        usize::from(self.is_flag())
    }

    #[must_use]
    pub fn key_token(&self) -> &K {
        self.tokens
            .get(self.key_index())
            .and_then(K::from_token)
            .unwrap_or_else(|| unreachable!("key/value token without a key"))
    }

    pub fn key_token_mut(&mut self) -> &mut K {
        let index = self.key_index();
        self.tokens
            .get_mut(index)
            .and_then(K::from_token_mut)
            .unwrap_or_else(|| unreachable!("key/value token without a key"))
    }

    #[must_use]
    pub fn key(&self) -> String {
        self.key_token().token_value()
    }

    pub fn set_key(&mut self, key: &str) -> Result<(), Error> {
        let options = self.options;
        self.key_token_mut().set_token_value(key, options)
    }

    #[must_use]
    pub fn value_token(&self) -> Option<&V> {
        self.tokens
            .get(self.key_index() + 2)
            .and_then(V::from_token)
    }

    pub fn value_token_mut(&mut self) -> Option<&mut V> {
        let index = self.key_index() + 2;
        self.tokens.get_mut(index).and_then(V::from_token_mut)
    }

    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.value_token().map(V::token_value)
    }

    /// Set or remove (`None`) the value.
    ///
    /// Removing drops the separator together with the value; adding a
    /// value where there was none appends `=` and the value. The value is
    /// parsed with the value token's grammar either way.
    pub fn set_value(&mut self, value: Option<&str>) -> Result<(), Error> {
        let Some(value) = value else {
            tracing::debug!("removing key/value value");
            self.tokens.truncate(self.key_index() + 1);
            return Ok(());
        };
        let options = self.options;
        if let Some(token) = self.value_token_mut() {
            return token.set_token_value(value, options);
        }
        let mut token = V::from_value(value);
        token.set_token_value(value, options)?;
        tracing::debug!("adding key/value value");
        self.tokens.push(Token::Punctuation(ASSIGNMENT.to_string()));
        self.tokens.push(token.into_token());
        Ok(())
    }

    #[must_use]
    pub fn render(&self) -> String {
        render_tokens(&self.tokens)
    }
}

impl<K: ValueToken, V: ValueToken> fmt::Display for KeyValueToken<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// `--start-period=<duration>`
#[derive(Debug, Clone)]
pub struct StartPeriodFlag(KeyValueToken<KeywordToken, LiteralToken>);

impl StartPeriodFlag {
    pub const KEY: &'static str = "start-period";

    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_with(text, ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self, Error> {
        let escape = options.escape_char;
        tracing::debug!(flag = Self::KEY, escape = %escape, "parsing flag");
        KeyValueToken::parse_with(
            text,
            true,
            |c| keyword(c, Self::KEY, escape),
            |c| literal(c, escape, WhitespaceMode::Disallowed, &[]),
        )
        .map(|flag| Self(flag.with_options(options)))
    }

    /// Set or remove (`None`) the duration.
    pub fn set_value(&mut self, value: Option<&str>) -> Result<(), Error> {
        self.0.set_value(value)
    }
}

impl Deref for StartPeriodFlag {
    type Target = KeyValueToken<KeywordToken, LiteralToken>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for StartPeriodFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
