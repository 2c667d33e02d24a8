//! Token model for the concrete syntax tree.
//!
//! Every node of the tree is a [`Token`]. Leaf tokens hold the exact text
//! they were parsed from; aggregate tokens own an ordered list of children
//! and derive both their rendered text and their semantic value from them.

use crate::Error;
use crate::parser::{self, ParseError, ParseOptions, WhitespaceMode, parse_complete};
use crate::render::quote_if_needed;

/// Source location for error reporting (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Quote character that wrapped a literal or identifier in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteChar {
    /// `'...'`
    Single,
    /// `"..."`
    Double,
}

impl QuoteChar {
    /// Quote characters in the order the grammar tries them.
    pub const ALL: [Self; 2] = [Self::Single, Self::Double];

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            _ => None,
        }
    }
}

/// Substitution modifier inside a braced variable reference
/// (`${NAME:-word}` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// `:-` use the word when unset or empty.
    DefaultIfUnsetOrEmpty,
    /// `-` use the word when unset.
    DefaultIfUnset,
    /// `:+` use the word when set and non-empty.
    AlternateIfSetAndNonEmpty,
    /// `+` use the word when set.
    AlternateIfSet,
    /// `:?` fail with the word when unset or empty.
    RequiredNonEmpty,
    /// `?` fail with the word when unset.
    Required,
}

impl Modifier {
    /// Recognized modifiers, two-character forms first so that `:-` is
    /// never read as `:` followed by a value starting with `-`.
    pub const ALL: [Self; 6] = [
        Self::DefaultIfUnsetOrEmpty,
        Self::AlternateIfSetAndNonEmpty,
        Self::RequiredNonEmpty,
        Self::DefaultIfUnset,
        Self::AlternateIfSet,
        Self::Required,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DefaultIfUnsetOrEmpty => ":-",
            Self::DefaultIfUnset => "-",
            Self::AlternateIfSetAndNonEmpty => ":+",
            Self::AlternateIfSet => "+",
            Self::RequiredNonEmpty => ":?",
            Self::Required => "?",
        }
    }

    /// Look up a modifier by its source symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == symbol)
    }
}

/// Token kinds, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    String,
    Whitespace,
    NewLine,
    LineContinuation,
    Comment,
    Symbol,
    Punctuation,
    Keyword,
    Identifier,
    Literal,
    VariableRef,
}

/// A node of the concrete syntax tree.
///
/// Tokens are compared by identity (`std::ptr::eq`), not by content, so
/// no `PartialEq` is provided.
#[derive(Debug, Clone)]
pub enum Token {
    /// Opaque run of characters.
    String(String),
    /// Run of spaces and tabs.
    Whitespace(String),
    /// `\n` or `\r\n`.
    NewLine(String),
    /// Escape character, optional whitespace, newline.
    LineContinuation(LineContinuationToken),
    /// `#` comment, without its line ending.
    Comment(String),
    /// Fixed syntactic characters (`:`, `--`, `:-`, an escape character).
    Symbol(String),
    /// Assignment punctuation (`=`).
    Punctuation(String),
    Keyword(KeywordToken),
    Identifier(IdentifierToken),
    Literal(LiteralToken),
    VariableRef(VariableRefToken),
}

impl Token {
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        match self {
            Self::String(_) => TokenKind::String,
            Self::Whitespace(_) => TokenKind::Whitespace,
            Self::NewLine(_) => TokenKind::NewLine,
            Self::LineContinuation(_) => TokenKind::LineContinuation,
            Self::Comment(_) => TokenKind::Comment,
            Self::Symbol(_) => TokenKind::Symbol,
            Self::Punctuation(_) => TokenKind::Punctuation,
            Self::Keyword(_) => TokenKind::Keyword,
            Self::Identifier(_) => TokenKind::Identifier,
            Self::Literal(_) => TokenKind::Literal,
            Self::VariableRef(_) => TokenKind::VariableRef,
        }
    }

    /// Child tokens of an aggregate, `None` for leaves.
    #[must_use]
    pub fn children(&self) -> Option<&[Self]> {
        match self {
            Self::LineContinuation(t) => Some(&t.children),
            Self::Keyword(t) => Some(&t.children),
            Self::Identifier(t) => Some(&t.children),
            Self::Literal(t) => Some(&t.children),
            Self::VariableRef(t) => Some(&t.children),
            Self::String(_)
            | Self::Whitespace(_)
            | Self::NewLine(_)
            | Self::Comment(_)
            | Self::Symbol(_)
            | Self::Punctuation(_) => None,
        }
    }

    pub(crate) const fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            Self::LineContinuation(t) => Some(&mut t.children),
            Self::Keyword(t) => Some(&mut t.children),
            Self::Identifier(t) => Some(&mut t.children),
            Self::Literal(t) => Some(&mut t.children),
            Self::VariableRef(t) => Some(&mut t.children),
            Self::String(_)
            | Self::Whitespace(_)
            | Self::NewLine(_)
            | Self::Comment(_)
            | Self::Symbol(_)
            | Self::Punctuation(_) => None,
        }
    }

    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Self::LineContinuation(_)
                | Self::Keyword(_)
                | Self::Identifier(_)
                | Self::Literal(_)
                | Self::VariableRef(_)
        )
    }

    /// Downcast to a typed aggregate token.
    #[must_use]
    pub fn as_typed<T: TypedToken>(&self) -> Option<&T> {
        T::from_token(self)
    }

    pub fn as_typed_mut<T: TypedToken>(&mut self) -> Option<&mut T> {
        T::from_token_mut(self)
    }
}

/// Conversion between [`Token`] and one of its aggregate payloads.
pub trait TypedToken: Sized {
    const KIND: TokenKind;

    fn from_token(token: &Token) -> Option<&Self>;

    fn from_token_mut(token: &mut Token) -> Option<&mut Self>;

    fn into_token(self) -> Token;
}

/// Aggregate tokens whose semantic value can be read and replaced as text.
pub trait ValueToken: TypedToken {
    /// Semantic value (children without quotes or line continuations).
    fn token_value(&self) -> String;

    /// Replace the content, parsed with the token's own grammar. A value
    /// the grammar rejects leaves the token unchanged.
    fn set_token_value(&mut self, value: &str, options: ParseOptions) -> Result<(), Error>;

    /// Build a token in canonical form from a semantic value.
    fn from_value(value: &str) -> Self;
}

macro_rules! typed_token {
    ($ty:ident, $variant:ident) => {
        impl TypedToken for $ty {
            const KIND: TokenKind = TokenKind::$variant;

            fn from_token(token: &Token) -> Option<&Self> {
                match token {
                    Token::$variant(t) => Some(t),
                    _ => None,
                }
            }

            fn from_token_mut(token: &mut Token) -> Option<&mut Self> {
                match token {
                    Token::$variant(t) => Some(t),
                    _ => None,
                }
            }

            fn into_token(self) -> Token {
                Token::$variant(self)
            }
        }

        impl From<$ty> for Token {
            fn from(token: $ty) -> Self {
                Self::$variant(token)
            }
        }
    };
}

typed_token!(LineContinuationToken, LineContinuation);
typed_token!(KeywordToken, Keyword);
typed_token!(IdentifierToken, Identifier);
typed_token!(LiteralToken, Literal);
typed_token!(VariableRefToken, VariableRef);

/// Iterate over the tokens of one typed kind.
pub fn tokens_of<'a, T: TypedToken + 'a>(tokens: &'a [Token]) -> impl Iterator<Item = &'a T> {
    tokens.iter().filter_map(T::from_token)
}

/// Merge adjacent `String` tokens and drop empty ones.
#[must_use]
pub fn collapse_strings(tokens: impl IntoIterator<Item = Token>) -> Vec<Token> {
    let mut out = Vec::new();
    let mut run = String::new();

    for token in tokens {
        if let Token::String(text) = token {
            run.push_str(&text);
        } else {
            if !run.is_empty() {
                out.push(Token::String(std::mem::take(&mut run)));
            }
            out.push(token);
        }
    }

    if !run.is_empty() {
        out.push(Token::String(run));
    }

    out
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::InvalidArgument {
            field,
            reason: "value must not be empty".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn invalid_value(field: &'static str, value: &str, err: &ParseError) -> Error {
    Error::InvalidArgument {
        field,
        reason: format!("{value:?} does not parse: {err}"),
    }
}

/// Escape character, optional whitespace and a newline.
#[derive(Debug, Clone)]
pub struct LineContinuationToken {
    pub(crate) children: Vec<Token>,
}

impl LineContinuationToken {
    #[must_use]
    pub fn new(escape_char: char, new_line: &str) -> Self {
        Self {
            children: vec![
                Token::Symbol(escape_char.to_string()),
                Token::NewLine(new_line.to_string()),
            ],
        }
    }

    pub(crate) const fn from_children(children: Vec<Token>) -> Self {
        Self { children }
    }

    #[must_use]
    pub fn children(&self) -> &[Token] {
        &self.children
    }

    #[must_use]
    pub fn escape_char(&self) -> Option<char> {
        self.children.iter().find_map(|t| match t {
            Token::Symbol(s) => s.chars().next(),
            _ => None,
        })
    }

    #[must_use]
    pub fn new_line(&self) -> Option<&str> {
        self.children.iter().find_map(|t| match t {
            Token::NewLine(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

/// Case-insensitive reserved word such as an instruction name.
#[derive(Debug, Clone)]
pub struct KeywordToken {
    pub(crate) children: Vec<Token>,
}

impl KeywordToken {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            children: vec![Token::String(value.to_string())],
        }
    }

    pub(crate) const fn from_children(children: Vec<Token>) -> Self {
        Self { children }
    }

    #[must_use]
    pub fn children(&self) -> &[Token] {
        &self.children
    }

    /// Replace the keyword text. Line continuations inside the old
    /// keyword are dropped.
    ///
    /// Only letters, digits, `-` and `_` are accepted.
    pub fn set_value(&mut self, value: &str) -> Result<(), Error> {
        require_non_empty("keyword", value)?;
        if let Some(ch) = value.chars().find(|&ch| !parser::is_keyword_char(ch)) {
            return Err(Error::InvalidArgument {
                field: "keyword",
                reason: format!("{ch:?} is not allowed in a keyword"),
            });
        }
        self.children = vec![Token::String(value.to_string())];
        Ok(())
    }
}

/// Name-like token, optionally quoted.
#[derive(Debug, Clone, Default)]
pub struct IdentifierToken {
    pub(crate) children: Vec<Token>,
    pub(crate) quote: Option<QuoteChar>,
}

impl IdentifierToken {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            children: vec![Token::String(value.to_string())],
            quote: None,
        }
    }

    pub(crate) const fn from_children(children: Vec<Token>, quote: Option<QuoteChar>) -> Self {
        Self { children, quote }
    }

    #[must_use]
    pub fn children(&self) -> &[Token] {
        &self.children
    }

    #[must_use]
    pub const fn quote_char(&self) -> Option<QuoteChar> {
        self.quote
    }

    /// Change the wrapping quote. Existing content is not re-escaped.
    pub const fn set_quote_char(&mut self, quote: Option<QuoteChar>) {
        self.quote = quote;
    }

    /// Replace the identifier text, keeping its quoting.
    pub fn set_value(&mut self, value: &str) -> Result<(), Error> {
        self.set_value_with(value, ParseOptions::default())
    }

    /// Replace the identifier text, keeping its quoting.
    ///
    /// The value must start with a letter or `_` and continue with
    /// letters, digits, `_`, `-`, `.`, escaped characters or variable
    /// references.
    pub fn set_value_with(&mut self, value: &str, options: ParseOptions) -> Result<(), Error> {
        require_non_empty("identifier", value)?;
        let quote = self.quote;
        let children = parse_complete(value, |c| {
            parser::identifier_content(
                c,
                options.escape_char,
                &parser::is_identifier_start,
                &parser::is_identifier_char,
                quote,
            )
        })
        .map_err(|err| invalid_value("identifier", value, &err))?;
        self.children = children;
        Ok(())
    }
}

/// Literal text, optionally quoted, possibly containing variable
/// references.
#[derive(Debug, Clone, Default)]
pub struct LiteralToken {
    pub(crate) children: Vec<Token>,
    pub(crate) quote: Option<QuoteChar>,
}

impl LiteralToken {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            children: collapse_strings([Token::String(value.to_string())]),
            quote: None,
        }
    }

    /// Literal wrapped in the given quote.
    #[must_use]
    pub fn quoted(value: &str, quote: QuoteChar) -> Self {
        Self {
            quote: Some(quote),
            ..Self::new(value)
        }
    }

    pub(crate) const fn from_children(children: Vec<Token>, quote: Option<QuoteChar>) -> Self {
        Self { children, quote }
    }

    #[must_use]
    pub fn children(&self) -> &[Token] {
        &self.children
    }

    #[must_use]
    pub const fn quote_char(&self) -> Option<QuoteChar> {
        self.quote
    }

    /// Change the wrapping quote. Existing content is not re-escaped.
    pub const fn set_quote_char(&mut self, quote: Option<QuoteChar>) {
        self.quote = quote;
    }

    /// Replace the literal text, keeping its quoting.
    ///
    /// The value is parsed as literal content, so `$NAME` becomes a
    /// variable reference. An unquoted literal is double-quoted when the
    /// value contains whitespace.
    pub fn set_value(&mut self, value: &str) -> Result<(), Error> {
        self.set_value_with(value, ParseOptions::default())
    }

    pub fn set_value_with(&mut self, value: &str, options: ParseOptions) -> Result<(), Error> {
        self.replace_content("literal", value, options.escape_char, &[], true)
    }

    /// Parse `value` as the content of this literal and swap it in.
    ///
    /// `excluded` lists characters an unquoted value may not contain. An
    /// empty unquoted value is only accepted with `allow_empty`.
    pub(crate) fn replace_content(
        &mut self,
        field: &'static str,
        value: &str,
        escape: char,
        excluded: &[char],
        allow_empty: bool,
    ) -> Result<(), Error> {
        let quote = self.quote.or_else(|| quote_if_needed(value));
        let children = if value.is_empty() {
            if quote.is_none() && !allow_empty {
                return Err(Error::InvalidArgument {
                    field,
                    reason: "value must not be empty".to_string(),
                });
            }
            Vec::new()
        } else {
            parse_complete(value, |c| {
                parser::literal_content(c, escape, WhitespaceMode::Disallowed, excluded, quote)
            })
            .map_err(|err| invalid_value(field, value, &err))?
        };
        self.quote = quote;
        self.children = children;
        Ok(())
    }

    /// Variable references directly inside this literal.
    pub fn variable_refs(&self) -> impl Iterator<Item = &VariableRefToken> {
        tokens_of::<VariableRefToken>(&self.children)
    }
}

/// `$NAME` or `${NAME}` with an optional modifier and modifier value.
///
/// Children are the name `String`, then for modified references a
/// `Symbol` holding the modifier and a `Literal` holding its value.
#[derive(Debug, Clone)]
pub struct VariableRefToken {
    pub(crate) children: Vec<Token>,
    pub(crate) braced: bool,
}

impl VariableRefToken {
    /// `$name`
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            children: vec![Token::String(name.to_string())],
            braced: false,
        }
    }

    /// `${name}` or `${name<modifier><value>}`
    #[must_use]
    pub fn braced(name: &str, modifier: Option<(Modifier, LiteralToken)>) -> Self {
        let mut children = vec![Token::String(name.to_string())];
        if let Some((modifier, value)) = modifier {
            children.push(Token::Symbol(modifier.as_str().to_string()));
            children.push(Token::Literal(value));
        }
        Self {
            children,
            braced: true,
        }
    }

    pub(crate) const fn from_children(children: Vec<Token>, braced: bool) -> Self {
        Self { children, braced }
    }

    #[must_use]
    pub fn children(&self) -> &[Token] {
        &self.children
    }

    #[must_use]
    pub const fn is_braced(&self) -> bool {
        self.braced
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.children
            .iter()
            .find_map(|t| match t {
                Token::String(s) => Some(s.as_str()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Rename the referenced variable.
    pub fn set_name(&mut self, name: &str) -> Result<(), Error> {
        require_non_empty("variable name", name)?;
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(crate::parser::is_variable_name_start)
            && chars.all(crate::parser::is_variable_name_char);
        if !valid {
            return Err(Error::InvalidArgument {
                field: "variable name",
                reason: format!("'{name}' is not a valid variable name"),
            });
        }

        match self.children.iter_mut().find(|t| matches!(t, Token::String(_))) {
            Some(slot) => *slot = Token::String(name.to_string()),
            None => self.children.insert(0, Token::String(name.to_string())),
        }
        Ok(())
    }

    #[must_use]
    pub fn modifier(&self) -> Option<Modifier> {
        self.children.iter().find_map(|t| match t {
            Token::Symbol(s) => Modifier::from_symbol(s),
            _ => None,
        })
    }

    #[must_use]
    pub fn modifier_value(&self) -> Option<&LiteralToken> {
        tokens_of::<LiteralToken>(&self.children).next()
    }
}
