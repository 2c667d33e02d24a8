//! Parsing-combinator engine.
//!
//! Every grammar primitive is a function `(cursor, ...) -> PResult<T>`.
//! A successful call leaves the cursor after the consumed prefix (the
//! remainder); a failed call built with [`attempt`] leaves it untouched.
//! Grammars are assembled from these primitives with [`attempt`],
//! [`optional`], [`many`], [`many1`] and [`first_of`].

use std::fmt;

use crate::cursor::Cursor;
use crate::token::{
    IdentifierToken, KeywordToken, LineContinuationToken, LiteralToken, Modifier, QuoteChar, Span,
    Token, VariableRefToken, collapse_strings,
};

const QUOTES: [char; 2] = [QuoteChar::Single.as_char(), QuoteChar::Double.as_char()];

/// Classifies a parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No alternative matched at this position.
    Expected {
        expected: String,
        found: Option<char>,
    },
    /// The grammar finished before the end of the input.
    TrailingInput { found: char },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected {
                expected,
                found: None,
            } => {
                write!(f, "expected {expected}, found end of input")
            }
            Self::Expected {
                expected,
                found: Some(ch),
            } => {
                write!(f, "expected {expected}, found {ch:?}")
            }
            Self::TrailingInput { found } => {
                write!(f, "unexpected {found:?}")
            }
        }
    }
}

/// Error produced when input does not match a grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

pub type PResult<T> = Result<T, ParseError>;

/// Per-parse configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Character introducing escapes and line continuations.
    pub escape_char: char,
}

impl ParseOptions {
    pub const DEFAULT_ESCAPE_CHAR: char = '\\';

    #[must_use]
    pub const fn with_escape_char(escape_char: char) -> Self {
        Self { escape_char }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::with_escape_char(Self::DEFAULT_ESCAPE_CHAR)
    }
}

/// How a literal treats spaces and tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitespaceMode {
    /// Whitespace ends the literal.
    Disallowed,
    /// Whitespace may separate content, with content on both sides.
    Separator,
    /// Whitespace is ordinary content.
    Literal,
}

// -----------------------------------------------------------
// Combinators.
// -----------------------------------------------------------

/// Run `parser`, rewinding the cursor if it fails.
pub fn attempt<T>(
    cursor: &mut Cursor<'_>,
    parser: impl FnOnce(&mut Cursor<'_>) -> PResult<T>,
) -> PResult<T> {
    let start = cursor.checkpoint();
    let result = parser(cursor);
    if result.is_err() {
        cursor.restore(start);
    }
    result
}

/// Run `parser`; a failure is not an error.
pub fn optional<T>(
    cursor: &mut Cursor<'_>,
    parser: impl FnOnce(&mut Cursor<'_>) -> PResult<T>,
) -> Option<T> {
    attempt(cursor, parser).ok()
}

/// Apply `parser` until it fails or stops consuming input.
pub fn many<T>(cursor: &mut Cursor<'_>, parser: impl Fn(&mut Cursor<'_>) -> PResult<T>) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        let before = cursor.offset();
        match attempt(cursor, &parser) {
            Ok(item) if cursor.offset() > before => items.push(item),
            Ok(_) | Err(_) => break,
        }
    }
    items
}

/// Like [`many`], but at least one match is required.
pub fn many1<T>(
    cursor: &mut Cursor<'_>,
    parser: impl Fn(&mut Cursor<'_>) -> PResult<T>,
) -> PResult<Vec<T>> {
    let first = attempt(cursor, &parser)?;
    let mut items = vec![first];
    items.extend(many(cursor, parser));
    Ok(items)
}

/// Try each alternative in order; the first match wins.
pub fn first_of<T>(
    cursor: &mut Cursor<'_>,
    alternatives: &[&dyn Fn(&mut Cursor<'_>) -> PResult<T>],
) -> PResult<T> {
    let mut last = None;
    for alternative in alternatives {
        match attempt(cursor, alternative) {
            Ok(value) => return Ok(value),
            Err(err) => last = Some(err),
        }
    }
    Err(last.unwrap_or_else(|| cursor.expected("one of several alternatives")))
}

/// Succeed only at the end of the input.
pub fn end_of_input(cursor: &mut Cursor<'_>) -> PResult<()> {
    match cursor.peek() {
        None => Ok(()),
        Some(found) => {
            let err = ParseError {
                kind: ParseErrorKind::TrailingInput { found },
                span: cursor.span(),
            };
            cursor.record(&err);
            Err(err)
        }
    }
}

/// Run `parser` over the whole of `input`.
///
/// On failure, the error reported is the one at the furthest position
/// any alternative reached.
pub fn parse_complete<T>(
    input: &str,
    parser: impl FnOnce(&mut Cursor<'_>) -> PResult<T>,
) -> Result<T, ParseError> {
    tracing::debug!(len = input.len(), "parsing");
    let mut cursor = Cursor::new(input);
    let result = parser(&mut cursor).and_then(|value| end_of_input(&mut cursor).map(|()| value));
    result.map_err(|err| {
        let err = cursor.take_furthest().unwrap_or(err);
        tracing::debug!(line = err.span.line, column = err.span.column, %err, "parse failed");
        err
    })
}

// -----------------------------------------------------------
// Character classes.
// -----------------------------------------------------------

/// Spaces, tabs and other whitespace that does not end a line.
#[must_use]
pub fn is_inline_whitespace(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n' && ch != '\r'
}

/// Characters of a keyword such as an instruction or flag name.
#[must_use]
pub fn is_keyword_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

#[must_use]
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

#[must_use]
pub fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

#[must_use]
pub const fn is_variable_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

#[must_use]
pub const fn is_variable_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Consume one character satisfying `pred`.
pub fn satisfy(
    cursor: &mut Cursor<'_>,
    expected: &str,
    pred: impl Fn(char) -> bool,
) -> PResult<char> {
    match cursor.peek() {
        Some(ch) if pred(ch) => {
            cursor.advance();
            Ok(ch)
        }
        _ => Err(cursor.expected(expected)),
    }
}

/// Consume exactly `text`.
pub fn eat(cursor: &mut Cursor<'_>, text: &str) -> PResult<()> {
    if !cursor.rest().starts_with(text) {
        return Err(cursor.expected(format!("'{text}'")));
    }
    for _ in text.chars() {
        cursor.advance();
    }
    Ok(())
}

// -----------------------------------------------------------
// Primitive tokens.
// -----------------------------------------------------------

pub fn symbol(cursor: &mut Cursor<'_>, text: &str) -> PResult<Token> {
    eat(cursor, text)?;
    Ok(Token::Symbol(text.to_string()))
}

pub fn punctuation(cursor: &mut Cursor<'_>, text: &str) -> PResult<Token> {
    eat(cursor, text)?;
    Ok(Token::Punctuation(text.to_string()))
}

/// `\n` or `\r\n`.
pub fn new_line(cursor: &mut Cursor<'_>) -> PResult<Token> {
    let text = if cursor.rest().starts_with("\r\n") {
        "\r\n"
    } else if cursor.rest().starts_with('\n') {
        "\n"
    } else {
        return Err(cursor.expected("new line"));
    };
    eat(cursor, text)?;
    Ok(Token::NewLine(text.to_string()))
}

/// A run of inline whitespace, if any.
pub fn whitespace_run(cursor: &mut Cursor<'_>) -> Option<Token> {
    let ws = cursor.take_while(is_inline_whitespace);
    (!ws.is_empty()).then(|| Token::Whitespace(ws.to_string()))
}

/// Inline whitespace followed by an optional newline. Never fails.
pub fn whitespace(cursor: &mut Cursor<'_>) -> Vec<Token> {
    let mut tokens: Vec<Token> = whitespace_run(cursor).into_iter().collect();
    tokens.extend(optional(cursor, new_line));
    tokens
}

/// Escape character, optional inline whitespace, then a newline.
pub fn line_continuation(cursor: &mut Cursor<'_>, escape: char) -> PResult<Token> {
    attempt(cursor, |c| {
        let mut children = vec![symbol(c, &escape.to_string())?];
        children.extend(whitespace_run(c));
        children.push(new_line(c)?);
        Ok(Token::LineContinuation(LineContinuationToken::from_children(
            children,
        )))
    })
}

fn at_line_continuation(cursor: &mut Cursor<'_>, escape: char) -> bool {
    let start = cursor.checkpoint();
    let found = line_continuation(cursor, escape).is_ok();
    cursor.restore(start);
    found
}

/// Escape character followed by any character other than a newline,
/// kept verbatim as a two-character string run.
pub fn escaped_char(cursor: &mut Cursor<'_>, escape: char) -> PResult<Token> {
    if at_line_continuation(cursor, escape) {
        return Err(cursor.expected("escaped character"));
    }
    attempt(cursor, |c| {
        satisfy(c, "escape character", |ch| ch == escape)?;
        let ch = satisfy(c, "escaped character", |ch| ch != '\n' && ch != '\r')?;
        Ok(Token::String(format!("{escape}{ch}")))
    })
}

/// A character matching `pred`, optionally preceded by line
/// continuations.
fn char_with_line_continuations(
    cursor: &mut Cursor<'_>,
    escape: char,
    expected: &str,
    pred: &dyn Fn(char) -> bool,
) -> PResult<Vec<Token>> {
    attempt(cursor, |c| {
        let mut tokens = many(c, |c| line_continuation(c, escape));
        tokens.push(Token::String(satisfy(c, expected, pred)?.to_string()));
        Ok(tokens)
    })
}

/// `#` up to the end of the line.
pub fn comment(cursor: &mut Cursor<'_>) -> PResult<Token> {
    if cursor.peek() != Some('#') {
        return Err(cursor.expected("'#'"));
    }
    let text = cursor.take_while(|ch| ch != '\n' && ch != '\r');
    Ok(Token::Comment(text.to_string()))
}

/// Leading whitespace, a comment and an optional newline.
pub fn comment_line(cursor: &mut Cursor<'_>) -> PResult<Vec<Token>> {
    attempt(cursor, |c| {
        let mut tokens = whitespace(c);
        tokens.push(comment(c)?);
        tokens.extend(optional(c, new_line));
        Ok(tokens)
    })
}

pub fn trailing_comments(cursor: &mut Cursor<'_>) -> Vec<Token> {
    many(cursor, comment_line).into_iter().flatten().collect()
}

/// Inline whitespace ending in a newline.
pub fn blank_line(cursor: &mut Cursor<'_>) -> PResult<Vec<Token>> {
    attempt(cursor, |c| {
        let mut tokens: Vec<Token> = whitespace_run(c).into_iter().collect();
        tokens.push(new_line(c)?);
        Ok(tokens)
    })
}

// -----------------------------------------------------------
// Keywords and instruction framing.
// -----------------------------------------------------------

/// Case-insensitive keyword; every character after the first may be
/// preceded by line continuations.
pub fn keyword(cursor: &mut Cursor<'_>, name: &str, escape: char) -> PResult<KeywordToken> {
    let label = format!("'{name}'");
    attempt(cursor, |c| {
        let mut tokens = Vec::new();
        for (i, expected) in name.chars().enumerate() {
            let matches = move |ch: char| ch.to_lowercase().eq(expected.to_lowercase());
            if i == 0 {
                tokens.push(Token::String(satisfy(c, &label, matches)?.to_string()));
            } else {
                tokens.extend(char_with_line_continuations(c, escape, &label, &matches)?);
            }
        }
        Ok(KeywordToken::from_children(collapse_strings(tokens)))
    })
}

fn keyword_boundary(cursor: &mut Cursor<'_>, escape: char) -> PResult<()> {
    match cursor.peek() {
        Some(ch) if !(is_inline_whitespace(ch) || ch == '\n' || ch == '\r' || ch == escape) => {
            Err(cursor.expected("whitespace after instruction name"))
        }
        _ => Ok(()),
    }
}

/// Leading whitespace, the instruction keyword, trailing whitespace, an
/// optional line continuation (with any comment or blank lines after
/// it), then the instruction's own grammar.
pub fn instruction(
    cursor: &mut Cursor<'_>,
    name: &str,
    escape: char,
    arguments: impl FnOnce(&mut Cursor<'_>) -> PResult<Vec<Token>>,
) -> PResult<Vec<Token>> {
    let mut tokens: Vec<Token> = whitespace_run(cursor).into_iter().collect();
    tokens.push(Token::Keyword(keyword(cursor, name, escape)?));
    keyword_boundary(cursor, escape)?;
    tokens.extend(whitespace_run(cursor));
    if let Some(continuation) = optional(cursor, |c| line_continuation(c, escape)) {
        tokens.push(continuation);
        let lines = many(cursor, |c| {
            first_of::<Vec<Token>>(c, &[&comment_line, &blank_line])
        });
        tokens.extend(lines.into_iter().flatten());
    }
    tokens.extend(arguments(cursor)?);
    Ok(tokens)
}

/// Instruction arguments surrounded by whitespace, followed by an
/// optional line continuation, newline and trailing comment lines.
pub fn argument_tokens(
    cursor: &mut Cursor<'_>,
    escape: char,
    arguments: impl FnOnce(&mut Cursor<'_>) -> PResult<Vec<Token>>,
) -> PResult<Vec<Token>> {
    let mut tokens: Vec<Token> = whitespace_run(cursor).into_iter().collect();
    tokens.extend(arguments(cursor)?);
    tokens.extend(whitespace_run(cursor));
    tokens.extend(optional(cursor, |c| line_continuation(c, escape)));
    tokens.extend(optional(cursor, new_line));
    tokens.extend(trailing_comments(cursor));
    Ok(tokens)
}

// -----------------------------------------------------------
// Quoting.
// -----------------------------------------------------------

/// Try `parser` wrapped in each quote character, then unwrapped.
///
/// The parser is told which quote (if any) surrounds it so that it can
/// exclude that character from its content.
pub fn wrapped_in_optional_quotes<T>(
    cursor: &mut Cursor<'_>,
    parser: impl Fn(&mut Cursor<'_>, Option<QuoteChar>) -> PResult<T>,
) -> PResult<(T, Option<QuoteChar>)> {
    for quote in QuoteChar::ALL {
        let q = quote.as_char();
        let wrapped = attempt(cursor, |c| {
            satisfy(c, "opening quote", |ch| ch == q)?;
            let inner = parser(c, Some(quote))?;
            satisfy(c, &format!("closing {q}"), |ch| ch == q)?;
            Ok(inner)
        });
        if let Ok(inner) = wrapped {
            return Ok((inner, Some(quote)));
        }
    }
    parser(cursor, None).map(|inner| (inner, None))
}

// -----------------------------------------------------------
// Variable references.
// -----------------------------------------------------------

fn starts_variable_reference(cursor: &Cursor<'_>) -> bool {
    cursor.peek() == Some('$')
        && cursor
            .peek_nth(1)
            .is_some_and(|ch| ch == '{' || is_variable_name_start(ch))
}

fn variable_name(cursor: &mut Cursor<'_>) -> PResult<String> {
    let head = satisfy(cursor, "variable name", is_variable_name_start)?;
    let tail = cursor.take_while(is_variable_name_char);
    Ok(format!("{head}{tail}"))
}

fn simple_variable_reference(cursor: &mut Cursor<'_>) -> PResult<VariableRefToken> {
    attempt(cursor, |c| {
        eat(c, "$")?;
        let name = variable_name(c)?;
        Ok(VariableRefToken::from_children(
            vec![Token::String(name)],
            false,
        ))
    })
}

fn modifier_symbol(cursor: &mut Cursor<'_>) -> PResult<Modifier> {
    for modifier in Modifier::ALL {
        if cursor.rest().starts_with(modifier.as_str()) {
            eat(cursor, modifier.as_str())?;
            return Ok(modifier);
        }
    }
    Err(cursor.expected("variable modifier"))
}

fn braced_variable_reference(cursor: &mut Cursor<'_>, escape: char) -> PResult<VariableRefToken> {
    attempt(cursor, |c| {
        eat(c, "${")?;
        let mut children = vec![Token::String(variable_name(c)?)];
        if let Some(modifier) = optional(c, modifier_symbol) {
            children.push(Token::Symbol(modifier.as_str().to_string()));
            let grammar = ValueGrammar {
                escape,
                mode: WhitespaceMode::Literal,
                excluded: &['}'],
                allow_variables: true,
            };
            let value = value_tokens(c, &grammar, true)?;
            children.push(Token::Literal(LiteralToken::from_children(value, None)));
        }
        eat(c, "}")?;
        Ok(VariableRefToken::from_children(children, true))
    })
}

/// `$NAME` or `${NAME}` / `${NAME<modifier><value>}`.
pub fn variable_reference(cursor: &mut Cursor<'_>, escape: char) -> PResult<VariableRefToken> {
    first_of::<VariableRefToken>(
        cursor,
        &[&simple_variable_reference, &|c: &mut Cursor<'_>| {
            braced_variable_reference(c, escape)
        }],
    )
}

// -----------------------------------------------------------
// Literals and identifiers.
// -----------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct ValueGrammar<'g> {
    escape: char,
    mode: WhitespaceMode,
    excluded: &'g [char],
    allow_variables: bool,
}

impl ValueGrammar<'_> {
    fn literal_char(&self, cursor: &mut Cursor<'_>) -> PResult<char> {
        let accepted = match cursor.peek() {
            None => false,
            Some(ch) if ch == self.escape || ch == '\n' || ch == '\r' => false,
            Some(ch) if self.excluded.contains(&ch) => false,
            Some(ch) if is_inline_whitespace(ch) => self.mode == WhitespaceMode::Literal,
            Some('$') => !starts_variable_reference(cursor),
            Some(_) => true,
        };
        if !accepted {
            return Err(cursor.expected("literal character"));
        }
        satisfy(cursor, "literal character", |_| true)
    }

    /// One content unit: optional line continuations, then a variable
    /// reference, a literal character or an escaped character.
    fn unit(&self, cursor: &mut Cursor<'_>) -> PResult<Vec<Token>> {
        attempt(cursor, |c| {
            let mut tokens = many(c, |c| line_continuation(c, self.escape));
            if self.allow_variables {
                if let Some(var) = optional(c, |c| variable_reference(c, self.escape)) {
                    tokens.push(Token::VariableRef(var));
                    return Ok(tokens);
                }
            }
            let content = match optional(c, |c| self.literal_char(c)) {
                Some(ch) => Token::String(ch.to_string()),
                None => escaped_char(c, self.escape)?,
            };
            tokens.push(content);
            Ok(tokens)
        })
    }
}

/// Sequence of content units. The first unit may not start with a line
/// continuation; in `Separator` mode whitespace must be followed by more
/// content.
fn value_tokens(
    cursor: &mut Cursor<'_>,
    grammar: &ValueGrammar<'_>,
    allow_empty: bool,
) -> PResult<Vec<Token>> {
    let mut tokens = Vec::new();
    loop {
        let first = tokens.is_empty();
        let unit = attempt(cursor, |c| {
            if first && at_line_continuation(c, grammar.escape) {
                return Err(c.expected("literal"));
            }
            let mut unit: Vec<Token> = Vec::new();
            if !first && grammar.mode == WhitespaceMode::Separator {
                unit.extend(whitespace_run(c));
            }
            unit.extend(grammar.unit(c)?);
            Ok(unit)
        });
        match unit {
            Ok(unit) => tokens.extend(unit),
            Err(err) if first && !allow_empty => return Err(err),
            Err(_) => break,
        }
    }
    Ok(collapse_strings(tokens))
}

/// Literal, optionally quoted, that may contain variable references.
///
/// Unquoted literals follow `mode` and stop at any character in
/// `excluded` and at quote characters. Quoted literals treat whitespace
/// as content, may be empty, and only stop at their closing quote.
pub fn literal(
    cursor: &mut Cursor<'_>,
    escape: char,
    mode: WhitespaceMode,
    excluded: &[char],
) -> PResult<LiteralToken> {
    let (children, quote) = wrapped_in_optional_quotes(cursor, |c, quote| {
        literal_content(c, escape, mode, excluded, quote)
    })?;
    Ok(LiteralToken::from_children(children, quote))
}

/// Children of a literal, without its quotes.
///
/// Inside `quote`, whitespace is content, the content may be empty and
/// only the quote character is excluded. Unquoted content is non-empty
/// and follows `mode` and `excluded`.
pub fn literal_content(
    cursor: &mut Cursor<'_>,
    escape: char,
    mode: WhitespaceMode,
    excluded: &[char],
    quote: Option<QuoteChar>,
) -> PResult<Vec<Token>> {
    match quote {
        Some(quote) => {
            let grammar = ValueGrammar {
                escape,
                mode: WhitespaceMode::Literal,
                excluded: &[quote.as_char()],
                allow_variables: true,
            };
            value_tokens(cursor, &grammar, true)
        }
        None => {
            let excluded: Vec<char> = excluded.iter().copied().chain(QUOTES).collect();
            let grammar = ValueGrammar {
                escape,
                mode,
                excluded: &excluded,
                allow_variables: true,
            };
            value_tokens(cursor, &grammar, false)
        }
    }
}

/// First character from `first`, then characters from `tail` (each may be
/// preceded by line continuations) or escaped characters.
fn identifier_run(
    cursor: &mut Cursor<'_>,
    escape: char,
    first: &dyn Fn(char) -> bool,
    tail: &dyn Fn(char) -> bool,
    excluded: &[char],
) -> PResult<Vec<Token>> {
    attempt(cursor, |c| {
        let head = satisfy(c, "identifier", |ch| first(ch) && !excluded.contains(&ch))?;
        let tail_char = |ch: char| tail(ch) && !excluded.contains(&ch);
        let rest = many(c, |c| {
            first_of::<Vec<Token>>(
                c,
                &[
                    &|c: &mut Cursor<'_>| {
                        char_with_line_continuations(c, escape, "identifier character", &tail_char)
                    },
                    &|c: &mut Cursor<'_>| escaped_char(c, escape).map(|t| vec![t]),
                ],
            )
        });
        let mut tokens = vec![Token::String(head.to_string())];
        tokens.extend(rest.into_iter().flatten());
        Ok(collapse_strings(tokens))
    })
}

fn excluded_for(quote: Option<QuoteChar>) -> Vec<char> {
    quote.map_or_else(|| QUOTES.to_vec(), |q| vec![q.as_char()])
}

/// Identifier, optionally quoted, with no variable references.
pub fn identifier(
    cursor: &mut Cursor<'_>,
    escape: char,
    first: &dyn Fn(char) -> bool,
    tail: &dyn Fn(char) -> bool,
) -> PResult<IdentifierToken> {
    let (children, quote) = wrapped_in_optional_quotes(cursor, |c, quote| {
        identifier_run(c, escape, first, tail, &excluded_for(quote))
    })?;
    Ok(IdentifierToken::from_children(children, quote))
}

/// Identifier, optionally quoted, whose runs may be interleaved with
/// variable references.
pub fn identifier_aggregate(
    cursor: &mut Cursor<'_>,
    escape: char,
    first: &dyn Fn(char) -> bool,
    tail: &dyn Fn(char) -> bool,
) -> PResult<IdentifierToken> {
    let (children, quote) = wrapped_in_optional_quotes(cursor, |c, quote| {
        identifier_content(c, escape, first, tail, quote)
    })?;
    Ok(IdentifierToken::from_children(children, quote))
}

/// Children of an identifier aggregate, without its quotes.
pub fn identifier_content(
    cursor: &mut Cursor<'_>,
    escape: char,
    first: &dyn Fn(char) -> bool,
    tail: &dyn Fn(char) -> bool,
    quote: Option<QuoteChar>,
) -> PResult<Vec<Token>> {
    let excluded = excluded_for(quote);
    let parts = many1(cursor, |c| {
        first_of::<Vec<Token>>(
            c,
            &[
                &|c: &mut Cursor<'_>| {
                    variable_reference(c, escape).map(|v| vec![Token::VariableRef(v)])
                },
                &|c: &mut Cursor<'_>| identifier_run(c, escape, first, tail, &excluded),
            ],
        )
    })?;
    Ok(collapse_strings(parts.into_iter().flatten()))
}
