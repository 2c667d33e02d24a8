//! Serializes tokens back to text.
//!
//! Two views exist for every token. The rendered text reproduces the
//! source exactly, including quotes, escape characters and line
//! continuations. The semantic value is what the token means: quotes and
//! line continuations are left out, everything else is kept verbatim.

use std::fmt;

use crate::Error;
use crate::parser::ParseOptions;
use crate::token::{
    IdentifierToken, KeywordToken, LineContinuationToken, LiteralToken, QuoteChar, Token,
    ValueToken, VariableRefToken,
};

/// Concatenate the rendered text of a token sequence.
#[must_use]
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        render_into(&mut out, token);
    }
    out
}

fn render_into(out: &mut String, token: &Token) {
    match token {
        Token::String(text)
        | Token::Whitespace(text)
        | Token::NewLine(text)
        | Token::Comment(text)
        | Token::Symbol(text)
        | Token::Punctuation(text) => out.push_str(text),
        Token::LineContinuation(t) => render_children(out, &t.children),
        Token::Keyword(t) => render_children(out, &t.children),
        Token::Identifier(t) => render_quoted(out, &t.children, t.quote),
        Token::Literal(t) => render_quoted(out, &t.children, t.quote),
        Token::VariableRef(t) => render_variable_ref(out, t),
    }
}

fn render_children(out: &mut String, children: &[Token]) {
    for child in children {
        render_into(out, child);
    }
}

fn render_quoted(out: &mut String, children: &[Token], quote: Option<QuoteChar>) {
    let quote = quote.map(QuoteChar::as_char);
    out.extend(quote);
    render_children(out, children);
    out.extend(quote);
}

fn render_variable_ref(out: &mut String, var: &VariableRefToken) {
    out.push('$');
    if var.braced {
        out.push('{');
        render_children(out, &var.children);
        out.push('}');
    } else {
        render_children(out, &var.children);
    }
}

fn value_into(out: &mut String, token: &Token) {
    match token {
        Token::LineContinuation(_) => {}
        Token::VariableRef(var) => value_variable_ref(out, var),
        Token::Keyword(_) | Token::Identifier(_) | Token::Literal(_) => {
            value_children(out, token.children().unwrap_or_default());
        }
        Token::String(_)
        | Token::Whitespace(_)
        | Token::NewLine(_)
        | Token::Comment(_)
        | Token::Symbol(_)
        | Token::Punctuation(_) => render_into(out, token),
    }
}

fn value_variable_ref(out: &mut String, var: &VariableRefToken) {
    out.push('$');
    if var.braced {
        out.push('{');
        value_children(out, &var.children);
        out.push('}');
    } else {
        value_children(out, &var.children);
    }
}

fn value_children(out: &mut String, children: &[Token]) {
    for child in children {
        value_into(out, child);
    }
}

fn value_of(children: &[Token]) -> String {
    let mut out = String::new();
    value_children(&mut out, children);
    out
}

impl Token {
    /// Exact source text of this token and its descendants.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_into(&mut out, self);
        out
    }

    /// Semantic value: rendered text minus quotes and line
    /// continuations.
    #[must_use]
    pub fn value(&self) -> String {
        let mut out = String::new();
        value_into(&mut out, self);
        out
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote required for `value` to parse back as a single literal.
pub(crate) fn quote_if_needed(value: &str) -> Option<QuoteChar> {
    value
        .chars()
        .any(char::is_whitespace)
        .then_some(QuoteChar::Double)
}

macro_rules! render_methods {
    ($ty:ident, |$out:ident, $this:ident| $body:expr) => {
        impl $ty {
            #[must_use]
            pub fn render(&self) -> String {
                let mut $out = String::new();
                let $this = self;
                $body;
                $out
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.render())
            }
        }
    };
}

render_methods!(LineContinuationToken, |out, t| render_children(
    &mut out,
    &t.children
));
render_methods!(KeywordToken, |out, t| render_children(&mut out, &t.children));
render_methods!(IdentifierToken, |out, t| render_quoted(
    &mut out,
    &t.children,
    t.quote
));
render_methods!(LiteralToken, |out, t| render_quoted(
    &mut out,
    &t.children,
    t.quote
));
render_methods!(VariableRefToken, |out, t| render_variable_ref(&mut out, t));

impl KeywordToken {
    #[must_use]
    pub fn value(&self) -> String {
        value_of(&self.children)
    }
}

impl IdentifierToken {
    #[must_use]
    pub fn value(&self) -> String {
        value_of(&self.children)
    }
}

impl LiteralToken {
    #[must_use]
    pub fn value(&self) -> String {
        value_of(&self.children)
    }
}

impl VariableRefToken {
    #[must_use]
    pub fn value(&self) -> String {
        let mut out = String::new();
        value_variable_ref(&mut out, self);
        out
    }
}

impl ValueToken for KeywordToken {
    fn token_value(&self) -> String {
        self.value()
    }

    fn set_token_value(&mut self, value: &str, _options: ParseOptions) -> Result<(), Error> {
        self.set_value(value)
    }

    fn from_value(value: &str) -> Self {
        Self::new(value)
    }
}

impl ValueToken for IdentifierToken {
    fn token_value(&self) -> String {
        self.value()
    }

    fn set_token_value(&mut self, value: &str, options: ParseOptions) -> Result<(), Error> {
        self.set_value_with(value, options)
    }

    fn from_value(value: &str) -> Self {
        Self::from_children(
            vec![Token::String(value.to_string())],
            quote_if_needed(value),
        )
    }
}

impl ValueToken for LiteralToken {
    fn token_value(&self) -> String {
        self.value()
    }

    /// An empty value is rejected unless the literal is quoted.
    fn set_token_value(&mut self, value: &str, options: ParseOptions) -> Result<(), Error> {
        self.replace_content("value", value, options.escape_char, &[], false)
    }

    /// Unquoted unless the value contains whitespace, in which case it
    /// is double-quoted.
    fn from_value(value: &str) -> Self {
        let mut literal = Self::new(value);
        literal.quote = quote_if_needed(value);
        literal
    }
}
