//! `user[:group]` ownership values, as used by `--chown` flags.

use std::fmt;

use crate::Error;
use crate::cursor::Cursor;
use crate::parser::{
    PResult, ParseOptions, WhitespaceMode, line_continuation, literal, many, optional,
    parse_complete, symbol,
};
use crate::render::render_tokens;
use crate::token::{LiteralToken, Token, invalid_value};

const SEPARATOR: &str = ":";
const EXCLUDED: [char; 1] = [':'];

fn owner_part(cursor: &mut Cursor<'_>, escape: char) -> PResult<LiteralToken> {
    literal(cursor, escape, WhitespaceMode::Disallowed, &EXCLUDED)
}

/// User, then optionally the separator and group. Line continuations
/// may surround the separator.
pub(crate) fn change_owner_tokens(cursor: &mut Cursor<'_>, escape: char) -> PResult<Vec<Token>> {
    let mut tokens = vec![Token::Literal(owner_part(cursor, escape)?)];
    let group = optional(cursor, |c| {
        let mut group = many(c, |c| line_continuation(c, escape));
        group.push(symbol(c, SEPARATOR)?);
        group.extend(many(c, |c| line_continuation(c, escape)));
        group.push(Token::Literal(owner_part(c, escape)?));
        Ok(group)
    });
    tokens.extend(group.into_iter().flatten());
    Ok(tokens)
}

/// Owner of a file: a user and an optional group.
#[derive(Debug, Clone)]
pub struct ChangeOwner {
    tokens: Vec<Token>,
    options: ParseOptions,
}

impl ChangeOwner {
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_with(text, ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self, Error> {
        let escape = options.escape_char;
        tracing::debug!(escape = %escape, "parsing change owner");
        let tokens = parse_complete(text, |c| change_owner_tokens(c, escape))?;
        Ok(Self { tokens, options })
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn separator_index(&self) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| matches!(t, Token::Symbol(s) if s == SEPARATOR))
    }

    fn literal_at(&self, nth: usize) -> Option<&LiteralToken> {
        self.tokens
            .iter()
            .filter_map(|t| t.as_typed::<LiteralToken>())
            .nth(nth)
    }

    fn literal_at_mut(&mut self, nth: usize) -> Option<&mut LiteralToken> {
        self.tokens
            .iter_mut()
            .filter_map(|t| t.as_typed_mut::<LiteralToken>())
            .nth(nth)
    }

    #[must_use]
    pub fn user_token(&self) -> &LiteralToken {
        self.literal_at(0)
            .unwrap_or_else(|| unreachable!("change owner always has a user"))
    }

    pub fn user_token_mut(&mut self) -> &mut LiteralToken {
        self.literal_at_mut(0)
            .unwrap_or_else(|| unreachable!("change owner always has a user"))
    }

    /// A user or group token must be non-empty and re-parse as one part.
    fn check_part(&self, field: &'static str, token: &LiteralToken) -> Result<(), Error> {
        if token.children().is_empty() {
            return Err(Error::InvalidArgument {
                field,
                reason: "value must not be empty".to_string(),
            });
        }
        let escape = self.options.escape_char;
        let text = token.render();
        parse_complete(&text, |c| owner_part(c, escape))
            .map(drop)
            .map_err(|err| invalid_value(field, &text, &err))
    }

    /// Replace the user token.
    pub fn set_user_token(&mut self, token: LiteralToken) -> Result<(), Error> {
        self.check_part("user", &token)?;
        *self.user_token_mut() = token;
        Ok(())
    }

    #[must_use]
    pub fn user(&self) -> String {
        self.user_token().value()
    }

    /// Set the user. The value is parsed as an ownership part, so it may
    /// not contain `:` unless quoted.
    pub fn set_user(&mut self, user: &str) -> Result<(), Error> {
        let escape = self.options.escape_char;
        self.user_token_mut()
            .replace_content("user", user, escape, &EXCLUDED, false)
    }

    #[must_use]
    pub fn group_token(&self) -> Option<&LiteralToken> {
        self.literal_at(1)
    }

    pub fn group_token_mut(&mut self) -> Option<&mut LiteralToken> {
        self.literal_at_mut(1)
    }

    /// Replace, add or remove (`None`) the group token.
    pub fn set_group_token(&mut self, token: Option<LiteralToken>) -> Result<(), Error> {
        let Some(token) = token else {
            self.remove_group();
            return Ok(());
        };
        self.check_part("group", &token)?;
        if let Some(slot) = self.group_token_mut() {
            *slot = token;
            return Ok(());
        }
        tracing::debug!("adding group");
        self.tokens.push(Token::Symbol(SEPARATOR.to_string()));
        self.tokens.push(Token::Literal(token));
        Ok(())
    }

    #[must_use]
    pub fn group(&self) -> Option<String> {
        self.group_token().map(LiteralToken::value)
    }

    /// Set the group. `None` or an empty group removes everything from
    /// the separator on.
    pub fn set_group(&mut self, group: Option<&str>) -> Result<(), Error> {
        let Some(group) = group.filter(|g| !g.is_empty()) else {
            self.remove_group();
            return Ok(());
        };
        let escape = self.options.escape_char;
        match self.group_token_mut() {
            Some(token) => token.replace_content("group", group, escape, &EXCLUDED, false),
            None => {
                let mut token = LiteralToken::default();
                token.replace_content("group", group, escape, &EXCLUDED, false)?;
                self.set_group_token(Some(token))
            }
        }
    }

    fn remove_group(&mut self) {
        if let Some(separator) = self.separator_index() {
            tracing::debug!(removed = self.tokens.len() - separator, "removing group");
            self.tokens.truncate(separator);
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        render_tokens(&self.tokens)
    }
}

impl fmt::Display for ChangeOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn user_only() {
        let owner = ChangeOwner::parse("app").expect("parse");
        assert_eq!(owner.user(), "app");
        assert_eq!(owner.group(), None);
    }

    #[test]
    fn continuations_around_separator() {
        let options = ParseOptions::with_escape_char('`');
        let mut owner = ChangeOwner::parse_with("us`\ner`\n:`\ngr`\noup", options).expect("parse");
        let kinds: Vec<_> = owner.tokens().iter().map(Token::kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Literal,
                TokenKind::LineContinuation,
                TokenKind::Symbol,
                TokenKind::LineContinuation,
                TokenKind::Literal
            ]
        );
        assert_eq!(owner.user(), "user");
        assert_eq!(owner.group().as_deref(), Some("group"));

        owner.set_group(None).expect("remove");
        assert_eq!(owner.to_string(), "us`\ner`\n");
    }

    #[test]
    fn add_group_to_user_only() {
        let mut owner = ChangeOwner::parse("app").expect("parse");
        owner.set_group(Some("staff")).expect("add");
        assert_eq!(owner.to_string(), "app:staff");
        owner.set_group(Some("")).expect("remove");
        assert_eq!(owner.to_string(), "app");
    }

    #[test]
    fn empty_user_is_rejected() {
        let mut owner = ChangeOwner::parse("app:staff").expect("parse");
        assert!(matches!(
            owner.set_user(""),
            Err(Error::InvalidArgument { field: "user", .. })
        ));
        assert_eq!(owner.to_string(), "app:staff");
    }

    #[test]
    fn user_edit_uses_the_parse_escape_char() {
        let options = ParseOptions::with_escape_char('`');
        let mut owner = ChangeOwner::parse_with("app", options).expect("parse");
        owner.set_user("a`:b").expect("escaped separator");
        assert_eq!(owner.user(), "a`:b");
        assert_eq!(owner.group(), None);
        assert!(owner.set_user("a\\:b").is_err());
    }
}
