//! Factories that build trees from semantic values.
//!
//! Each factory renders canonical text (values containing whitespace are
//! double-quoted) and runs it through the same grammar as `parse`, so a
//! created value is indistinguishable from a parsed one.

use crate::Error;
use crate::change_owner::ChangeOwner;
use crate::cursor::Cursor;
use crate::instruction::ArgInstruction;
use crate::key_value::{ASSIGNMENT, FLAG_PREFIX, KeyValueToken, StartPeriodFlag};
use crate::parser::PResult;
use crate::token::{LiteralToken, ValueToken};

fn require(field: &'static str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::InvalidArgument {
            field,
            reason: "value must not be empty".to_string(),
        });
    }
    Ok(())
}

fn canonical(value: &str) -> String {
    LiteralToken::from_value(value).render()
}

impl ArgInstruction {
    /// `ARG name` or `ARG name=value`.
    pub fn create(name: &str, value: Option<&str>) -> Result<Self, Error> {
        require("arg name", name)?;
        let mut text = format!("ARG {name}");
        if let Some(value) = value {
            text.push_str(ASSIGNMENT);
            text.push_str(&canonical(value));
        }
        Self::parse(&text)
    }
}

impl ChangeOwner {
    /// `user` or `user:group`. An empty group is the same as none.
    pub fn create(user: &str, group: Option<&str>) -> Result<Self, Error> {
        require("user", user)?;
        let mut text = canonical(user);
        if let Some(group) = group.filter(|g| !g.is_empty()) {
            text.push(':');
            text.push_str(&canonical(group));
        }
        Self::parse(&text)
    }
}

impl StartPeriodFlag {
    /// `--start-period=<value>`
    pub fn create(value: &str) -> Result<Self, Error> {
        require("start period", value)?;
        Self::parse(&format!(
            "{FLAG_PREFIX}{}{ASSIGNMENT}{}",
            Self::KEY,
            canonical(value)
        ))
    }
}

impl<K: ValueToken, V: ValueToken> KeyValueToken<K, V> {
    /// Build `key`, `key=value`, `--key` or `--key=value`, checked
    /// against the given key and value grammars.
    pub fn create(
        key: &str,
        value: Option<&str>,
        is_flag: bool,
        key_grammar: impl FnOnce(&mut Cursor<'_>) -> PResult<K>,
        value_grammar: impl FnOnce(&mut Cursor<'_>) -> PResult<V>,
    ) -> Result<Self, Error> {
        require("key", key)?;
        let mut text = String::new();
        if is_flag {
            text.push_str(FLAG_PREFIX);
        }
        text.push_str(&K::from_value(key).into_token().render());
        if let Some(value) = value {
            text.push_str(ASSIGNMENT);
            text.push_str(&V::from_value(value).into_token().render());
        }
        Self::parse_with(&text, is_flag, key_grammar, value_grammar)
    }
}
