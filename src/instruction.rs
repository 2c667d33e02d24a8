//! Instructions: an instruction keyword followed by instruction-specific
//! arguments, with every byte of the source kept in the token list.

use std::fmt;

use crate::Error;
use crate::cursor::Cursor;
use crate::parser::{
    PResult, ParseOptions, WhitespaceMode, argument_tokens, identifier, instruction, literal,
    optional, parse_complete, punctuation,
};
use crate::render::render_tokens;
use crate::token::{IdentifierToken, KeywordToken, LiteralToken, Token, tokens_of};
use crate::visitor::{self, Variables};

/// Token list of one instruction.
#[derive(Debug, Clone)]
pub struct Instruction {
    tokens: Vec<Token>,
}

impl Instruction {
    pub(crate) const fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) const fn tokens_mut(&mut self) -> &mut Vec<Token> {
        &mut self.tokens
    }

    /// The instruction name.
    #[must_use]
    pub fn keyword(&self) -> Option<&KeywordToken> {
        tokens_of::<KeywordToken>(&self.tokens).next()
    }

    #[must_use]
    pub fn render(&self) -> String {
        render_tokens(&self.tokens)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Behavior shared by every instruction type.
pub trait InstructionBase {
    fn instruction(&self) -> &Instruction;

    fn instruction_mut(&mut self) -> &mut Instruction;

    /// Instruction name as written, without line continuations.
    fn instruction_name(&self) -> String {
        self.instruction()
            .keyword()
            .map(KeywordToken::value)
            .unwrap_or_default()
    }

    /// Rename the instruction. The new name is upper-cased and must be a
    /// single word.
    fn set_instruction_name(&mut self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidArgument {
                field: "instruction name",
                reason: "value must not be empty".to_string(),
            });
        }
        let keyword = self
            .instruction_mut()
            .tokens_mut()
            .iter_mut()
            .find_map(|t| t.as_typed_mut::<KeywordToken>())
            .ok_or_else(|| Error::StructuralInconsistency("instruction has no keyword".into()))?;
        keyword.set_value(&name.to_uppercase())
    }

    /// Text of the comments attached to the instruction, `#` included.
    fn comments(&self) -> Vec<&str> {
        self.instruction()
            .tokens()
            .iter()
            .filter_map(|t| match t {
                Token::Comment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace variable references with their values.
    ///
    /// On error the instruction is left unchanged.
    fn resolve_variables(&mut self, variables: &Variables) -> Result<(), Error> {
        let mut tokens = self.instruction().tokens().to_vec();
        visitor::resolve_variables(&mut tokens, variables)?;
        *self.instruction_mut().tokens_mut() = tokens;
        Ok(())
    }

    /// Rendered text with variable references resolved; the instruction
    /// itself is not modified.
    fn resolved_text(&self, variables: &Variables) -> Result<String, Error> {
        visitor::resolved_text(self.instruction().tokens(), variables)
    }

    fn render(&self) -> String {
        self.instruction().render()
    }
}

impl InstructionBase for Instruction {
    fn instruction(&self) -> &Instruction {
        self
    }

    fn instruction_mut(&mut self) -> &mut Instruction {
        self
    }
}

// -----------------------------------------------------------
// ARG
// -----------------------------------------------------------

fn is_arg_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn arg_name(cursor: &mut Cursor<'_>, escape: char) -> PResult<IdentifierToken> {
    identifier(cursor, escape, &char::is_alphabetic, &is_arg_name_char)
}

fn arg_body(cursor: &mut Cursor<'_>, escape: char) -> PResult<Vec<Token>> {
    let mut tokens = vec![Token::Identifier(arg_name(cursor, escape)?)];
    if let Some(assignment) = optional(cursor, |c| punctuation(c, "=")) {
        tokens.push(assignment);
        let value = optional(cursor, |c| {
            literal(c, escape, WhitespaceMode::Disallowed, &[])
        })
        .unwrap_or_default();
        tokens.push(Token::Literal(value));
    }
    Ok(tokens)
}

/// `ARG name[=value]`
#[derive(Debug, Clone)]
pub struct ArgInstruction {
    inner: Instruction,
    options: ParseOptions,
}

impl ArgInstruction {
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_with(text, ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self, Error> {
        let escape = options.escape_char;
        tracing::debug!(instruction = "ARG", escape = %escape, "parsing instruction");
        let tokens = parse_complete(text, |c| {
            instruction(c, "ARG", escape, |c| {
                argument_tokens(c, escape, |c| arg_body(c, escape))
            })
        })?;
        Ok(Self {
            inner: Instruction::from_tokens(tokens),
            options,
        })
    }

    fn name_token(&self) -> Option<&IdentifierToken> {
        tokens_of::<IdentifierToken>(self.inner.tokens()).next()
    }

    fn value_index(&self) -> Option<usize> {
        self.inner
            .tokens()
            .iter()
            .position(|t| matches!(t, Token::Literal(_)))
    }

    #[must_use]
    pub fn arg_name(&self) -> String {
        self.name_token()
            .map(IdentifierToken::value)
            .unwrap_or_default()
    }

    /// Rename the argument, keeping its quoting and surroundings.
    pub fn set_arg_name(&mut self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidArgument {
                field: "arg name",
                reason: "value must not be empty".to_string(),
            });
        }
        let escape = self.options.escape_char;
        let parsed = parse_complete(name, |c| arg_name(c, escape)).map_err(|err| {
            Error::InvalidArgument {
                field: "arg name",
                reason: err.to_string(),
            }
        })?;
        if parsed.quote_char().is_some() {
            return Err(Error::InvalidArgument {
                field: "arg name",
                reason: format!("'{name}' must not include quotes"),
            });
        }

        let token = self
            .inner
            .tokens_mut()
            .iter_mut()
            .find_map(|t| t.as_typed_mut::<IdentifierToken>())
            .ok_or_else(|| Error::StructuralInconsistency("ARG without a name".into()))?;
        token.children = parsed.children;
        Ok(())
    }

    /// `None` when there is no `=`; `Some("")` for `ARG name=`.
    #[must_use]
    pub fn arg_value(&self) -> Option<String> {
        tokens_of::<LiteralToken>(self.inner.tokens())
            .next()
            .map(LiteralToken::value)
    }

    /// Set, replace or remove (`None`) the default value.
    ///
    /// Removing drops both the `=` and the value. Adding inserts them
    /// directly after the name; a value containing whitespace is
    /// double-quoted. The value is parsed as ARG value text, so `$NAME`
    /// becomes a variable reference and a value that would not re-parse
    /// is rejected.
    pub fn set_arg_value(&mut self, value: Option<&str>) -> Result<(), Error> {
        let escape = self.options.escape_char;
        let tokens = self.inner.tokens_mut();
        let literal_index = tokens.iter().position(|t| matches!(t, Token::Literal(_)));

        match (literal_index, value) {
            (Some(index), None) => {
                let start = index
                    .checked_sub(1)
                    .filter(|&i| matches!(&tokens[i], Token::Punctuation(p) if p == "="))
                    .ok_or_else(|| {
                        Error::StructuralInconsistency("ARG value without '='".into())
                    })?;
                tracing::debug!("removing ARG value");
                tokens.drain(start..=index);
            }
            (Some(index), Some(value)) => {
                if let Token::Literal(literal) = &mut tokens[index] {
                    literal.replace_content("arg value", value, escape, &[], true)?;
                }
            }
            (None, Some(value)) => {
                let name_index = tokens
                    .iter()
                    .position(|t| matches!(t, Token::Identifier(_)))
                    .ok_or_else(|| Error::StructuralInconsistency("ARG without a name".into()))?;
                let mut literal = LiteralToken::default();
                literal.replace_content("arg value", value, escape, &[], true)?;
                tracing::debug!("adding ARG value");
                tokens.splice(
                    name_index + 1..name_index + 1,
                    [Token::Punctuation("=".to_string()), Token::Literal(literal)],
                );
            }
            (None, None) => {}
        }
        debug_assert_eq!(self.value_index().is_some(), value.is_some());
        Ok(())
    }

    /// The value token, if any.
    #[must_use]
    pub fn arg_value_token(&self) -> Option<&LiteralToken> {
        self.value_index()
            .and_then(|i| self.inner.tokens()[i].as_typed::<LiteralToken>())
    }
}

impl InstructionBase for ArgInstruction {
    fn instruction(&self) -> &Instruction {
        &self.inner
    }

    fn instruction_mut(&mut self) -> &mut Instruction {
        &mut self.inner
    }
}

impl fmt::Display for ArgInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn kinds(arg: &ArgInstruction) -> Vec<TokenKind> {
        arg.instruction().tokens().iter().map(Token::kind).collect()
    }

    #[test]
    fn parses_name_and_value() {
        let arg = ArgInstruction::parse("ARG version=1.0").expect("parse");
        assert_eq!(arg.arg_name(), "version");
        assert_eq!(arg.arg_value().as_deref(), Some("1.0"));
        assert_eq!(
            kinds(&arg),
            [
                TokenKind::Keyword,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Punctuation,
                TokenKind::Literal
            ]
        );
    }

    #[test]
    fn empty_assignment_is_empty_value() {
        let arg = ArgInstruction::parse("ARG x=").expect("parse");
        assert_eq!(arg.arg_value().as_deref(), Some(""));
        assert_eq!(arg.to_string(), "ARG x=");
    }

    #[test]
    fn name_must_start_with_letter() {
        assert!(ArgInstruction::parse("ARG 1x").is_err());
        assert!(ArgInstruction::parse("ARGx").is_err());
    }

    #[test]
    fn remove_and_readd_value() {
        let mut arg = ArgInstruction::parse("ARG x=1 # note").expect("parse");
        arg.set_arg_value(None).expect("remove");
        assert_eq!(arg.to_string(), "ARG x # note");
        assert_eq!(arg.arg_value(), None);

        arg.set_arg_value(Some("two words")).expect("add");
        assert_eq!(arg.to_string(), "ARG x=\"two words\" # note");
        assert_eq!(arg.arg_value().as_deref(), Some("two words"));
    }

    #[test]
    fn rename_keeps_quotes() {
        let mut arg = ArgInstruction::parse("ARG \"x\"=1").expect("parse");
        arg.set_arg_name("y").expect("rename");
        assert_eq!(arg.to_string(), "ARG \"y\"=1");
        assert!(arg.set_arg_name("").is_err());
        assert!(arg.set_arg_name("1y").is_err());
        assert_eq!(arg.arg_name(), "y");
    }

    #[test]
    fn instruction_name_is_case_preserved_until_set() {
        let mut arg = ArgInstruction::parse("arg x").expect("parse");
        assert_eq!(arg.instruction_name(), "arg");
        arg.set_instruction_name("arg").expect("rename");
        assert_eq!(arg.to_string(), "ARG x");
    }
}
