//! Tree traversal and variable resolution.

use std::collections::HashMap;

use crate::Error;
use crate::render::render_tokens;
use crate::token::{LiteralToken, Modifier, QuoteChar, Token, VariableRefToken, collapse_strings};

/// What a mutable visit does after handling a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Descend into the token's children.
    Continue,
    /// Leave the token's children alone.
    SkipChildren,
}

/// Visit every token in pre-order.
pub fn walk<'t>(tokens: &'t [Token], visit: &mut impl FnMut(&'t Token)) {
    for token in tokens {
        visit(token);
        if let Some(children) = token.children() {
            walk(children, visit);
        }
    }
}

/// Visit every token in pre-order, allowing edits.
///
/// The visitor runs before a token's children are visited, so it may
/// replace them; returning [`Flow::SkipChildren`] stops the descent into
/// the (possibly new) children. The first error aborts the walk.
pub fn try_walk_mut<E>(
    tokens: &mut [Token],
    visit: &mut impl FnMut(&mut Token) -> Result<Flow, E>,
) -> Result<(), E> {
    for token in tokens {
        if visit(token)? == Flow::Continue {
            if let Some(children) = token.children_mut() {
                try_walk_mut(children, visit)?;
            }
        }
    }
    Ok(())
}

/// Variable values used for resolution. A name mapped to `None` is
/// treated the same as a missing name: unset.
pub type Variables = HashMap<String, Option<String>>;

/// Replace variable references inside literals and identifiers with
/// their values.
///
/// Single-quoted tokens are left untouched. Each reference is replaced
/// by plain text following shell parameter expansion rules, including
/// the `-`, `+` and `?` modifiers and their `:` forms, which also treat
/// an empty value as unset.
pub fn resolve_variables(tokens: &mut [Token], variables: &Variables) -> Result<(), Error> {
    try_walk_mut::<Error>(tokens, &mut |token| {
        let (children, quote) = match token {
            Token::Literal(t) => (&mut t.children, t.quote),
            Token::Identifier(t) => (&mut t.children, t.quote),
            _ => return Ok(Flow::Continue),
        };
        if quote == Some(QuoteChar::Single) {
            return Ok(Flow::SkipChildren);
        }
        let resolved = resolve_children(children, variables)?;
        *children = resolved;
        Ok(Flow::SkipChildren)
    })
}

fn resolve_children(children: &[Token], variables: &Variables) -> Result<Vec<Token>, Error> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Token::VariableRef(var) => out.push(Token::String(resolve_reference(var, variables)?)),
            other => out.push(other.clone()),
        }
    }
    Ok(collapse_strings(out))
}

fn resolve_word(word: Option<&LiteralToken>, variables: &Variables) -> Result<String, Error> {
    let Some(word) = word else {
        return Ok(String::new());
    };
    let resolved = resolve_children(&word.children, variables)?;
    Ok(resolved
        .iter()
        .filter(|t| !matches!(t, Token::LineContinuation(_)))
        .map(Token::render)
        .collect())
}

fn resolve_reference(var: &VariableRefToken, variables: &Variables) -> Result<String, Error> {
    let name = var.name();
    let value = variables.get(name).and_then(Option::as_deref);
    let Some(modifier) = var.modifier() else {
        tracing::trace!(name, set = value.is_some(), "resolving variable");
        return Ok(value.unwrap_or_default().to_string());
    };

    let is_unset = match modifier {
        Modifier::DefaultIfUnsetOrEmpty
        | Modifier::AlternateIfSetAndNonEmpty
        | Modifier::RequiredNonEmpty => value.is_none_or(str::is_empty),
        Modifier::DefaultIfUnset | Modifier::AlternateIfSet | Modifier::Required => {
            value.is_none()
        }
    };
    tracing::trace!(name, modifier = modifier.as_str(), is_unset, "resolving variable");

    match modifier {
        Modifier::DefaultIfUnsetOrEmpty | Modifier::DefaultIfUnset => {
            if is_unset {
                resolve_word(var.modifier_value(), variables)
            } else {
                Ok(value.unwrap_or_default().to_string())
            }
        }
        Modifier::AlternateIfSetAndNonEmpty | Modifier::AlternateIfSet => {
            if is_unset {
                Ok(String::new())
            } else {
                resolve_word(var.modifier_value(), variables)
            }
        }
        Modifier::RequiredNonEmpty | Modifier::Required => {
            if is_unset {
                let message = resolve_word(var.modifier_value(), variables)?;
                Err(Error::UnsetVariable {
                    name: name.to_string(),
                    message,
                })
            } else {
                Ok(value.unwrap_or_default().to_string())
            }
        }
    }
}

/// Render a token sequence with all references resolved, leaving the
/// input unchanged.
pub fn resolved_text(tokens: &[Token], variables: &Variables) -> Result<String, Error> {
    let mut tokens = tokens.to_vec();
    resolve_variables(&mut tokens, variables)?;
    Ok(render_tokens(&tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{IdentifierToken, KeywordToken, TokenKind};

    fn vars(pairs: &[(&str, Option<&str>)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.map(str::to_string)))
            .collect()
    }

    fn literal(children: Vec<Token>) -> Token {
        Token::Literal(LiteralToken::from_children(children, None))
    }

    #[test]
    fn walk_is_pre_order() {
        let tokens = [
            Token::Keyword(KeywordToken::new("ARG")),
            literal(vec![
                Token::String("a".to_string()),
                Token::VariableRef(VariableRefToken::new("B")),
            ]),
        ];
        let mut seen = Vec::new();
        walk(&tokens, &mut |t: &Token| seen.push(t.kind()));
        assert_eq!(
            seen,
            [
                TokenKind::Keyword,
                TokenKind::String,
                TokenKind::Literal,
                TokenKind::String,
                TokenKind::VariableRef,
                TokenKind::String,
            ]
        );
    }

    #[test]
    fn skip_children_stops_descent() {
        let mut tokens = [literal(vec![Token::String("x".to_string())])];
        let mut visited = 0;
        try_walk_mut::<()>(&mut tokens, &mut |_| {
            visited += 1;
            Ok(Flow::SkipChildren)
        })
        .expect("walk");
        assert_eq!(visited, 1);
    }

    #[test]
    fn resolves_plain_and_modified_refs() {
        let mut tokens = [literal(vec![
            Token::VariableRef(VariableRefToken::new("A")),
            Token::String("/".to_string()),
            Token::VariableRef(VariableRefToken::braced(
                "B",
                Some((Modifier::DefaultIfUnsetOrEmpty, LiteralToken::new("dflt"))),
            )),
        ])];
        resolve_variables(&mut tokens, &vars(&[("A", Some("one")), ("B", Some(""))]))
            .expect("resolve");
        assert_eq!(tokens[0].render(), "one/dflt");
        assert_eq!(tokens[0].children().map(<[Token]>::len), Some(1));
    }

    #[test]
    fn unset_without_modifier_is_empty() {
        let mut tokens = [literal(vec![
            Token::String("x".to_string()),
            Token::VariableRef(VariableRefToken::new("MISSING")),
        ])];
        resolve_variables(&mut tokens, &Variables::new()).expect("resolve");
        assert_eq!(tokens[0].render(), "x");
    }

    #[test]
    fn single_quoted_is_not_resolved() {
        let mut tokens = [Token::Identifier(IdentifierToken::from_children(
            vec![Token::VariableRef(VariableRefToken::new("A"))],
            Some(QuoteChar::Single),
        ))];
        resolve_variables(&mut tokens, &vars(&[("A", Some("one"))])).expect("resolve");
        assert_eq!(tokens[0].render(), "'$A'");
    }

    #[test]
    fn required_reports_message() {
        let mut tokens = [literal(vec![Token::VariableRef(VariableRefToken::braced(
            "TAG",
            Some((Modifier::Required, LiteralToken::new("tag required"))),
        ))])];
        let err = resolve_variables(&mut tokens, &vars(&[("TAG", None)])).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsetVariable { ref name, ref message } if name == "TAG" && message == "tag required"
        ));
    }
}
