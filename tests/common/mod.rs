#![allow(dead_code)]

use std::collections::HashMap;

use dockerfile_cst::{
    ArgInstruction, ChangeOwner, InstructionBase, ParseOptions, Token, TokenKind, Variables,
};

pub fn roundtrip_arg(input: &str) {
    roundtrip_arg_with(input, ParseOptions::DEFAULT_ESCAPE_CHAR);
}

pub fn roundtrip_arg_with(input: &str, escape: char) {
    let arg = ArgInstruction::parse_with(input, ParseOptions::with_escape_char(escape))
        .unwrap_or_else(|e| panic!("parse failed: {e}\n--- input ---\n{input}"));
    let output = arg.render();
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

pub fn roundtrip_owner(input: &str, escape: char) {
    let owner = ChangeOwner::parse_with(input, ParseOptions::with_escape_char(escape))
        .unwrap_or_else(|e| panic!("parse failed: {e}\n--- input ---\n{input}"));
    let output = owner.render();
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Kinds of a token sequence, for shape assertions.
pub fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(Token::kind).collect()
}

pub fn vars(pairs: &[(&str, Option<&str>)]) -> Variables {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.map(str::to_string)))
        .collect::<HashMap<_, _>>()
}
