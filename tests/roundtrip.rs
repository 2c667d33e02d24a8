//! Round-trip tests: parse then render should reproduce the input exactly.

mod common;

use common::{roundtrip_arg, roundtrip_arg_with, roundtrip_owner};

// -----------------------------------------------------------
// ARG instructions.
// -----------------------------------------------------------

#[test]
fn roundtrip_bare_name() {
    roundtrip_arg("ARG x");
}

#[test]
fn roundtrip_name_and_value() {
    roundtrip_arg("ARG version=1.0\n");
}

#[test]
fn roundtrip_empty_value() {
    roundtrip_arg("ARG x=");
}

#[test]
fn roundtrip_surrounding_whitespace() {
    roundtrip_arg("  arg \t x=1   \n");
}

#[test]
fn roundtrip_crlf() {
    roundtrip_arg("ARG x=1\r\n");
}

#[test]
fn roundtrip_trailing_comments() {
    roundtrip_arg("ARG x=1 # first\n  # second\n# third");
}

#[test]
fn roundtrip_continuation_after_keyword() {
    roundtrip_arg("ARG \\\n  x=1");
}

#[test]
fn roundtrip_blank_lines_after_keyword_continuation() {
    roundtrip_arg("ARG \\\n\nx=1");
    roundtrip_arg("ARG \\\n  \n x");
    roundtrip_arg("ARG \\\r\n\r\n\t\r\nx=1\r\n");
}

#[test]
fn roundtrip_comment_after_keyword_continuation() {
    roundtrip_arg("ARG \\\n# explains x\n x=1\n");
}

#[test]
fn roundtrip_continuation_inside_keyword() {
    roundtrip_arg("A\\\nR\\  \nG x");
}

#[test]
fn roundtrip_continuation_inside_value() {
    roundtrip_arg("ARG x=a\\\nb");
}

#[test]
fn roundtrip_trailing_continuation() {
    roundtrip_arg("ARG x=1 \\\n");
}

#[test]
fn roundtrip_quoted_values() {
    roundtrip_arg("ARG x=\"a b\"");
    roundtrip_arg("ARG x='$HOME'");
    roundtrip_arg("ARG x=\"\"");
    roundtrip_arg("ARG 'x'=\"it's\"");
}

#[test]
fn roundtrip_variable_refs() {
    roundtrip_arg("ARG x=${Y:-def}/$Z");
    roundtrip_arg("ARG x=${Y:+${Z?missing z}}");
    roundtrip_arg("ARG x=$1$");
}

#[test]
fn roundtrip_escaped_characters() {
    roundtrip_arg("ARG x=a\\ b");
    roundtrip_arg("ARG x=\\$NOT_A_REF");
}

#[test]
fn roundtrip_backtick_escape() {
    roundtrip_arg_with("ARG x=a`\nb", '`');
    roundtrip_arg_with("ARG x=C:\\path", '`');
}

// -----------------------------------------------------------
// Ownership values.
// -----------------------------------------------------------

#[test]
fn roundtrip_owner_forms() {
    roundtrip_owner("user", '\\');
    roundtrip_owner("user:group", '\\');
    roundtrip_owner("1000:1000", '\\');
    roundtrip_owner("$UID:${GID:-0}", '\\');
    roundtrip_owner("'us er':\"gr oup\"", '\\');
}

#[test]
fn roundtrip_owner_continuations() {
    roundtrip_owner("us`\ner`\n:`\ngr`\noup", '`');
}
