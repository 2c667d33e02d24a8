//! `ARG` parsing, editing and factories.

mod common;

use common::{kinds, vars};
use dockerfile_cst::{
    ArgInstruction, Error, InstructionBase, ParseOptions, QuoteChar, Span, TokenKind,
};
use rstest::rstest;

// -----------------------------------------------------------
// Parsing.
// -----------------------------------------------------------

#[rstest]
#[case("ARG x", "x", None)]
#[case("ARG x=", "x", Some(""))]
#[case("ARG my_arg1=value", "my_arg1", Some("value"))]
#[case("arg x=1", "x", Some("1"))]
#[case("ARG 'x'='a b'", "x", Some("a b"))]
#[case("ARG x=\"$HOME/bin\"", "x", Some("$HOME/bin"))]
#[case("ARG x=a\\\nb", "x", Some("ab"))]
#[case("ARG x=a\\ b", "x", Some("a\\ b"))]
#[case("ARG x=1 # why\n", "x", Some("1"))]
fn parse_name_and_value(#[case] input: &str, #[case] name: &str, #[case] value: Option<&str>) {
    let arg = ArgInstruction::parse(input).expect("parse");
    assert_eq!(arg.arg_name(), name);
    assert_eq!(arg.arg_value().as_deref(), value);
}

#[rstest]
#[case("ARG", 1, 4)]
#[case("ARG 1x", 1, 5)]
#[case("ARG x y", 1, 7)]
#[case("ARG x=\"abc", 1, 11)]
#[case("ARG \\\n1", 2, 1)]
#[case("ARG \\\n\n", 3, 1)]
#[case("ARGS x", 1, 4)]
#[case("RUN x", 1, 1)]
fn parse_error_position(#[case] input: &str, #[case] line: usize, #[case] column: usize) {
    let Err(Error::Parse(err)) = ArgInstruction::parse(input) else {
        panic!("expected a parse error for {input:?}");
    };
    assert_eq!(err.span, Span { line, column }, "{err}");
}

#[test]
fn token_layout() {
    let arg = ArgInstruction::parse("  ARG x=1 # c\n").expect("parse");
    assert_eq!(
        kinds(arg.instruction().tokens()),
        [
            TokenKind::Whitespace,
            TokenKind::Keyword,
            TokenKind::Whitespace,
            TokenKind::Identifier,
            TokenKind::Punctuation,
            TokenKind::Literal,
            TokenKind::Whitespace,
            TokenKind::Comment,
            TokenKind::NewLine,
        ]
    );
}

#[rstest]
#[case("ARG \\\n\nx=1")]
#[case("ARG \\\n  \n x")]
#[case("ARG \\\n\n# why\n\nx=1\n")]
fn blank_lines_after_keyword_continuation(#[case] input: &str) {
    let arg = ArgInstruction::parse(input).expect("parse");
    assert_eq!(arg.arg_name(), "x");
    assert_eq!(arg.render(), input);
}

#[test]
fn comments_are_attached() {
    let arg = ArgInstruction::parse("ARG \\\n# one\nx=1 # two\n# three").expect("parse");
    assert_eq!(arg.comments(), ["# one", "# two", "# three"]);
}

#[test]
fn custom_escape_char() {
    let options = ParseOptions::with_escape_char('`');
    let arg = ArgInstruction::parse_with("ARG x=C:\\dir`\n\\sub", options).expect("parse");
    assert_eq!(arg.arg_value().as_deref(), Some("C:\\dir\\sub"));
}

// -----------------------------------------------------------
// Editing.
// -----------------------------------------------------------

#[test]
fn set_value_replaces_only_the_value() {
    let mut arg = ArgInstruction::parse("ARG  x=1  # keep\n").expect("parse");
    arg.set_arg_value(Some("2")).expect("set");
    assert_eq!(arg.render(), "ARG  x=2  # keep\n");
}

#[test]
fn set_value_keeps_quotes() {
    let mut arg = ArgInstruction::parse("ARG x='1'").expect("parse");
    arg.set_arg_value(Some("2")).expect("set");
    assert_eq!(arg.render(), "ARG x='2'");
    assert_eq!(
        arg.arg_value_token().and_then(|t| t.quote_char()),
        Some(QuoteChar::Single)
    );
}

#[test]
fn remove_value_removes_separator() {
    let mut arg = ArgInstruction::parse("ARG x=1\n").expect("parse");
    arg.set_arg_value(None).expect("remove");
    assert_eq!(arg.render(), "ARG x\n");
    assert_eq!(arg.arg_value(), None);

    arg.set_arg_value(None).expect("remove again");
    assert_eq!(arg.render(), "ARG x\n");
}

#[test]
fn add_value_after_name() {
    let mut arg = ArgInstruction::parse("ARG x # c").expect("parse");
    arg.set_arg_value(Some("")).expect("add");
    assert_eq!(arg.render(), "ARG x= # c");
    assert_eq!(arg.arg_value().as_deref(), Some(""));
}

#[rstest]
#[case("ARG x=1", "2", "ARG x=2")]
#[case("ARG x=1", "a b", "ARG x=\"a b\"")]
#[case("ARG x='1'", "a b", "ARG x='a b'")]
#[case("ARG x", "$HOME/bin", "ARG x=$HOME/bin")]
#[case("ARG x=1", "\\$HOME", "ARG x=\\$HOME")]
#[case("ARG x=\"1\"", "it's", "ARG x=\"it's\"")]
fn set_value_output_reparses(#[case] input: &str, #[case] value: &str, #[case] rendered: &str) {
    let mut arg = ArgInstruction::parse(input).expect("parse");
    arg.set_arg_value(Some(value)).expect("set");
    assert_eq!(arg.render(), rendered);

    let reparsed = ArgInstruction::parse(&arg.render()).expect("reparse");
    assert_eq!(reparsed.arg_value(), arg.arg_value());
    let refs = |a: &ArgInstruction| a.arg_value_token().map(|t| t.variable_refs().count());
    assert_eq!(refs(&reparsed), refs(&arg));
}

#[rstest]
#[case("ARG x=1", "a\"b")]
#[case("ARG x=1", "it's")]
#[case("ARG x=1", "end\\")]
#[case("ARG x=1", "a\nb")]
#[case("ARG x='1'", "it's")]
#[case("ARG x", "a\"b")]
#[case("ARG x", "end\\")]
fn set_value_rejects_unparsable_text(#[case] input: &str, #[case] value: &str) {
    let mut arg = ArgInstruction::parse(input).expect("parse");
    assert!(matches!(
        arg.set_arg_value(Some(value)),
        Err(Error::InvalidArgument { .. })
    ));
    assert_eq!(arg.render(), input);
}

#[test]
fn edited_value_resolves_like_parsed_text() {
    let mut arg = ArgInstruction::parse("ARG x=1").expect("parse");
    arg.set_arg_value(Some("$A")).expect("set");
    let mut reparsed = ArgInstruction::parse(&arg.render()).expect("reparse");

    let env = vars(&[("A", Some("hi"))]);
    arg.resolve_variables(&env).expect("resolve");
    reparsed.resolve_variables(&env).expect("resolve");
    assert_eq!(arg.arg_value().as_deref(), Some("hi"));
    assert_eq!(arg.arg_value(), reparsed.arg_value());
}

#[test]
fn set_value_uses_the_parse_escape_char() {
    let options = ParseOptions::with_escape_char('`');
    let mut arg = ArgInstruction::parse_with("ARG x=1", options).expect("parse");
    arg.set_arg_value(Some("C:\\dir")).expect("set");
    assert_eq!(arg.render(), "ARG x=C:\\dir");
    assert!(arg.set_arg_value(Some("end`")).is_err());
    assert_eq!(arg.arg_value().as_deref(), Some("C:\\dir"));
}

#[test]
fn set_name() {
    let mut arg = ArgInstruction::parse("ARG x=1").expect("parse");
    arg.set_arg_name("y_2").expect("rename");
    assert_eq!(arg.render(), "ARG y_2=1");

    assert!(matches!(
        arg.set_arg_name(""),
        Err(Error::InvalidArgument { .. })
    ));
    assert!(arg.set_arg_name("has space").is_err());
    assert!(arg.set_arg_name("'q'").is_err());
    assert_eq!(arg.render(), "ARG y_2=1");
}

#[test]
fn instruction_name_normalized_on_set() {
    let mut arg = ArgInstruction::parse("aRg x").expect("parse");
    assert_eq!(arg.instruction_name(), "aRg");
    arg.set_instruction_name("arg").expect("set");
    assert_eq!(arg.instruction_name(), "ARG");
    assert_eq!(arg.render(), "ARG x");
    assert!(arg.set_instruction_name("").is_err());
}

#[rstest]
#[case("a r g")]
#[case("ARG=")]
#[case("A\\RG")]
#[case("'ARG'")]
fn instruction_name_must_be_one_word(#[case] name: &str) {
    let mut arg = ArgInstruction::parse("ARG x").expect("parse");
    assert!(matches!(
        arg.set_instruction_name(name),
        Err(Error::InvalidArgument { .. })
    ));
    assert_eq!(arg.render(), "ARG x");
}

#[test]
fn keyword_continuation_dropped_on_rename() {
    let mut arg = ArgInstruction::parse("A\\\nRG x").expect("parse");
    assert_eq!(arg.instruction_name(), "ARG");
    arg.set_instruction_name("ARG").expect("set");
    assert_eq!(arg.render(), "ARG x");
}

// -----------------------------------------------------------
// Factories.
// -----------------------------------------------------------

#[rstest]
#[case("x", None, "ARG x")]
#[case("x", Some("1"), "ARG x=1")]
#[case("x", Some(""), "ARG x=")]
#[case("x", Some("a b"), "ARG x=\"a b\"")]
fn create_renders_canonical(
    #[case] name: &str,
    #[case] value: Option<&str>,
    #[case] expected: &str,
) {
    let arg = ArgInstruction::create(name, value).expect("create");
    assert_eq!(arg.render(), expected);
    assert_eq!(arg.arg_name(), name);
    assert_eq!(arg.arg_value().as_deref(), value);
}

#[test]
fn create_rejects_bad_names() {
    assert!(matches!(
        ArgInstruction::create("", None),
        Err(Error::InvalidArgument { .. })
    ));
    assert!(matches!(
        ArgInstruction::create("-x", None),
        Err(Error::Parse(_))
    ));
}
