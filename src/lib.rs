//! Lossless concrete syntax tree parser and editor for Dockerfile
//! instructions.
//!
//! Parsed values keep every byte of their source (whitespace, comments,
//! quotes, line continuations) so that unmodified trees render back
//! byte-for-byte, and edits touch only the tokens they concern.
//!
//! # Quick start
//!
//! ## Parse, edit and render an instruction
//!
//! ```
//! use dockerfile_cst::{ArgInstruction, InstructionBase};
//!
//! let mut arg = ArgInstruction::parse("ARG version=1.0 # pinned").unwrap();
//! assert_eq!(arg.arg_name(), "version");
//!
//! arg.set_arg_value(Some("2.0")).unwrap();
//! assert_eq!(arg.render(), "ARG version=2.0 # pinned");
//! ```
//!
//! ## Custom escape character
//!
//! ```
//! use dockerfile_cst::{ChangeOwner, ParseOptions};
//!
//! let options = ParseOptions::with_escape_char('`');
//! let owner = ChangeOwner::parse_with("us`\ner:group", options).unwrap();
//! assert_eq!(owner.user(), "user");
//! assert_eq!(owner.to_string(), "us`\ner:group");
//! ```
//!
//! ## Resolve variables
//!
//! ```
//! use std::collections::HashMap;
//! use dockerfile_cst::{ArgInstruction, InstructionBase};
//!
//! let mut arg = ArgInstruction::parse("ARG image=${REGISTRY:-docker.io}/app").unwrap();
//! arg.resolve_variables(&HashMap::new()).unwrap();
//! assert_eq!(arg.arg_value().as_deref(), Some("docker.io/app"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod builder;
pub mod change_owner;
pub mod cursor;
pub mod instruction;
pub mod key_value;
pub mod parser;
pub mod render;
pub mod token;
pub mod visitor;

pub use change_owner::ChangeOwner;
pub use instruction::{ArgInstruction, Instruction, InstructionBase};
pub use key_value::{KeyValueToken, StartPeriodFlag};
pub use parser::{ParseError, ParseErrorKind, ParseOptions, WhitespaceMode};
pub use render::render_tokens;
pub use token::{
    IdentifierToken, KeywordToken, LineContinuationToken, LiteralToken, Modifier, QuoteChar, Span,
    Token, TokenKind, TypedToken, ValueToken, VariableRefToken,
};
pub use visitor::{Flow, Variables, resolve_variables, try_walk_mut, walk};

/// Unified error type for parsing and editing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input does not match the grammar.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A setter or factory received a value its field cannot hold.
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
    /// Tokens do not have the shape their owner requires.
    #[error("structural inconsistency: {0}")]
    StructuralInconsistency(String),
    /// A `${NAME?word}` or `${NAME:?word}` reference to an unset variable.
    #[error("variable {name} is not set: {message}")]
    UnsetVariable { name: String, message: String },
}
