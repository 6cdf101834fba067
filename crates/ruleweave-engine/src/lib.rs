//! # ruleweave-engine
//!
//! A backtracking parsing engine driven by a graph of composable rules.
//!
//! A grammar is a set of [`Rule`]s: terminals (literal text, character
//! classes, regular expressions) combined with sequences, ordered choices,
//! references and custom blocks. Rules may refer to each other cyclically.
//! Parsing scans a source string with a [`Cursor`] and reports every match to
//! an [`IntermediateRepresentation`], which turns the notifications into a
//! syntax tree or a lazy stream of nodes.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source ─▶ Cursor ─▶ Rule::evaluate ─▶ IR notifications ─▶ AstBuilder ─▶ Node tree
//!                      (behaviour)                        └▶ StreamBuilder ─▶ NodeStream
//! ```
//!
//! ### Rules and behaviour
//!
//! Every rule makes exactly one matching attempt ([`Rule::test`]). Its
//! [`Behaviour`] says how attempts combine into a result: how many matches
//! are required ([`Cardinality`]), whether the rule is negated or only peeks
//! ahead, and whether a match produces a node (structural), only contributes
//! its range (scanning) or is left out of its parent's range (skipping).
//!
//! ### Backtracking
//!
//! The cursor keeps a stack of checkpoints. Each evaluation and each single
//! repetition runs under its own checkpoint, so a failure anywhere rewinds to
//! a well-defined position and discards any nodes built on the way.
//!
//! ### Errors
//!
//! Failures are ordinary [`ParseError`] values. A choice that runs out of
//! alternatives reports one error whose causes are the failures of each
//! alternative; [`ParseError::deepest`] finds the most specific one. Fatal
//! errors skip all recovery.
//!
//! ## Module Structure
//!
//! ```text
//! ruleweave-engine/
//! ├── lib.rs          # This file - public API and tree snapshot tests
//! ├── span.rs         # Byte ranges into the source
//! ├── token.rs        # Grammar symbol identifiers
//! ├── cursor.rs       # Backtracking scan position with checkpoints
//! ├── terminal.rs     # Literal, character class and regex matchers
//! ├── behaviour.rs    # Kind, Cardinality, Behaviour
//! ├── annotation.rs   # Rule annotations (error, void, transient, ...)
//! ├── error.rs        # ParseError and GrammarError
//! ├── rule/
//! │   ├── mod.rs      # Rule, MatchResult, modifiers and constructors
//! │   ├── evaluate.rs # The evaluation loop shared by every rule
//! │   ├── choice.rs   # Ordered choice
//! │   ├── cyclic.rs   # Stubs and the rule cache for recursive rules
//! │   └── describe.rs # Display notation
//! ├── ir/
//! │   ├── mod.rs      # IntermediateRepresentation, LookaheadSink
//! │   ├── node.rs     # Syntax tree nodes
//! │   ├── stack.rs    # Pending children of open nodes
//! │   ├── tree.rs     # AstBuilder
//! │   └── stream.rs   # StreamBuilder and NodeStream
//! ├── grammar.rs      # Grammar, the top-level parse loop
//! └── builder.rs      # GrammarBuilder
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use ruleweave_engine::{CharacterClass, Grammar, class, literal, sequence};
//!
//! let number = class(CharacterClass::Digits).one_or_more().parse_as("number");
//! let pair = sequence([number.clone(), literal("="), number]).parse_as("pair");
//! let spaces = class(CharacterClass::WhitespacesAndNewlines).one_or_more().skip();
//! let grammar = Grammar::new([pair, spaces]);
//!
//! let outcome = grammar.parse("1=2 30=40");
//! assert!(outcome.is_success());
//!
//! let pairs = outcome.tree.children();
//! assert_eq!(pairs.len(), 2);
//! assert_eq!(pairs[1].matched("1=2 30=40"), "30=40");
//! assert_eq!(pairs[1].child(0).unwrap().matched("1=2 30=40"), "30");
//! ```

pub mod annotation;
pub mod behaviour;
pub mod builder;
pub mod cursor;
pub mod error;
pub mod grammar;
pub mod ir;
pub mod rule;
pub mod span;
pub mod terminal;
pub mod token;

#[cfg(test)]
mod tests;

pub use annotation::{Annotation, AnnotationValue, Annotations};
pub use behaviour::{Behaviour, BehaviourError, Cardinality, Kind};
pub use builder::GrammarBuilder;
pub use cursor::{Cursor, LexicalContext};
pub use error::{GrammarError, ParseError};
pub use grammar::{Grammar, ParseOutcome};
pub use ir::{
    AstBuilder, IntermediateRepresentation, LookaheadSink, Node, NodeStream, StreamBuilder,
};
pub use rule::{MatchResult, Rule, RuleCache, block, choice, class, literal, reference, sequence};
pub use span::Span;
pub use terminal::{CharacterClass, PatternCache, Terminal};
pub use token::Token;
