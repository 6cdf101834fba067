use std::fmt;
use std::sync::Arc;

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::ir::{AstBuilder, IntermediateRepresentation, Node, NodeStream};
use crate::rule::{Chosen, Rule, first_match};
use crate::span::Span;
use crate::token::Token;

/// An ordered list of top-level rules.
///
/// Parsing repeatedly tries the rules in order at the current position,
/// keeping the first that matches, until the input is consumed or nothing
/// matches.
#[derive(Clone)]
pub struct Grammar {
    rules: Arc<[Rule]>,
    root: Token,
}

/// The tree produced by [`Grammar::parse`] and the errors that stopped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub tree: Node,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The tree if the whole input parsed, otherwise the first error.
    pub fn into_result(self) -> Result<Node, ParseError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.tree),
        }
    }
}

impl Grammar {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            root: Token::root(),
        }
    }

    /// Uses `root` as the token of the node wrapping each parse.
    pub fn with_root(mut self, root: impl Into<Token>) -> Self {
        self.root = root.into();
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn root(&self) -> &Token {
        &self.root
    }

    /// Parses `source` into a tree.
    ///
    /// Parsing never fails outright: the tree holds whatever was matched
    /// before the first error and the errors are returned alongside it.
    pub fn parse(&self, source: &str) -> ParseOutcome {
        let mut builder = AstBuilder::new(self.root.clone());
        let mut cursor = Cursor::new(source);
        let errors = self.run(&mut cursor, &mut builder);
        let tree = builder.finish(Span::new(0, cursor.position()));
        ParseOutcome { tree, errors }
    }

    /// Parses `source`, reporting to a caller supplied IR.
    pub fn build(&self, source: &str, ir: &mut dyn IntermediateRepresentation) -> Vec<ParseError> {
        let mut cursor = Cursor::new(source);
        self.run(&mut cursor, ir)
    }

    /// Parses `source` lazily, one top-level node at a time.
    pub fn stream<'g, 's>(&'g self, source: &'s str) -> NodeStream<'g, 's> {
        NodeStream::new(self, source)
    }

    fn run(
        &self,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Vec<ParseError> {
        ir.will_build_from(cursor.source(), self);
        log::debug!(
            "parsing {} bytes with {} top-level rule(s)",
            cursor.source().len(),
            self.rules.len()
        );
        let mut errors = Vec::new();
        while !cursor.is_at_end() {
            if let Err(error) = self.step(cursor, ir) {
                errors.push(error);
                break;
            }
        }
        ir.did_build();
        log::debug!(
            "parse stopped at {} with {} error(s)",
            cursor.position(),
            errors.len()
        );
        errors
    }

    /// Matches one top-level rule at the cursor.
    pub(crate) fn step(
        &self,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<(), ParseError> {
        let start = cursor.position();
        match first_match(&self.rules, cursor, ir)? {
            Chosen::Matched(_) if cursor.position() > start => Ok(()),
            Chosen::Matched(_) => {
                log::warn!("top-level rule matched without consuming input at {start}");
                Err(ParseError::ZeroWidthMatch { position: start })
            }
            Chosen::Absent => Err(ParseError::parsing(
                Span::empty(start),
                "no rule matched",
                Vec::new(),
            )),
        }
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("root", &self.root)
            .field("rules", &self.rules)
            .finish()
    }
}
