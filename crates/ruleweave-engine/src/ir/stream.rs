use std::collections::VecDeque;

use crate::annotation::Annotations;
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::ir::IntermediateRepresentation;
use crate::ir::node::Node;
use crate::ir::stack::NodeStack;
use crate::rule::MatchResult;
use crate::token::Token;

/// Queues top-level nodes as soon as they complete.
#[derive(Debug, Default)]
pub struct StreamBuilder {
    stack: NodeStack,
    ready: VecDeque<Node>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next completed top-level node, if any.
    pub fn next_node(&mut self) -> Option<Node> {
        if self.ready.is_empty() && self.stack.depth() == 1 {
            self.ready.extend(self.stack.take_root());
        }
        self.ready.pop_front()
    }
}

impl IntermediateRepresentation for StreamBuilder {
    fn will_evaluate(&mut self, _token: &Token, _position: usize) {
        self.stack.push();
    }

    fn did_evaluate(&mut self, token: &Token, annotations: &Annotations, result: &MatchResult) {
        self.stack.complete(token, annotations, result);
    }

    fn did_build(&mut self) {
        let leftovers = self.stack.finish();
        self.ready.extend(leftovers);
    }

    fn will_attempt(&mut self) {
        self.stack.push_transparent();
    }

    fn did_attempt(&mut self, committed: bool) {
        self.stack.settle(committed);
    }
}

/// Lazily parsed top-level nodes.
///
/// Each call to `next()` runs the grammar only until one more top-level node
/// is available. The stream ends at the end of input or at the first error;
/// errors are then available from [`errors`](NodeStream::errors).
pub struct NodeStream<'g, 's> {
    grammar: &'g Grammar,
    cursor: Cursor<'s>,
    builder: StreamBuilder,
    errors: Vec<ParseError>,
    finished: bool,
}

impl<'g, 's> NodeStream<'g, 's> {
    pub(crate) fn new(grammar: &'g Grammar, source: &'s str) -> Self {
        let mut builder = StreamBuilder::new();
        builder.will_build_from(source, grammar);
        log::debug!(
            "streaming {} bytes with {} top-level rule(s)",
            source.len(),
            grammar.rules().len()
        );
        Self {
            grammar,
            cursor: Cursor::new(source),
            builder,
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Errors raised so far. Complete once `next()` has returned `None`.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Current position in the source.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.builder.did_build();
        log::debug!(
            "stream finished at {} with {} error(s)",
            self.cursor.position(),
            self.errors.len()
        );
    }
}

impl Iterator for NodeStream<'_, '_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        loop {
            if let Some(node) = self.builder.next_node() {
                return Some(node);
            }
            if self.finished {
                return None;
            }
            if self.cursor.is_at_end() {
                self.finish();
                continue;
            }
            if let Err(error) = self.grammar.step(&mut self.cursor, &mut self.builder) {
                self.errors.push(error);
                self.finish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::literal;
    use crate::span::Span;

    #[test]
    fn nodes_are_released_only_at_top_level() {
        let item = Token::new("item");
        let mut builder = StreamBuilder::new();

        builder.will_evaluate(&item, 0);
        builder.will_evaluate(&item, 0);
        builder.did_evaluate(&item, &Annotations::new(), &MatchResult::Success(Span::new(0, 1)));
        assert!(builder.next_node().is_none());

        builder.did_evaluate(&item, &Annotations::new(), &MatchResult::Success(Span::new(0, 2)));
        let node = builder.next_node().unwrap();
        assert_eq!(node.span(), Span::new(0, 2));
        assert_eq!(node.children().len(), 1);
        assert!(builder.next_node().is_none());
    }

    #[test]
    fn new_stream_starts_at_the_beginning() {
        let grammar = Grammar::new([literal("a").parse_as("a")]);
        let mut stream = grammar.stream("aa");
        assert_eq!(stream.position(), 0);
        assert!(!stream.is_finished());

        assert_eq!(stream.by_ref().count(), 2);
        assert!(stream.is_finished());
        assert!(stream.errors().is_empty());
    }
}
