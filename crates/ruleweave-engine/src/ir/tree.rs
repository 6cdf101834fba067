use crate::annotation::Annotations;
use crate::ir::IntermediateRepresentation;
use crate::ir::node::Node;
use crate::ir::stack::NodeStack;
use crate::rule::MatchResult;
use crate::span::Span;
use crate::token::Token;

/// Builds the complete syntax tree of a parse.
///
/// Top-level nodes accumulate until [`finish`](AstBuilder::finish) wraps them
/// in a root node.
#[derive(Debug)]
pub struct AstBuilder {
    stack: NodeStack,
    root: Token,
}

impl AstBuilder {
    pub fn new(root: Token) -> Self {
        Self {
            stack: NodeStack::new(),
            root,
        }
    }

    /// Wraps everything built so far in a root node covering `span`.
    pub fn finish(mut self, span: Span) -> Node {
        let children = self.stack.finish();
        Node::new(self.root, span, Annotations::new(), children)
    }
}

impl IntermediateRepresentation for AstBuilder {
    fn will_evaluate(&mut self, _token: &Token, _position: usize) {
        self.stack.push();
    }

    fn did_evaluate(&mut self, token: &Token, annotations: &Annotations, result: &MatchResult) {
        self.stack.complete(token, annotations, result);
    }

    fn will_attempt(&mut self) {
        self.stack.push_transparent();
    }

    fn did_attempt(&mut self, committed: bool) {
        self.stack.settle(committed);
    }
}
