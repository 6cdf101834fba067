//! The child-node accumulation stack shared by the tree and stream builders.
//!
//! Every structural evaluation pushes a frame; nodes completed while it is on
//! top become its children. Speculative attempts push *transparent* frames:
//! committing one splices its nodes into the frame below, abandoning one
//! drops them. Either way nothing from a backtracked match survives.

use crate::annotation::{Annotation, Annotations};
use crate::ir::node::Node;
use crate::rule::MatchResult;
use crate::token::Token;

#[derive(Debug, Default)]
struct Frame {
    children: Vec<Node>,
    transparent: bool,
}

#[derive(Debug)]
pub struct NodeStack {
    frames: Vec<Frame>,
}

impl Default for NodeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStack {
    /// A stack holding only the root frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Open frames, including the root frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Opens a frame for a structural rule.
    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Opens a frame for a speculative attempt.
    pub fn push_transparent(&mut self) {
        self.frames.push(Frame {
            children: Vec::new(),
            transparent: true,
        });
    }

    /// Closes the top structural frame. On success a node is built from the
    /// frame's children and appended to the parent; on failure the children
    /// are discarded.
    pub fn complete(&mut self, token: &Token, annotations: &Annotations, result: &MatchResult) {
        let children = self.pop();
        let Some(span) = result.span() else {
            return;
        };
        if annotations.is_set(&Annotation::Void) {
            return;
        }
        if annotations.is_set(&Annotation::Transient) {
            self.top().extend(children);
            return;
        }
        self.top()
            .push(Node::new(token.clone(), span, annotations.clone(), children));
    }

    /// Closes the top transparent frame, keeping its nodes when `committed`.
    pub fn settle(&mut self, committed: bool) {
        debug_assert!(
            self.frames.last().is_some_and(|f| f.transparent),
            "settle() on a structural frame"
        );
        let children = self.pop();
        if committed {
            self.top().extend(children);
        }
    }

    /// Takes every node completed at the root so far.
    pub fn take_root(&mut self) -> Vec<Node> {
        std::mem::take(&mut self.frames[0].children)
    }

    /// Folds any frames still open into the root and returns its nodes.
    pub fn finish(&mut self) -> Vec<Node> {
        while self.frames.len() > 1 {
            let children = self.pop();
            self.top().extend(children);
        }
        self.take_root()
    }

    pub fn clear(&mut self) {
        self.frames.truncate(1);
        self.frames[0].children.clear();
    }

    fn pop(&mut self) -> Vec<Node> {
        if self.frames.len() == 1 {
            debug_assert!(false, "attempted to pop the root frame");
            return Vec::new();
        }
        self.frames.pop().map(|f| f.children).unwrap_or_default()
    }

    fn top(&mut self) -> &mut Vec<Node> {
        let last = self.frames.len() - 1;
        &mut self.frames[last].children
    }
}
