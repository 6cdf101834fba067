//! The intermediate representation protocol.
//!
//! Rules never build trees themselves. While evaluating they notify an
//! [`IntermediateRepresentation`], and the implementation decides what to
//! accumulate: [`AstBuilder`] builds a whole tree, [`StreamBuilder`] hands out
//! top-level nodes one at a time and [`LookaheadSink`] ignores everything.
//!
//! Notifications nest like the evaluations that raise them:
//!
//! ```text
//! will_build_from
//!   will_evaluate(value)            structural rule starts
//!     will_attempt                  one repetition
//!       will_attempt                scanning child
//!       did_attempt(true)
//!     did_attempt(true)
//!   did_evaluate(value, Success)    node complete
//! did_build
//! ```

mod node;
mod stack;
mod stream;
mod tree;

pub use node::Node;
pub use stack::NodeStack;
pub use stream::{NodeStream, StreamBuilder};
pub use tree::AstBuilder;

use crate::annotation::Annotations;
use crate::grammar::Grammar;
use crate::rule::MatchResult;
use crate::token::Token;

/// Receives evaluation notifications from rules.
///
/// Every `will_evaluate` is answered by exactly one `did_evaluate` and every
/// `will_attempt` by exactly one `did_attempt`, in LIFO order.
pub trait IntermediateRepresentation {
    /// A parse of `source` with `grammar` is about to start.
    fn will_build_from(&mut self, _source: &str, _grammar: &Grammar) {}

    /// A structural rule producing `token` starts at `position`.
    fn will_evaluate(&mut self, token: &Token, position: usize);

    /// The structural rule opened by the matching `will_evaluate` finished.
    fn did_evaluate(&mut self, token: &Token, annotations: &Annotations, result: &MatchResult);

    /// The parse finished, successfully or not.
    fn did_build(&mut self) {}

    /// A speculative attempt starts: a single repetition of a rule, or the
    /// evaluation of a non-structural rule.
    fn will_attempt(&mut self) {}

    /// The attempt opened by the matching `will_attempt` was kept
    /// (`committed`) or backtracked.
    fn did_attempt(&mut self, _committed: bool) {}
}

/// Swallows every notification. Lookahead evaluates against this so that a
/// peek never leaves nodes behind.
#[derive(Debug, Default, Clone, Copy)]
pub struct LookaheadSink;

impl IntermediateRepresentation for LookaheadSink {
    fn will_evaluate(&mut self, _token: &Token, _position: usize) {}

    fn did_evaluate(&mut self, _token: &Token, _annotations: &Annotations, _result: &MatchResult) {}
}
