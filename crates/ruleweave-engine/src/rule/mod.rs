//! Rules: the composable matchers a grammar is built from.
//!
//! A [`Rule`] is an immutable, cheaply clonable handle. Every rule knows how
//! to make exactly one matching attempt ([`Rule::test`]); its [`Behaviour`]
//! decides how those attempts are repeated, negated or looked ahead at
//! ([`Rule::evaluate`]). Modifiers such as [`Rule::one_or_more`] never mutate
//! a rule, they return a rebuilt copy.
//!
//! ```
//! use ruleweave_engine::{CharacterClass, class, literal, sequence};
//!
//! let number = class(CharacterClass::Digits).one_or_more().parse_as("number");
//! let sum = sequence([number.clone(), literal("+"), number]).parse_as("sum");
//! assert_eq!(sum.to_string(), "sum");
//! ```

mod choice;
mod cyclic;
mod describe;
mod evaluate;

use std::borrow::Cow;
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationValue, Annotations};
use crate::behaviour::{Behaviour, Cardinality, Kind};
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::ir::IntermediateRepresentation;
use crate::span::Span;
use crate::terminal::{CharacterClass, Terminal};
use crate::token::Token;

pub(crate) use choice::{Chosen, first_match};
pub use cyclic::{CyclicStub, RuleCache};
pub(crate) use cyclic::{Begin, CyclicRef};

/// A user supplied single-attempt matcher, see [`block`].
pub type BlockFn =
    dyn Fn(&mut Cursor<'_>, &mut dyn IntermediateRepresentation) -> Result<(), ParseError>
        + Send
        + Sync;

/// Outcome of a successful evaluation, also reported to the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The rule matched `span`.
    Success(Span),
    /// A skipping rule matched `span`; the range is not part of the parent.
    Consumed(Span),
    /// A rule that may match nothing did not match at the position.
    IgnorableFailure(usize),
    /// The rule failed at the position. Only ever reported to the IR.
    Failure(usize),
}

impl MatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success(_) | MatchResult::Consumed(_))
    }

    /// The matched range of a success.
    pub fn span(&self) -> Option<Span> {
        match self {
            MatchResult::Success(span) | MatchResult::Consumed(span) => Some(*span),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Rule(Arc<RuleNode>);

pub(crate) enum RuleNode {
    Defined(Definition),
    Cyclic(CyclicRef),
}

pub(crate) struct Definition {
    behaviour: Behaviour,
    annotations: Annotations,
    matcher: Matcher,
}

#[derive(Clone)]
pub(crate) enum Matcher {
    Terminal(Terminal),
    Sequence(Arc<[Rule]>),
    Choice(Arc<[Rule]>),
    Reference(Rule),
    Block { name: Arc<str>, test: Arc<BlockFn> },
}

impl Matcher {
    fn test(
        &self,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<(), ParseError> {
        match self {
            Matcher::Terminal(terminal) => terminal.test(cursor),
            Matcher::Sequence(rules) => {
                for rule in rules.iter() {
                    rule.evaluate(cursor, ir)?;
                }
                Ok(())
            }
            Matcher::Choice(rules) => first_match(rules, cursor, ir).map(|_| ()),
            Matcher::Reference(target) => {
                let behaviour = Behaviour {
                    kind: Kind::Scanning,
                    ..target.behaviour()
                };
                target.evaluate_with(&behaviour, cursor, ir).map(|_| ())
            }
            Matcher::Block { test, .. } => (**test)(cursor, ir),
        }
    }
}

/// Behaviour and annotation changes recorded against a rule.
///
/// Defined rules apply them straight away. Cyclic references keep them and
/// lay them over their surrogate at evaluation time, because the surrogate
/// may not exist yet when the modifier is called.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    kind: Option<Kind>,
    cardinality: Option<Cardinality>,
    negate: Option<bool>,
    /// Flip the negation after `negate` was applied.
    invert: bool,
    lookahead: Option<bool>,
    annotations: Option<Annotations>,
}

impl Overrides {
    fn replacing(behaviour: Behaviour) -> Self {
        Self {
            kind: Some(behaviour.kind),
            cardinality: Some(behaviour.cardinality),
            negate: Some(behaviour.negate),
            invert: false,
            lookahead: Some(behaviour.lookahead),
            annotations: None,
        }
    }

    fn kind(kind: Kind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    fn cardinality(cardinality: Cardinality) -> Self {
        Self {
            cardinality: Some(cardinality),
            ..Self::default()
        }
    }

    fn annotation(annotation: Annotation, value: AnnotationValue) -> Self {
        Self {
            annotations: Some(Annotations::new().with(annotation, value)),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, base: &Behaviour) -> Behaviour {
        let mut behaviour = base.clone();
        if let Some(kind) = &self.kind {
            behaviour.kind = kind.clone();
        }
        if let Some(cardinality) = self.cardinality {
            behaviour.cardinality = cardinality;
        }
        if let Some(negate) = self.negate {
            behaviour.negate = negate;
        }
        behaviour.negate ^= self.invert;
        if let Some(lookahead) = self.lookahead {
            behaviour.lookahead = lookahead;
        }
        behaviour
    }

    pub(crate) fn annotate(&self, base: &Annotations) -> Annotations {
        match &self.annotations {
            Some(overlay) => base.merged(overlay),
            None => base.clone(),
        }
    }

    /// `self` followed by `later`.
    fn then(&self, later: Overrides) -> Overrides {
        let (negate, invert) = match later.negate {
            Some(negate) => (Some(negate), later.invert),
            None => (self.negate, self.invert ^ later.invert),
        };
        let annotations = match (&self.annotations, later.annotations) {
            (Some(earlier), Some(overlay)) => Some(earlier.merged(&overlay)),
            (earlier, overlay) => overlay.or_else(|| earlier.clone()),
        };
        Overrides {
            kind: later.kind.or_else(|| self.kind.clone()),
            cardinality: later.cardinality.or(self.cardinality),
            negate,
            invert,
            lookahead: later.lookahead.or(self.lookahead),
            annotations,
        }
    }
}

impl Rule {
    fn defined(behaviour: Behaviour, matcher: Matcher) -> Rule {
        Rule(Arc::new(RuleNode::Defined(Definition {
            behaviour,
            annotations: Annotations::new(),
            matcher,
        })))
    }

    pub(crate) fn cyclic(stub: Arc<CyclicStub>) -> Rule {
        Rule(Arc::new(RuleNode::Cyclic(CyclicRef::new(stub))))
    }

    pub(crate) fn node(&self) -> &RuleNode {
        &self.0
    }

    /// A rule that makes one attempt with `terminal`.
    pub fn terminal(terminal: Terminal) -> Rule {
        Rule::defined(Behaviour::scanning(), Matcher::Terminal(terminal))
    }

    pub fn behaviour(&self) -> Behaviour {
        match self.node() {
            RuleNode::Defined(def) => def.behaviour.clone(),
            RuleNode::Cyclic(cyclic) => cyclic.behaviour(),
        }
    }

    pub fn annotations(&self) -> Cow<'_, Annotations> {
        match self.node() {
            RuleNode::Defined(def) => Cow::Borrowed(&def.annotations),
            RuleNode::Cyclic(cyclic) => cyclic.annotations(),
        }
    }

    /// Makes exactly one matching attempt, ignoring the behaviour.
    ///
    /// On failure the cursor may be left part way through the attempt;
    /// [`evaluate`](Rule::evaluate) checkpoints around every call.
    pub fn test(
        &self,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<(), ParseError> {
        match self.node() {
            RuleNode::Defined(def) => def.matcher.test(cursor, ir),
            RuleNode::Cyclic(cyclic) => cyclic.test(cursor, ir),
        }
    }

    /// A copy with the behaviour and/or annotations replaced.
    ///
    /// On a cyclic reference the replacement is laid over the surrogate, so
    /// annotations given here are added to the surrogate's own.
    ///
    /// # Panics
    ///
    /// Panics if `behaviour` is invalid (see [`Behaviour::validate`]).
    pub fn rebuild(&self, behaviour: Option<Behaviour>, annotations: Option<Annotations>) -> Rule {
        if let Some(Err(err)) = behaviour.as_ref().map(Behaviour::validate) {
            panic!("cannot rebuild `{self}`: {err}");
        }
        let node = match self.node() {
            RuleNode::Defined(def) => RuleNode::Defined(Definition {
                behaviour: behaviour.unwrap_or_else(|| def.behaviour.clone()),
                annotations: annotations.unwrap_or_else(|| def.annotations.clone()),
                matcher: def.matcher.clone(),
            }),
            RuleNode::Cyclic(cyclic) => {
                let mut patch = behaviour.map(Overrides::replacing).unwrap_or_default();
                patch.annotations = annotations;
                RuleNode::Cyclic(cyclic.patched(patch))
            }
        };
        Rule(Arc::new(node))
    }

    fn patched(&self, patch: Overrides) -> Rule {
        let node = match self.node() {
            RuleNode::Defined(def) => {
                let behaviour = patch.apply(&def.behaviour);
                if let Err(err) = behaviour.validate() {
                    panic!("cannot rebuild `{self}`: {err}");
                }
                RuleNode::Defined(Definition {
                    behaviour,
                    annotations: patch.annotate(&def.annotations),
                    matcher: def.matcher.clone(),
                })
            }
            RuleNode::Cyclic(cyclic) => RuleNode::Cyclic(cyclic.patched(patch)),
        };
        Rule(Arc::new(node))
    }

    pub fn one(&self) -> Rule {
        self.patched(Overrides::cardinality(Cardinality::ONE))
    }

    pub fn optional(&self) -> Rule {
        self.patched(Overrides::cardinality(Cardinality::OPTIONAL))
    }

    pub fn zero_or_more(&self) -> Rule {
        self.patched(Overrides::cardinality(Cardinality::ZERO_OR_MORE))
    }

    pub fn one_or_more(&self) -> Rule {
        self.patched(Overrides::cardinality(Cardinality::ONE_OR_MORE))
    }

    /// # Panics
    ///
    /// Panics if `maximum` is below `minimum`, or if the rule is negated and
    /// `minimum` is 0.
    pub fn repeated(&self, minimum: usize, maximum: Option<usize>) -> Rule {
        self.patched(Overrides::cardinality(Cardinality::new(minimum, maximum)))
    }

    /// Inverts the rule: it succeeds by consuming one character exactly where
    /// the original would fail. Negating twice restores the original.
    ///
    /// # Panics
    ///
    /// Panics if the rule may match nothing (minimum cardinality 0).
    pub fn negated(&self) -> Rule {
        self.patched(Overrides {
            invert: true,
            ..Overrides::default()
        })
    }

    /// Turns the rule into a peek: it reports whether it would match without
    /// consuming input or producing nodes. A structural rule becomes scanning.
    pub fn lookahead(&self) -> Rule {
        let demote = self.behaviour().kind.is_structural();
        self.patched(Overrides {
            lookahead: Some(true),
            kind: demote.then_some(Kind::Scanning),
            ..Overrides::default()
        })
    }

    pub fn scan(&self) -> Rule {
        self.patched(Overrides::kind(Kind::Scanning))
    }

    pub fn skip(&self) -> Rule {
        self.patched(Overrides::kind(Kind::Skipping))
    }

    /// Makes the rule structural: every match creates a node for `token`.
    ///
    /// # Panics
    ///
    /// Panics if the rule is a lookahead.
    pub fn parse_as(&self, token: impl Into<Token>) -> Rule {
        self.patched(Overrides::kind(Kind::Structural(token.into())))
    }

    pub fn annotated(&self, annotation: Annotation, value: impl Into<AnnotationValue>) -> Rule {
        self.patched(Overrides::annotation(annotation, value.into()))
    }

    /// Replaces the generic failure message with `message`.
    pub fn with_error(&self, message: impl Into<String>) -> Rule {
        self.annotated(Annotation::Error, message.into())
    }

    pub fn fatal(&self) -> Rule {
        self.annotated(Annotation::Fatal, AnnotationValue::Set)
    }

    pub fn void(&self) -> Rule {
        self.annotated(Annotation::Void, AnnotationValue::Set)
    }

    pub fn transient(&self) -> Rule {
        self.annotated(Annotation::Transient, AnnotationValue::Set)
    }

    pub fn pinned(&self) -> Rule {
        self.annotated(Annotation::Pinned, AnnotationValue::Set)
    }
}

/// Matches `text` exactly.
///
/// # Panics
///
/// Panics if `text` is empty. Use [`Terminal::literal`] to handle that case.
pub fn literal(text: &str) -> Rule {
    match Terminal::literal(text) {
        Ok(terminal) => Rule::terminal(terminal),
        Err(err) => panic!("{err}"),
    }
}

/// Matches one character of `class`.
pub fn class(class: CharacterClass) -> Rule {
    Rule::terminal(Terminal::class(class))
}

/// Matches every rule in order.
pub fn sequence(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::defined(Behaviour::scanning(), Matcher::Sequence(rules.into_iter().collect()))
}

/// Matches the first rule that succeeds, trying them in order.
pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::defined(Behaviour::scanning(), Matcher::Choice(rules.into_iter().collect()))
}

/// Matches `target` but produces `token` instead of whatever `target` produces.
pub fn reference(target: Rule, token: impl Into<Token>) -> Rule {
    Rule::defined(Behaviour::structural(token), Matcher::Reference(target))
}

/// A rule whose single attempt is the closure `test`. `name` is used in
/// messages.
pub fn block<F>(name: &str, test: F) -> Rule
where
    F: Fn(&mut Cursor<'_>, &mut dyn IntermediateRepresentation) -> Result<(), ParseError>
        + Send
        + Sync
        + 'static,
{
    Rule::defined(
        Behaviour::scanning(),
        Matcher::Block {
            name: name.into(),
            test: Arc::new(test),
        },
    )
}
