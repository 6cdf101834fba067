//! Errors raised while evaluating rules and while building grammars.
//!
//! [`ParseError`] is a causal error: an ordered choice that exhausts all of
//! its alternatives reports one error whose `causes` are the failures of each
//! alternative, so diagnostics can walk down to the most specific failure.

use thiserror::Error;

use crate::behaviour::BehaviourError;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A terminal failed to match at `position`.
    #[error("expected {expected} at {position}")]
    Scanning { position: usize, expected: String },

    /// A rule's minimum cardinality was not met, a negated rule matched, or
    /// every alternative of a choice failed.
    #[error("{message}")]
    Parsing {
        span: Span,
        message: String,
        causes: Vec<ParseError>,
        /// `message` comes from an `error` annotation.
        custom: bool,
    },

    /// A cyclic rule was evaluated before its definition was assigned.
    #[error("rule `{name}` was evaluated before its definition was assigned")]
    UndefinedRule { name: String },

    /// An error that aborts every enclosing alternative.
    #[error("{message}")]
    Fatal {
        span: Span,
        message: String,
        causes: Vec<ParseError>,
    },

    /// A top-level rule reported success without consuming input.
    #[error("a top-level rule matched zero-width input at {position}")]
    ZeroWidthMatch { position: usize },
}

impl ParseError {
    pub fn scanning(position: usize, expected: impl Into<String>) -> Self {
        ParseError::Scanning {
            position,
            expected: expected.into(),
        }
    }

    pub fn parsing(span: Span, message: impl Into<String>, causes: Vec<ParseError>) -> Self {
        ParseError::Parsing {
            span,
            message: message.into(),
            causes,
            custom: false,
        }
    }

    /// A parsing error whose message was supplied by the grammar author.
    pub fn annotated(span: Span, message: impl Into<String>, causes: Vec<ParseError>) -> Self {
        ParseError::Parsing {
            span,
            message: message.into(),
            causes,
            custom: true,
        }
    }

    pub fn is_annotated(&self) -> bool {
        matches!(self, ParseError::Parsing { custom: true, .. })
    }

    pub fn fatal(span: Span, message: impl Into<String>, causes: Vec<ParseError>) -> Self {
        ParseError::Fatal {
            span,
            message: message.into(),
            causes,
        }
    }

    /// Fatal errors bypass choice and cardinality recovery.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ParseError::UndefinedRule { .. }
                | ParseError::Fatal { .. }
                | ParseError::ZeroWidthMatch { .. }
        )
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::Scanning { position, .. } | ParseError::ZeroWidthMatch { position } => {
                Span::empty(*position)
            }
            ParseError::Parsing { span, .. } | ParseError::Fatal { span, .. } => *span,
            ParseError::UndefinedRule { .. } => Span::default(),
        }
    }

    /// The human readable message, without position information for
    /// errors that carry a custom message.
    pub fn message(&self) -> String {
        match self {
            ParseError::Scanning { expected, .. } => format!("expected {expected}"),
            ParseError::Parsing { message, .. } | ParseError::Fatal { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn causes(&self) -> &[ParseError] {
        match self {
            ParseError::Parsing { causes, .. } | ParseError::Fatal { causes, .. } => causes,
            _ => &[],
        }
    }

    /// Converts a recoverable error into a fatal one, keeping its message and
    /// causes. Already fatal errors are returned unchanged.
    pub fn escalate(self) -> Self {
        match self {
            ParseError::Parsing {
                span,
                message,
                causes,
                ..
            } => ParseError::Fatal {
                span,
                message,
                causes,
            },
            ParseError::Scanning { position, .. } => {
                let message = self.message();
                ParseError::Fatal {
                    span: Span::empty(position),
                    message,
                    causes: vec![self],
                }
            }
            fatal => fatal,
        }
    }

    /// Pre-order walk over this error and all of its causes.
    pub fn flatten(&self) -> Vec<&ParseError> {
        let mut out = vec![self];
        for cause in self.causes() {
            out.extend(cause.flatten());
        }
        out
    }

    /// The leaf cause that got furthest into the input. Ties keep the first
    /// one found in pre-order.
    pub fn deepest(&self) -> &ParseError {
        self.flatten()
            .into_iter()
            .filter(|e| e.causes().is_empty())
            .fold(None, |best: Option<&ParseError>, e| match best {
                Some(b) if b.span().end >= e.span().end => Some(b),
                _ => Some(e),
            })
            .unwrap_or(self)
    }

    /// Line and column (both 1-based, column in `char`s) of the error start.
    pub fn location(&self, source: &str) -> (usize, usize) {
        let offset = self.span().start.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;
        (line, column)
    }
}

/// Errors raised while constructing rules and grammars.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid pattern /{pattern}/: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("literal terminals must not be empty")]
    EmptyLiteral,

    #[error("rule `{name}` was referenced but never defined")]
    UnresolvedRule { name: String },

    #[error("rule `{name}` is defined as a reference to itself")]
    CircularDefinition { name: String },

    #[error("rule `{name}` is already defined")]
    DuplicateRule { name: String },

    #[error(transparent)]
    Behaviour(#[from] BehaviourError),
}
