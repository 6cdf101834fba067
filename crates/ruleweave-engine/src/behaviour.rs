//! How a rule's single-shot test is turned into pass, fail and a range.
//!
//! Every rule carries a [`Behaviour`]: what it produces ([`Kind`]), how many
//! times it must match ([`Cardinality`]), and whether it is negated or only
//! looked ahead at. The evaluation loop in [`crate::rule`] applies it the same
//! way for every kind of rule.

use std::fmt;

use thiserror::Error;

use crate::token::Token;

/// What a successful match contributes to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The range is included in the parent's range and a node is created.
    Structural(Token),
    /// The range is included but no node is created.
    Scanning,
    /// The match succeeds but its range is excluded from the parent's range.
    Skipping,
}

impl Kind {
    pub fn token(&self) -> Option<&Token> {
        match self {
            Kind::Structural(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Kind::Structural(_))
    }

    pub fn is_skipping(&self) -> bool {
        matches!(self, Kind::Skipping)
    }
}

/// Repetition bounds. `maximum: None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub minimum: usize,
    pub maximum: Option<usize>,
}

impl Cardinality {
    pub const ONE: Cardinality = Cardinality {
        minimum: 1,
        maximum: Some(1),
    };
    pub const OPTIONAL: Cardinality = Cardinality {
        minimum: 0,
        maximum: Some(1),
    };
    pub const ZERO_OR_MORE: Cardinality = Cardinality {
        minimum: 0,
        maximum: None,
    };
    pub const ONE_OR_MORE: Cardinality = Cardinality {
        minimum: 1,
        maximum: None,
    };

    /// # Panics
    ///
    /// Panics if `maximum` is below `minimum`.
    pub fn new(minimum: usize, maximum: Option<usize>) -> Self {
        if let Some(max) = maximum {
            assert!(
                max >= minimum,
                "cardinality maximum {max} is below minimum {minimum}"
            );
        }
        Self { minimum, maximum }
    }

    pub fn exactly(n: usize) -> Self {
        Self::new(n, Some(n))
    }

    /// True when the rule may match nothing at all.
    pub fn is_skippable(&self) -> bool {
        self.minimum == 0
    }

    /// True when another attempt is allowed after `matches` successes.
    pub fn allows(&self, matches: usize) -> bool {
        self.maximum.is_none_or(|max| matches < max)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::ONE
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.minimum, self.maximum) {
            (1, Some(1)) => Ok(()),
            (0, Some(1)) => f.write_str("?"),
            (0, None) => f.write_str("*"),
            (1, None) => f.write_str("+"),
            (min, None) => write!(f, "{{{min},}}"),
            (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
            (min, Some(max)) => write!(f, "{{{min},{max}}}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviourError {
    #[error("a lookahead rule cannot be structural (token `{0}`)")]
    StructuralLookahead(Token),

    #[error("a rule that may match nothing (minimum 0) cannot be negated")]
    NegatedOptional,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Behaviour {
    pub kind: Kind,
    pub cardinality: Cardinality,
    pub negate: bool,
    pub lookahead: bool,
}

impl Behaviour {
    pub fn new(
        kind: Kind,
        cardinality: Cardinality,
        negate: bool,
        lookahead: bool,
    ) -> Result<Self, BehaviourError> {
        let behaviour = Self {
            kind,
            cardinality,
            negate,
            lookahead,
        };
        behaviour.validate()?;
        Ok(behaviour)
    }

    /// Matches once, creating no node.
    pub fn scanning() -> Self {
        Self {
            kind: Kind::Scanning,
            cardinality: Cardinality::ONE,
            negate: false,
            lookahead: false,
        }
    }

    /// Matches once, creating a node for `token`.
    pub fn structural(token: impl Into<Token>) -> Self {
        Self {
            kind: Kind::Structural(token.into()),
            ..Self::scanning()
        }
    }

    /// Matches once, excluding its range from the parent.
    pub fn skipping() -> Self {
        Self {
            kind: Kind::Skipping,
            ..Self::scanning()
        }
    }

    pub fn validate(&self) -> Result<(), BehaviourError> {
        if let (true, Kind::Structural(token)) = (self.lookahead, &self.kind) {
            return Err(BehaviourError::StructuralLookahead(token.clone()));
        }
        if self.negate && self.cardinality.is_skippable() {
            return Err(BehaviourError::NegatedOptional);
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&Token> {
        self.kind.token()
    }
}

impl Default for Behaviour {
    fn default() -> Self {
        Self::scanning()
    }
}
