//! Rules that refer to themselves, directly or through other rules.
//!
//! A rule graph with cycles cannot be built bottom-up. Instead every named
//! rule gets a [`CyclicStub`] before its definition is built; references made
//! while building resolve to the stub, and once the definition exists it is
//! assigned to the stub as its *surrogate*. From then on the stub behaves
//! exactly like its surrogate.
//!
//! A stub and its surrogate hold each other through `Arc`s, so a grammar with
//! recursive rules is never freed. Grammars are built once and live for the
//! program, which makes this acceptable.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::annotation::Annotations;
use crate::behaviour::{Behaviour, Kind};
use crate::cursor::Cursor;
use crate::error::{GrammarError, ParseError};
use crate::ir::IntermediateRepresentation;
use crate::rule::{Overrides, Rule, RuleNode};

/// A named placeholder for a rule whose definition is assigned later.
pub struct CyclicStub {
    name: Arc<str>,
    surrogate: OnceLock<Rule>,
}

impl CyclicStub {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            surrogate: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surrogate(&self) -> Option<&Rule> {
        self.surrogate.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.surrogate.get().is_some()
    }
}

impl fmt::Debug for CyclicStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CyclicStub")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A reference to a stub, with modifiers applied to it.
#[derive(Clone)]
pub(crate) struct CyclicRef {
    stub: Arc<CyclicStub>,
    overrides: Overrides,
}

impl CyclicRef {
    pub(crate) fn new(stub: Arc<CyclicStub>) -> Self {
        Self {
            stub,
            overrides: Overrides::default(),
        }
    }

    pub(crate) fn stub(&self) -> &CyclicStub {
        &self.stub
    }

    pub(crate) fn patched(&self, patch: Overrides) -> CyclicRef {
        CyclicRef {
            stub: Arc::clone(&self.stub),
            overrides: self.overrides.then(patch),
        }
    }

    pub(crate) fn behaviour(&self) -> Behaviour {
        let base = self
            .stub
            .surrogate()
            .map(Rule::behaviour)
            .unwrap_or_default();
        let mut behaviour = self.overrides.apply(&base);
        if behaviour.lookahead && behaviour.kind.is_structural() {
            behaviour.kind = Kind::Scanning;
        }
        behaviour
    }

    pub(crate) fn annotations(&self) -> Cow<'_, Annotations> {
        match (self.stub.surrogate(), &self.overrides.annotations) {
            (Some(surrogate), None) => surrogate.annotations(),
            (Some(surrogate), Some(_)) => {
                Cow::Owned(self.overrides.annotate(&surrogate.annotations()))
            }
            (None, Some(overlay)) => Cow::Borrowed(overlay),
            (None, None) => Cow::Owned(Annotations::new()),
        }
    }

    pub(crate) fn test(
        &self,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<(), ParseError> {
        match self.stub.surrogate() {
            Some(surrogate) => surrogate.test(cursor, ir),
            None => Err(ParseError::UndefinedRule {
                name: self.stub.name().to_string(),
            }),
        }
    }
}

enum Entry {
    /// Referenced ahead of its definition.
    Declared(Arc<CyclicStub>),
    /// Its definition is being built right now.
    Building {
        stub: Arc<CyclicStub>,
        declared: bool,
    },
    Defined(Rule),
}

/// What [`RuleCache::begin`] found for a name.
pub(crate) enum Begin {
    /// The rule to use: its definition, or a cyclic reference while the
    /// definition is still being built.
    Ready(Rule),
    /// The caller must build the definition and hand it to `complete`.
    Build(Arc<CyclicStub>),
}

/// Named rules of a grammar under construction.
///
/// ```
/// use ruleweave_engine::{RuleCache, choice, literal, sequence};
///
/// let mut rules = RuleCache::new();
/// let nested = rules
///     .define("nested", |rules| {
///         let inner = rules.define("nested", |_| unreachable!())?;
///         Ok(choice([sequence([literal("("), inner, literal(")")]), literal("x")]))
///     })
///     .unwrap();
/// assert!(rules.unresolved().is_empty());
/// # let _ = nested;
/// ```
#[derive(Default)]
pub struct RuleCache {
    entries: HashMap<String, Entry>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rule called `name`, building it with `build` unless it is
    /// already built.
    ///
    /// While `build` runs, any `define` or [`declare`](RuleCache::declare) of
    /// the same name yields a cyclic reference instead of recursing.
    pub fn define<F>(&mut self, name: &str, build: F) -> Result<Rule, GrammarError>
    where
        F: FnOnce(&mut RuleCache) -> Result<Rule, GrammarError>,
    {
        let stub = match self.begin(name) {
            Begin::Ready(rule) => return Ok(rule),
            Begin::Build(stub) => stub,
        };
        match build(self) {
            Ok(rule) => self.complete(name, &stub, rule),
            Err(err) => {
                self.abandon(name, stub);
                Err(err)
            }
        }
    }

    /// A reference to `name` that may be used before the rule is defined.
    pub fn declare(&mut self, name: &str) -> Rule {
        match self.entries.get(name) {
            Some(Entry::Defined(rule)) => rule.clone(),
            Some(Entry::Declared(stub)) | Some(Entry::Building { stub, .. }) => {
                Rule::cyclic(Arc::clone(stub))
            }
            None => {
                let stub = Arc::new(CyclicStub::new(name));
                self.entries
                    .insert(name.to_string(), Entry::Declared(Arc::clone(&stub)));
                Rule::cyclic(stub)
            }
        }
    }

    /// Defines a rule previously handed out by [`declare`](RuleCache::declare).
    pub fn assign(&mut self, name: &str, rule: Rule) -> Result<Rule, GrammarError> {
        match self.begin(name) {
            Begin::Build(stub) => self.complete(name, &stub, rule),
            Begin::Ready(_) => Err(GrammarError::DuplicateRule {
                name: name.to_string(),
            }),
        }
    }

    /// The rule called `name`, if it has been defined.
    pub fn get(&self, name: &str) -> Option<Rule> {
        match self.entries.get(name) {
            Some(Entry::Defined(rule)) => Some(rule.clone()),
            _ => None,
        }
    }

    /// Names that were referenced but are not defined, sorted.
    pub fn unresolved(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !matches!(entry, Entry::Defined(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub(crate) fn begin(&mut self, name: &str) -> Begin {
        let (stub, declared) = match self.entries.remove(name) {
            Some(Entry::Defined(rule)) => {
                self.entries.insert(name.to_string(), Entry::Defined(rule.clone()));
                return Begin::Ready(rule);
            }
            Some(Entry::Building { stub, declared }) => {
                let rule = Rule::cyclic(Arc::clone(&stub));
                self.entries
                    .insert(name.to_string(), Entry::Building { stub, declared });
                return Begin::Ready(rule);
            }
            Some(Entry::Declared(stub)) => (stub, true),
            None => (Arc::new(CyclicStub::new(name)), false),
        };
        log::trace!("building rule `{name}`");
        self.entries.insert(
            name.to_string(),
            Entry::Building {
                stub: Arc::clone(&stub),
                declared,
            },
        );
        Begin::Build(stub)
    }

    pub(crate) fn complete(
        &mut self,
        name: &str,
        stub: &Arc<CyclicStub>,
        rule: Rule,
    ) -> Result<Rule, GrammarError> {
        if let RuleNode::Cyclic(cyclic) = rule.node() {
            if std::ptr::eq(cyclic.stub(), stub.as_ref()) {
                self.abandon(name, Arc::clone(stub));
                return Err(GrammarError::CircularDefinition {
                    name: name.to_string(),
                });
            }
        }
        if stub.surrogate.set(rule.clone()).is_err() {
            self.abandon(name, Arc::clone(stub));
            return Err(GrammarError::DuplicateRule {
                name: name.to_string(),
            });
        }
        self.entries
            .insert(name.to_string(), Entry::Defined(rule.clone()));
        Ok(rule)
    }

    pub(crate) fn abandon(&mut self, name: &str, stub: Arc<CyclicStub>) {
        if let Some(Entry::Building { declared: true, .. }) = self.entries.get(name) {
            self.entries.insert(name.to_string(), Entry::Declared(stub));
        } else {
            self.entries.remove(name);
        }
    }
}
