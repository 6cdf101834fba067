use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::rule::{Begin, Rule, RuleCache};
use crate::terminal::{PatternCache, Terminal};

/// Collects the shared state needed while constructing a grammar: compiled
/// patterns and named (possibly recursive) rules.
///
/// ```
/// use ruleweave_engine::{GrammarBuilder, choice, literal, sequence};
///
/// let mut builder = GrammarBuilder::new();
/// let list = builder
///     .define("list", |b| {
///         let item = b.pattern("[a-z]+")?.parse_as("item");
///         let nested = b.declare("list");
///         let element = choice([item, nested]);
///         let tail = sequence([literal(","), element.clone()]).zero_or_more();
///         Ok(sequence([literal("["), element, tail, literal("]")]).parse_as("list"))
///     })
///     .unwrap();
/// let grammar = builder.finish([list]).unwrap();
///
/// let outcome = grammar.parse("[a,[b,c]]");
/// assert!(outcome.is_success());
/// ```
#[derive(Default)]
pub struct GrammarBuilder {
    patterns: PatternCache,
    rules: RuleCache,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule matching the regular expression `pattern` at the cursor.
    pub fn pattern(&mut self, pattern: &str) -> Result<Rule, GrammarError> {
        Ok(Rule::terminal(Terminal::pattern(pattern, &mut self.patterns)?))
    }

    /// See [`RuleCache::define`].
    pub fn define<F>(&mut self, name: &str, build: F) -> Result<Rule, GrammarError>
    where
        F: FnOnce(&mut Self) -> Result<Rule, GrammarError>,
    {
        let stub = match self.rules.begin(name) {
            Begin::Ready(rule) => return Ok(rule),
            Begin::Build(stub) => stub,
        };
        match build(self) {
            Ok(rule) => self.rules.complete(name, &stub, rule),
            Err(err) => {
                self.rules.abandon(name, stub);
                Err(err)
            }
        }
    }

    /// See [`RuleCache::declare`].
    pub fn declare(&mut self, name: &str) -> Rule {
        self.rules.declare(name)
    }

    /// See [`RuleCache::assign`].
    pub fn assign(&mut self, name: &str, rule: Rule) -> Result<Rule, GrammarError> {
        self.rules.assign(name, rule)
    }

    pub fn rule(&self, name: &str) -> Option<Rule> {
        self.rules.get(name)
    }

    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    /// Builds a grammar from the top-level `rules`, failing if any rule was
    /// referenced but never defined.
    pub fn finish(self, rules: impl IntoIterator<Item = Rule>) -> Result<Grammar, GrammarError> {
        if let Some(name) = self.rules.unresolved().into_iter().next() {
            return Err(GrammarError::UnresolvedRule { name });
        }
        log::debug!("grammar built with {} compiled pattern(s)", self.patterns.len());
        Ok(Grammar::new(rules))
    }
}
