//! Primitive matchers: literal text, character classes and regular
//! expressions. Each one tests the input at the cursor, advancing it on
//! success.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use regex::Regex;

use crate::cursor::Cursor;
use crate::error::{GrammarError, ParseError};

/// A set of characters, matched one character at a time.
#[derive(Clone)]
pub enum CharacterClass {
    Digits,
    HexDigits,
    Letters,
    Alphanumerics,
    /// Horizontal whitespace (no line breaks).
    Whitespace,
    Newlines,
    WhitespacesAndNewlines,
    Punctuation,
    Set(Arc<[char]>),
    Range(RangeInclusive<char>),
    Union(Arc<[CharacterClass]>),
    Predicate {
        name: Arc<str>,
        test: Arc<dyn Fn(char) -> bool + Send + Sync>,
    },
}

impl CharacterClass {
    /// A class of exactly the characters in `chars`.
    pub fn set(chars: &str) -> Self {
        CharacterClass::Set(chars.chars().collect())
    }

    pub fn range(range: RangeInclusive<char>) -> Self {
        CharacterClass::Range(range)
    }

    pub fn union(classes: impl IntoIterator<Item = CharacterClass>) -> Self {
        CharacterClass::Union(classes.into_iter().collect())
    }

    /// A class defined by an arbitrary test; `name` is used in messages.
    pub fn predicate(
        name: impl Into<Arc<str>>,
        test: impl Fn(char) -> bool + Send + Sync + 'static,
    ) -> Self {
        CharacterClass::Predicate {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        match self {
            CharacterClass::Digits => c.is_ascii_digit(),
            CharacterClass::HexDigits => c.is_ascii_hexdigit(),
            CharacterClass::Letters => c.is_alphabetic(),
            CharacterClass::Alphanumerics => c.is_alphanumeric(),
            CharacterClass::Whitespace => c.is_whitespace() && !is_newline(c),
            CharacterClass::Newlines => is_newline(c),
            CharacterClass::WhitespacesAndNewlines => c.is_whitespace(),
            CharacterClass::Punctuation => c.is_ascii_punctuation(),
            CharacterClass::Set(chars) => chars.contains(&c),
            CharacterClass::Range(range) => range.contains(&c),
            CharacterClass::Union(classes) => classes.iter().any(|class| class.contains(c)),
            CharacterClass::Predicate { test, .. } => test(c),
        }
    }
}

fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterClass::Digits => f.write_str("digits"),
            CharacterClass::HexDigits => f.write_str("hexDigits"),
            CharacterClass::Letters => f.write_str("letters"),
            CharacterClass::Alphanumerics => f.write_str("alphanumerics"),
            CharacterClass::Whitespace => f.write_str("whitespaces"),
            CharacterClass::Newlines => f.write_str("newlines"),
            CharacterClass::WhitespacesAndNewlines => f.write_str("whitespacesAndNewlines"),
            CharacterClass::Punctuation => f.write_str("punctuation"),
            CharacterClass::Set(chars) => {
                let text: String = chars.iter().collect();
                write!(f, "[{text:?}]")
            }
            CharacterClass::Range(range) => write!(f, "{:?}...{:?}", range.start(), range.end()),
            CharacterClass::Union(classes) => {
                for (i, class) in classes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{class}")?;
                }
                Ok(())
            }
            CharacterClass::Predicate { name, .. } => f.write_str(name),
        }
    }
}

impl fmt::Debug for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharacterClass({self})")
    }
}

/// A primitive matcher.
#[derive(Clone)]
pub enum Terminal {
    Literal(Arc<str>),
    Class(CharacterClass),
    Pattern { source: Arc<str>, regex: Regex },
}

impl Terminal {
    pub fn literal(text: &str) -> Result<Self, GrammarError> {
        if text.is_empty() {
            return Err(GrammarError::EmptyLiteral);
        }
        Ok(Terminal::Literal(text.into()))
    }

    pub fn class(class: CharacterClass) -> Self {
        Terminal::Class(class)
    }

    /// Compiles `pattern` through `cache`, anchored at the cursor.
    pub fn pattern(pattern: &str, cache: &mut PatternCache) -> Result<Self, GrammarError> {
        Ok(Terminal::Pattern {
            source: pattern.into(),
            regex: cache.compile(pattern)?,
        })
    }

    /// Attempts to match at the cursor, advancing past the match on success.
    /// The cursor does not move on failure.
    pub fn test(&self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        let matched = match self {
            Terminal::Literal(text) => cursor
                .remaining()
                .starts_with(&**text)
                .then_some(text.len()),
            Terminal::Class(class) => cursor
                .peek()
                .filter(|c| class.contains(*c))
                .map(char::len_utf8),
            Terminal::Pattern { regex, .. } => regex.find(cursor.remaining()).map(|m| m.end()),
        };
        match matched {
            Some(len) => {
                cursor.advance_by(len);
                Ok(())
            }
            None => Err(ParseError::scanning(cursor.position(), self.to_string())),
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Literal(text) => write!(f, "{text:?}"),
            Terminal::Class(class) => write!(f, "{class}"),
            Terminal::Pattern { source, .. } => write!(f, "/{source}/"),
        }
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Terminal({self})")
    }
}

/// Compiled regular expressions keyed by pattern text.
///
/// Compilation is expensive and compiled expressions are stateless, so every
/// terminal built from the same pattern shares one `Regex`.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&mut self, pattern: &str) -> Result<Regex, GrammarError> {
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&format!(r"\A(?:{pattern})")).map_err(|source| {
            GrammarError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        log::trace!("compiled pattern /{pattern}/");
        self.compiled.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
