use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Identifier of a grammar symbol: what a structural rule says it produced.
///
/// Tokens are compared by name. Cloning is cheap (the name is shared), so
/// rules and nodes hold tokens by value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(Arc<str>);

impl Token {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Token(name.into())
    }

    /// The token used for the synthetic node wrapping a whole parse.
    pub fn root() -> Self {
        Token::new("root")
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(name: &str) -> Self {
        Token::new(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::new(name)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
