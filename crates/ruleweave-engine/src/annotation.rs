use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Labels a rule can be annotated with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Annotation {
    /// Replaces the generic failure message.
    Error,
    /// The node is matched but left out of the tree.
    Void,
    /// The node is replaced by its children.
    Transient,
    /// Hint for tree decoders: keep the node even when it is empty.
    Pinned,
    /// Hint for tree decoders: the type to decode the node into.
    Type,
    /// A failure of the rule aborts the whole parse.
    Fatal,
    Custom(String),
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Error => f.write_str("error"),
            Annotation::Void => f.write_str("void"),
            Annotation::Transient => f.write_str("transient"),
            Annotation::Pinned => f.write_str("pinned"),
            Annotation::Type => f.write_str("type"),
            Annotation::Fatal => f.write_str("fatal"),
            Annotation::Custom(label) => f.write_str(label),
        }
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    String(String),
    Bool(bool),
    Int(i64),
    Set,
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::String(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Int(value)
    }
}

/// Annotations attached to a rule and copied onto the nodes it creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<Annotation, AnnotationValue>);

impl Annotations {
    pub const fn new() -> Self {
        Annotations(BTreeMap::new())
    }

    pub fn with(mut self, annotation: Annotation, value: impl Into<AnnotationValue>) -> Self {
        self.insert(annotation, value);
        self
    }

    pub fn insert(&mut self, annotation: Annotation, value: impl Into<AnnotationValue>) {
        self.0.insert(annotation, value.into());
    }

    pub fn get(&self, annotation: &Annotation) -> Option<&AnnotationValue> {
        self.0.get(annotation)
    }

    /// True when the annotation is present and not explicitly `false`.
    pub fn is_set(&self, annotation: &Annotation) -> bool {
        !matches!(
            self.get(annotation),
            None | Some(AnnotationValue::Bool(false))
        )
    }

    /// The custom `error` message, if one was given.
    pub fn error_message(&self) -> Option<&str> {
        match self.get(&Annotation::Error) {
            Some(AnnotationValue::String(message)) => Some(message),
            _ => None,
        }
    }

    /// `self` with every entry of `other` laid over it.
    pub fn merged(&self, other: &Annotations) -> Annotations {
        let mut merged = self.clone();
        merged
            .0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Annotation, &AnnotationValue)> {
        self.0.iter()
    }
}

impl FromIterator<(Annotation, AnnotationValue)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (Annotation, AnnotationValue)>>(iter: I) -> Self {
        Annotations(iter.into_iter().collect())
    }
}

impl fmt::Display for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (label, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match value {
                AnnotationValue::Set => write!(f, "@{label}")?,
                AnnotationValue::String(s) => write!(f, "@{label}({s:?})")?,
                AnnotationValue::Bool(b) => write!(f, "@{label}({b})")?,
                AnnotationValue::Int(n) => write!(f, "@{label}({n})")?,
            }
        }
        Ok(())
    }
}
