use serde::Serialize;

use crate::annotation::Annotations;
use crate::span::Span;
use crate::token::Token;

/// A node of the syntax tree, created for every successful structural match.
///
/// Nodes store spans rather than copied text; pass the parsed source to
/// [`matched`](Node::matched) to recover the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    token: Token,
    span: Span,
    #[serde(skip_serializing_if = "Annotations::is_empty")]
    annotations: Annotations,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    pub fn new(token: Token, span: Span, annotations: Annotations, children: Vec<Node>) -> Self {
        Self {
            token,
            span,
            annotations,
            children,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// First direct child produced by the token called `name`.
    pub fn child_named(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.token.name() == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.token.name() == name)
    }

    /// The text this node matched in `source`.
    pub fn matched<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }

    /// This node and all of its descendants, in pre-order.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Indented dump of the tree, one node per line. Leaves show their text.
    pub fn pretty(&self, source: &str) -> String {
        let mut out = String::new();
        self.write_pretty(source, 0, &mut out);
        out
    }

    fn write_pretty(&self, source: &str, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{}@{}", self.token, self.span));
        if self.is_leaf() {
            out.push_str(&format!(" {:?}", self.matched(source)));
        }
        out.push('\n');
        for child in &self.children {
            child.write_pretty(source, depth + 1, out);
        }
    }
}
