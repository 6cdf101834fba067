use ruleweave_engine::{Node, ParseError};

/// Indented tree dump, one node per line. Leaves show their text.
pub fn tree(node: &Node, source: &str, show_spans: bool) -> String {
    if show_spans {
        return node.pretty(source);
    }
    let mut out = String::new();
    write_tree(node, source, 0, &mut out);
    out
}

fn write_tree(node: &Node, source: &str, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&line(node, source, false));
    out.push('\n');
    for child in node.children() {
        write_tree(child, source, depth + 1, out);
    }
}

/// Single-line summary of a node, used for streamed output.
pub fn line(node: &Node, source: &str, show_spans: bool) -> String {
    let mut out = node.token().to_string();
    if show_spans {
        out.push_str(&format!("@{}", node.span()));
    }
    if node.is_leaf() {
        out.push_str(&format!(" {:?}", node.matched(source)));
    }
    out
}

/// `origin:line:column: message`, followed by the most specific cause when it
/// differs from the error itself.
pub fn error(err: &ParseError, source: &str, origin: &str) -> String {
    let (line, column) = err.location(source);
    let mut out = format!("{origin}:{line}:{column}: error: {err}");
    let deepest = err.deepest();
    if deepest != err {
        let (line, column) = deepest.location(source);
        out.push_str(&format!("\n  caused by {origin}:{line}:{column}: {deepest}"));
    }
    out
}
