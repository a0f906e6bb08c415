use crate::Node;

const INDENT_STEP: &str = "  ";

/// Renders a materialized tree as one line per node, for diffs in tests and
/// debug logging.
///
/// Every attribute is printed (snapshots keep them sorted). Whitespace-only
/// text nodes are skipped; other text is shown trimmed with newlines escaped.
pub fn outline(root: &Node) -> Vec<String> {
    fn walk(node: &Node, depth: usize, out: &mut Vec<String>) {
        let indent = INDENT_STEP.repeat(depth);
        match node {
            Node::Document { children } => {
                out.push(format!("{indent}#document"));
                for c in children {
                    walk(c, depth + 1, out);
                }
            }
            Node::Fragment { children } => {
                out.push(format!("{indent}#fragment"));
                for c in children {
                    walk(c, depth + 1, out);
                }
            }
            Node::Element {
                name,
                attributes,
                children,
            } => {
                let mut line = String::with_capacity(indent.len() + 64);
                line.push_str(&indent);
                line.push('<');
                line.push_str(name);
                for (k, v) in attributes {
                    line.push(' ');
                    line.push_str(k);
                    line.push_str("=\"");
                    line.push_str(v);
                    line.push('"');
                }
                line.push('>');
                out.push(line);
                for c in children {
                    walk(c, depth + 1, out);
                }
            }
            Node::Text { text } => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(format!("{indent}\"{}\"", trimmed.replace('\n', "\\n")));
                }
            }
            Node::Comment { text } => {
                out.push(format!("{indent}<!-- {} -->", text.replace('\n', " ")));
            }
        }
    }

    let mut out = Vec::new();
    walk(root, 0, &mut out);
    out
}
