//! Graphviz rendering of a typed program.

use super::{Node, Program};

impl Program {
    /// One record per node (title plus one field per pin), one edge per
    /// arrow from its pin port, labelled with the morphism text.
    pub fn to_dot(&self) -> String {
        let mut lines: Vec<String> = vec![
            "digraph program {".to_string(),
            "  rankdir=TB;".to_string(),
            "  node [shape=record fontname=\"Helvetica\" fontsize=10];".to_string(),
            "  edge [fontname=\"Helvetica\" fontsize=9];".to_string(),
        ];

        for (id, node) in self.nodes() {
            lines.push(format!("  {id} [label=\"{}\"];", node_label(node)));
        }

        for (_, arrow) in self.arrows() {
            lines.push(format!(
                "  {}:p{} -> {} [label=\"{}\"];",
                arrow.source.node,
                arrow.source.pin,
                arrow.target,
                arrow.text.replace('\\', "\\\\").replace('"', "\\\"")
            ));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

fn node_label(node: &Node) -> String {
    let title = escape(&node.title());
    if node.pins.is_empty() {
        return format!("{{{title}}}");
    }
    let pins = node
        .pins
        .iter()
        .enumerate()
        .map(|(index, pin)| format!("<p{index}> {}", escape(&pin.brancher.to_string())))
        .collect::<Vec<_>>()
        .join("|");
    format!("{{{title}|{{{pins}}}}}")
}

/// Record labels reserve braces, bars and angle brackets.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '"' | '{' | '}' | '|' | '<' | '>' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("?< 2"), "?\\< 2");
        assert_eq!(escape("\"s\""), "\\\"s\\\"");
    }
}
