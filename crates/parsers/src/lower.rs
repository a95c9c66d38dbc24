//! Lowering from the tree-sitter CST into [`ir`] nodes.
//!
//! Only the constructs the detectors inspect get dedicated kinds; every
//! other named node becomes a [`NodeKind::Block`] so nested statements
//! remain reachable through the walker.

use ir::{BinaryOp, NodeKind, SyntaxNode, SyntaxTree};
use tree_sitter::Node;

const EXCERPT_MAX: usize = 120;

pub(crate) fn lower_module(root: Node, src: &str) -> SyntaxTree {
    let mut roots = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if let Some(node) = lower(child, src) {
            roots.push(node);
        }
    }
    SyntaxTree::new(roots)
}

fn lower(node: Node, src: &str) -> Option<SyntaxNode> {
    match node.kind() {
        "comment" => None,
        "expression_statement" => {
            let mut kids = lower_named_children(node, src);
            match kids.len() {
                0 => None,
                1 => kids.pop(),
                _ => Some(make(node, src, NodeKind::Block(kids))),
            }
        }
        "call" => lower_call(node, src),
        "assignment" => lower_assignment(node, src),
        "binary_operator" => lower_binary(node, src),
        "string" => Some(make(
            node,
            src,
            NodeKind::StringLiteral(strip_string_quotes(text_of(node, src))),
        )),
        "concatenated_string" => {
            // Adjacent literals ("a" "b") are one logical string, not a `+`.
            let mut joined = String::new();
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                if part.kind() == "string" {
                    joined.push_str(&strip_string_quotes(text_of(part, src)));
                }
            }
            Some(make(node, src, NodeKind::StringLiteral(joined)))
        }
        "integer" | "float" => Some(make(node, src, NodeKind::Number)),
        "identifier" | "attribute" => Some(make(
            node,
            src,
            NodeKind::Identifier(text_of(node, src).to_string()),
        )),
        "tuple" => Some(make(
            node,
            src,
            NodeKind::Tuple(lower_named_children(node, src)),
        )),
        "dictionary" => lower_dictionary(node, src),
        "import_statement" | "import_from_statement" => lower_import(node, src),
        _ => {
            let kids = lower_named_children(node, src);
            if kids.is_empty() {
                None
            } else {
                Some(make(node, src, NodeKind::Block(kids)))
            }
        }
    }
}

fn lower_call(node: Node, src: &str) -> Option<SyntaxNode> {
    let callee = node
        .child_by_field_name("function")
        .map(|f| text_of(f, src).to_string())?;
    let mut args = Vec::new();
    if let Some(list) = node.child_by_field_name("arguments") {
        let mut cursor = list.walk();
        for arg in list.named_children(&mut cursor) {
            let lowered = if arg.kind() == "keyword_argument" {
                arg.child_by_field_name("value").and_then(|v| lower(v, src))
            } else {
                lower(arg, src)
            };
            if let Some(a) = lowered {
                args.push(a);
            }
        }
    }
    Some(make(node, src, NodeKind::Call { callee, args }))
}

fn lower_assignment(node: Node, src: &str) -> Option<SyntaxNode> {
    let target = node
        .child_by_field_name("left")
        .map(|l| text_of(l, src).to_string())?;
    // Annotation-only statements (`x: int`) have no right side.
    let value = node.child_by_field_name("right").and_then(|r| lower(r, src))?;
    Some(make(
        node,
        src,
        NodeKind::Assignment {
            target,
            value: Box::new(value),
        },
    ))
}

fn lower_binary(node: Node, src: &str) -> Option<SyntaxNode> {
    let op = node
        .child_by_field_name("operator")
        .map(|o| BinaryOp::from_token(text_of(o, src)))
        .unwrap_or(BinaryOp::Other);
    let left = node.child_by_field_name("left").and_then(|n| lower(n, src));
    let right = node.child_by_field_name("right").and_then(|n| lower(n, src));
    match (left, right) {
        (Some(left), Some(right)) => Some(make(
            node,
            src,
            NodeKind::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )),
        (l, r) => {
            let kids: Vec<SyntaxNode> = l.into_iter().chain(r).collect();
            if kids.is_empty() {
                None
            } else {
                Some(make(node, src, NodeKind::Block(kids)))
            }
        }
    }
}

fn lower_dictionary(node: Node, src: &str) -> Option<SyntaxNode> {
    let mut entries = Vec::new();
    let mut cursor = node.walk();
    for pair in node.named_children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let key = pair.child_by_field_name("key").and_then(|k| lower(k, src));
        let value = pair.child_by_field_name("value").and_then(|v| lower(v, src));
        if let (Some(key), Some(value)) = (key, value) {
            entries.push((key, value));
        }
    }
    Some(make(node, src, NodeKind::Dict(entries)))
}

fn lower_import(node: Node, src: &str) -> Option<SyntaxNode> {
    let mut modules = Vec::new();
    if node.kind() == "import_from_statement" {
        if let Some(name) = node.child_by_field_name("module_name") {
            modules.push(text_of(name, src).to_string());
        }
    } else {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "dotted_name" => modules.push(text_of(child, src).to_string()),
                "aliased_import" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        modules.push(text_of(name, src).to_string());
                    }
                }
                _ => {}
            }
        }
    }
    let mut nodes: Vec<SyntaxNode> = modules
        .into_iter()
        .map(|module| make(node, src, NodeKind::Import { module }))
        .collect();
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(make(node, src, NodeKind::Block(nodes))),
    }
}

fn lower_named_children(node: Node, src: &str) -> Vec<SyntaxNode> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(n) = lower(child, src) {
            out.push(n);
        }
    }
    out
}

fn make(node: Node, src: &str, kind: NodeKind) -> SyntaxNode {
    SyntaxNode::new(node.start_position().row + 1, excerpt_of(node, src), kind)
}

fn text_of<'a>(node: Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

fn excerpt_of(node: Node, src: &str) -> String {
    let text = text_of(node, src).trim();
    if text.chars().count() <= EXCERPT_MAX {
        return text.to_string();
    }
    let mut out: String = text.chars().take(EXCERPT_MAX).collect();
    out.push_str("...");
    out
}

fn strip_string_quotes(text: &str) -> String {
    let trimmed =
        text.trim_start_matches(|c: char| matches!(c, 'r' | 'R' | 'b' | 'B' | 'f' | 'F' | 'u' | 'U'));
    for quote in ["\"\"\"", "'''"] {
        if trimmed.len() >= 6 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[3..trimmed.len() - 3].to_string();
        }
    }
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}
