use crate::{BinaryOp, NodeKind, SyntaxNode, SyntaxTree};

fn str_node(line: usize, s: &str) -> SyntaxNode {
    SyntaxNode::new(line, format!("\"{s}\""), NodeKind::StringLiteral(s.into()))
}

#[test]
fn walk_yields_nested_nodes_depth_first() {
    let concat = SyntaxNode::new(
        2,
        "\"SELECT \" + name",
        NodeKind::BinaryOp {
            op: BinaryOp::Add,
            left: Box::new(str_node(2, "SELECT ")),
            right: Box::new(SyntaxNode::new(2, "name", NodeKind::Identifier("name".into()))),
        },
    );
    let call = SyntaxNode::new(
        2,
        "cursor.execute(\"SELECT \" + name)",
        NodeKind::Call {
            callee: "cursor.execute".into(),
            args: vec![concat],
        },
    );
    let tree = SyntaxTree::new(vec![call]);

    let kinds: Vec<&NodeKind> = tree.walk().map(|n| &n.kind).collect();
    assert_eq!(kinds.len(), 4);
    assert!(matches!(kinds[0], NodeKind::Call { .. }));
    assert!(matches!(kinds[1], NodeKind::BinaryOp { .. }));
    assert!(matches!(kinds[2], NodeKind::StringLiteral(_)));
    assert!(matches!(kinds[3], NodeKind::Identifier(_)));
}

#[test]
fn walk_descends_into_dict_entries() {
    let dict = SyntaxNode::new(
        1,
        "{\"$where\": expr}",
        NodeKind::Dict(vec![(
            str_node(1, "$where"),
            SyntaxNode::new(1, "expr", NodeKind::Identifier("expr".into())),
        )]),
    );
    let tree = SyntaxTree::new(vec![dict]);
    assert!(tree
        .walk()
        .any(|n| n.as_string_literal() == Some("$where")));
}

#[test]
fn call_method_returns_last_segment() {
    let call = SyntaxNode::new(
        1,
        "session.connection.execute(q)",
        NodeKind::Call {
            callee: "session.connection.execute".into(),
            args: vec![],
        },
    );
    assert_eq!(call.call_method(), Some("execute"));
    assert!(!call.is_plain_call());

    let plain = SyntaxNode::new(1, "eval(x)", NodeKind::Call { callee: "eval".into(), args: vec![] });
    assert_eq!(plain.call_method(), Some("eval"));
    assert!(plain.is_plain_call());
}

#[test]
fn empty_tree_walks_nothing() {
    let tree = SyntaxTree::default();
    assert!(tree.is_empty());
    assert_eq!(tree.walk().count(), 0);
}
