//! Converts Python source text into the dbsentry syntax tree.
//!
//! Parsing is all-or-nothing: a file with syntax errors yields a
//! [`ParseError`] and no tree, so detectors never see a partial parse.

use ir::SyntaxTree;
use std::fmt;
use std::path::Path;
use tracing::debug;

mod lower;

/// Malformed source. Carries the first offending line when the grammar
/// could localize it.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "syntax error at line {}: {}", self.line, self.message)
        } else {
            write!(f, "syntax error: {}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Returns the logical source type for a path, `None` for files the
/// scanner does not handle.
pub fn detect_type(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") => Some("python"),
        _ => None,
    }
}

/// Parses Python source into a [`SyntaxTree`].
///
/// Empty input is valid and produces an empty tree. Any syntax error
/// rejects the whole file.
pub fn parse_python(content: &str) -> Result<SyntaxTree, ParseError> {
    if content.trim().is_empty() {
        return Ok(SyntaxTree::default());
    }
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(tree_sitter_python::language())
        .expect("load python grammar");
    let Some(tree) = parser.parse(content, None) else {
        debug!("tree-sitter returned no tree");
        return Err(ParseError {
            line: 0,
            message: "parser produced no tree".into(),
        });
    };
    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(0);
        debug!(line, "python source contains syntax errors");
        return Err(ParseError {
            line,
            message: "malformed python source".into(),
        });
    }
    Ok(lower::lower_module(root, content))
}

fn first_error_line(node: tree_sitter::Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.has_error() {
            continue;
        }
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::{BinaryOp, NodeKind};

    fn parse(src: &str) -> SyntaxTree {
        parse_python(src).expect("valid source")
    }

    #[test]
    fn empty_source_yields_empty_tree() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn malformed_source_is_rejected_wholesale() {
        let err = parse_python("def broken(:\n    pass\n").unwrap_err();
        assert!(err.line >= 1);
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn lowers_attribute_call_with_concat_argument() {
        let tree = parse("cursor.execute(\"SELECT * FROM users WHERE id = \" + user_id)\n");
        let call = tree
            .walk()
            .find(|n| n.call_method() == Some("execute"))
            .expect("call node");
        let NodeKind::Call { callee, args } = &call.kind else {
            panic!("expected call");
        };
        assert_eq!(callee, "cursor.execute");
        assert_eq!(args.len(), 1);
        assert!(args[0].is_concat());
        assert_eq!(call.line, 1);
    }

    #[test]
    fn lowers_parameterized_call_without_concat() {
        let tree = parse("cursor.execute(\"SELECT * FROM users WHERE id = ?\", (user_id,))\n");
        let call = tree
            .walk()
            .find(|n| n.call_method() == Some("execute"))
            .expect("call node");
        let NodeKind::Call { args, .. } = &call.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(!args[0].is_concat());
        assert!(matches!(args[1].kind, NodeKind::Tuple(_)));
    }

    #[test]
    fn lowers_assignment_target_and_string_value() {
        let tree = parse("PASSWORD = \"hunter2hunter2\"\n");
        let assign = tree
            .walk()
            .find(|n| matches!(n.kind, NodeKind::Assignment { .. }))
            .expect("assignment");
        let NodeKind::Assignment { target, value } = &assign.kind else {
            panic!();
        };
        assert_eq!(target, "PASSWORD");
        assert_eq!(value.as_string_literal(), Some("hunter2hunter2"));
    }

    #[test]
    fn lowers_imports_one_node_per_module() {
        let tree = parse("import sqlite3, os\nfrom sqlalchemy import create_engine\n");
        let modules: Vec<String> = tree
            .walk()
            .filter_map(|n| match &n.kind {
                NodeKind::Import { module } => Some(module.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(modules, vec!["sqlite3", "os", "sqlalchemy"]);
    }

    #[test]
    fn nested_statements_stay_reachable() {
        let src = "def handler(request):\n    if request:\n        eval(request.body)\n";
        let tree = parse(src);
        let call = tree
            .walk()
            .find(|n| n.call_method() == Some("eval"))
            .expect("nested call");
        assert!(call.is_plain_call());
        assert_eq!(call.line, 3);
    }

    #[test]
    fn lowers_dict_keys_as_string_literals() {
        let tree = parse("users = db.users.find({\"$where\": \"this.age > 18\"})\n");
        assert!(tree
            .walk()
            .any(|n| n.as_string_literal() == Some("$where")));
    }

    #[test]
    fn string_prefixes_and_quotes_are_stripped() {
        let tree = parse("q = r\"abc\"\ns = '''tri\nple'''\n");
        let strings: Vec<&str> = tree.walk().filter_map(|n| n.as_string_literal()).collect();
        assert!(strings.contains(&"abc"));
        assert!(strings.contains(&"tri\nple"));
    }

    #[test]
    fn binary_operator_distinguishes_concat_from_arithmetic() {
        let tree = parse("a = \"x\" + y\nb = 1 * 2\n");
        let ops: Vec<BinaryOp> = tree
            .walk()
            .filter_map(|n| match n.kind {
                NodeKind::BinaryOp { op, .. } => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(ops, vec![BinaryOp::Add, BinaryOp::Mul]);
    }

    #[test]
    fn detect_type_recognizes_python_only() {
        assert_eq!(detect_type(Path::new("app/models.py")), Some("python"));
        assert_eq!(detect_type(Path::new("README.md")), None);
        assert_eq!(detect_type(Path::new("noext")), None);
    }
}
