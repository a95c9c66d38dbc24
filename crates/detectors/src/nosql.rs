//! NoSQL query-operator detection.

use crate::{Detector, Finding, Severity};
use ir::{NodeKind, SyntaxTree};
use std::path::Path;

/// Operators that evaluate arbitrary expressions server-side.
const EXPRESSION_OPERATORS: [&str; 2] = ["$where", "$expr"];

/// Flags NoSQL operators that accept arbitrary expressions and
/// server-side `db.eval` execution.
pub struct NoSqlDetector {
    severity: Severity,
}

impl NoSqlDetector {
    pub fn new(severity: Option<Severity>) -> Self {
        Self {
            severity: severity.unwrap_or(Severity::High),
        }
    }
}

impl Detector for NoSqlDetector {
    fn name(&self) -> &'static str {
        "nosql"
    }

    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in tree.walk() {
            match &node.kind {
                NodeKind::Dict(entries) => {
                    for (key, _) in entries {
                        let Some(op) = key.as_string_literal() else {
                            continue;
                        };
                        if EXPRESSION_OPERATORS.contains(&op) {
                            findings.push(
                                Finding::builder("nosql", "NoSQL Injection", self.severity)
                                    .snippet(node.excerpt.clone())
                                    .emit(
                                        file,
                                        key.line,
                                        format!("Query operator '{op}' evaluates arbitrary expressions"),
                                        "Express the filter with standard query operators",
                                    ),
                            );
                        }
                    }
                }
                NodeKind::Call { callee, .. }
                    if node.call_method() == Some("eval")
                        && (callee == "db.eval" || callee.ends_with(".db.eval")) =>
                {
                    findings.push(
                        Finding::builder("nosql", "Server-Side Execution", Severity::Critical)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                "db.eval() runs JavaScript on the database server",
                                "Remove server-side eval; use aggregation pipelines",
                            ),
                    );
                }
                _ => {}
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsers::parse_python;

    fn scan(src: &str) -> Vec<Finding> {
        let tree = parse_python(src).unwrap();
        NoSqlDetector::new(None).inspect(&tree, Path::new("test.py"))
    }

    #[test]
    fn where_operator_is_high() {
        let findings = scan("users = db.users.find({\"$where\": \"this.age > 18\"})\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "NoSQL Injection");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn expr_operator_is_high() {
        let findings = scan("docs = coll.find({\"$expr\": {\"$gt\": [\"$spent\", \"$budget\"]}})\n");
        assert!(findings
            .iter()
            .any(|f| f.kind == "NoSQL Injection"));
    }

    #[test]
    fn comparison_operators_are_clean() {
        assert!(scan("docs = coll.find({\"age\": {\"$gt\": 18}})\n").is_empty());
    }

    #[test]
    fn db_eval_is_critical() {
        let findings = scan("result = db.eval(\"function() { return 1; }\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "Server-Side Execution");
        assert_eq!(findings[0].severity, Severity::Critical);
    }
}
