//! ORM escape-hatch detection.

use crate::{Detector, Finding, Severity};
use ir::{NodeKind, SyntaxTree};
use std::path::Path;

/// Flags ORM raw-query escape hatches and ORM `execute()` calls fed by
/// string concatenation.
pub struct OrmDetector {
    severity: Severity,
}

impl OrmDetector {
    pub fn new(severity: Option<Severity>) -> Self {
        Self {
            severity: severity.unwrap_or(Severity::High),
        }
    }
}

impl Detector for OrmDetector {
    fn name(&self) -> &'static str {
        "orm"
    }

    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in tree.walk() {
            let NodeKind::Call { args, .. } = &node.kind else {
                continue;
            };
            match node.call_method() {
                Some("raw") if !node.is_plain_call() => {
                    findings.push(
                        Finding::builder("orm", "ORM Raw Query", self.severity)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                "raw() bypasses the ORM's query construction",
                                "Pass parameters separately: Model.objects.raw(sql, params)",
                            ),
                    );
                }
                Some("execute") if !node.is_plain_call() => {
                    if args.iter().any(|a| a.is_concat()) {
                        findings.push(
                            Finding::builder("orm", "ORM Injection", self.severity)
                                .snippet(node.excerpt.clone())
                                .emit(
                                    file,
                                    node.line,
                                    "String concatenation in ORM execute() call",
                                    "Use bound parameters with session.execute()",
                                ),
                        );
                    }
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
        OrmDetector::new(None).inspect(&tree, Path::new("test.py"))
    }

    #[test]
    fn django_raw_is_high() {
        let findings = scan("users = User.objects.raw(\"SELECT * FROM auth_user\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "ORM Raw Query");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn session_execute_with_concat_is_high() {
        let findings = scan("session.execute(\"SELECT * FROM t WHERE n = '\" + name + \"'\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, "ORM Injection");
    }

    #[test]
    fn parameterized_session_execute_is_clean() {
        assert!(scan("session.execute(text(\"SELECT * FROM t WHERE n = :n\"), {\"n\": n})\n")
            .is_empty());
    }

    #[test]
    fn plain_raw_function_is_ignored() {
        assert!(scan("raw(\"not an orm call\")\n").is_empty());
    }
}
