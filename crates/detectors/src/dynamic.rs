//! Dangerous dynamic execution and unvalidated input acquisition.

use crate::{Detector, Finding, Severity};
use ir::SyntaxTree;
use std::path::Path;

/// Flags direct calls to code-evaluation primitives and raw `input()`
/// acquisition.
pub struct DynamicExecDetector {
    eval_severity: Severity,
}

impl DynamicExecDetector {
    pub fn new(severity: Option<Severity>) -> Self {
        Self {
            eval_severity: severity.unwrap_or(Severity::High),
        }
    }
}

impl Detector for DynamicExecDetector {
    fn name(&self) -> &'static str {
        "input"
    }

    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in tree.walk() {
            if !node.is_plain_call() {
                continue;
            }
            match node.call_method() {
                Some(name @ ("eval" | "exec")) => {
                    findings.push(
                        Finding::builder("input", "Dangerous Function", self.eval_severity)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                format!("{name}() can execute arbitrary code"),
                                format!("Avoid {name}() with untrusted input"),
                            ),
                    );
                }
                Some("input") => {
                    findings.push(
                        Finding::builder("input", "Input Validation", Severity::Medium)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                "input() used without validation",
                                "Validate all user input before use",
                            ),
                    );
                }
                _ => {}
            }
        }
        findings
    }
}
