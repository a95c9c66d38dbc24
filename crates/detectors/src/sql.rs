//! SQL injection detection.

use crate::{Detector, Finding, Severity};
use ir::{NodeKind, SyntaxTree};
use regex::Regex;
use std::path::Path;

const EXECUTE_METHODS: [&str; 2] = ["execute", "executemany"];

const PARAMETERIZE: &str = "Use parameterized queries";

/// Flags execution-style calls fed by string concatenation, keyword-bearing
/// concatenation outside calls, and textual dynamic-SQL patterns.
pub struct SqlInjectionDetector {
    keyword_re: Regex,
    dynamic_exec_re: Regex,
    extended_proc_re: Regex,
    execute_severity: Severity,
}

impl SqlInjectionDetector {
    pub fn new(severity: Option<Severity>) -> Self {
        Self {
            // CQL shares the core keyword set; ALLOW FILTERING / USING TTL
            // catch concatenated CQL that carries none of the SQL verbs.
            keyword_re: Regex::new(
                r"(?i)\b(SELECT|INSERT|UPDATE|DELETE|WHERE|ALLOW\s+FILTERING|USING\s+TTL)\b",
            )
            .expect("valid keyword regex"),
            dynamic_exec_re: Regex::new(r"(?i)\b(EXEC|EXECUTE)\s*\(").expect("valid exec regex"),
            extended_proc_re: Regex::new(r"(?i)\b(xp_cmdshell|sp_OACreate)\b")
                .expect("valid extended procedure regex"),
            execute_severity: severity.unwrap_or(Severity::High),
        }
    }
}

impl Detector for SqlInjectionDetector {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in tree.walk() {
            match &node.kind {
                NodeKind::Call { args, .. }
                    if node
                        .call_method()
                        .is_some_and(|m| EXECUTE_METHODS.contains(&m)) =>
                {
                    if args.first().is_some_and(|a| a.is_concat()) {
                        findings.push(
                            Finding::builder("sql", "SQL Injection", self.execute_severity)
                                .snippet(node.excerpt.clone())
                                .emit(
                                    file,
                                    node.line,
                                    "String concatenation in SQL execute() call",
                                    PARAMETERIZE,
                                ),
                        );
                    }
                }
                NodeKind::Assignment { value, .. }
                    if value.is_concat() && self.keyword_re.is_match(&node.excerpt) =>
                {
                    findings.push(
                        Finding::builder("sql", "SQL Injection", Severity::Medium)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                "String concatenation that might build a SQL query",
                                PARAMETERIZE,
                            ),
                    );
                }
                NodeKind::StringLiteral(text) => {
                    if self.extended_proc_re.is_match(text) {
                        findings.push(
                            Finding::builder(
                                "sql",
                                "SQL Server Extended Procedure",
                                Severity::Critical,
                            )
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                "Extended stored procedure grants OS-level access",
                                "Disable xp_cmdshell/sp_OACreate and use least-privilege accounts",
                            ),
                        );
                    } else if self.dynamic_exec_re.is_match(text) {
                        findings.push(
                            Finding::builder("sql", "Dynamic SQL Execution", Severity::High)
                                .snippet(node.excerpt.clone())
                                .emit(
                                    file,
                                    node.line,
                                    "EXEC/EXECUTE builds SQL from a string at runtime",
                                    "Replace dynamic SQL with static statements or sp_executesql with parameters",
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
