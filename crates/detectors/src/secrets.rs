//! Hardcoded credential detection.

use crate::{Detector, Finding, Severity};
use ir::{NodeKind, SyntaxTree};
use regex::Regex;
use std::path::Path;

/// Resolved parameters for [`SecretsDetector`].
#[derive(Debug, Clone)]
pub struct SecretsParams {
    /// Minimum value length before a name-pattern match is reported.
    pub min_secret_length: usize,
    /// Length above which a non-URL string literal is reported as
    /// suspicious.
    pub long_string_threshold: usize,
    /// Override for the name-pattern match severity.
    pub severity: Option<Severity>,
}

impl Default for SecretsParams {
    fn default() -> Self {
        Self {
            min_secret_length: 8,
            long_string_threshold: 20,
            severity: None,
        }
    }
}

/// Flags assignments whose target name matches credential naming patterns,
/// and long string literals that do not look like URLs.
pub struct SecretsDetector {
    name_patterns: Vec<(&'static str, Regex)>,
    min_secret_length: usize,
    long_string_threshold: usize,
    name_match_severity: Severity,
}

impl SecretsDetector {
    pub fn new(params: SecretsParams) -> Self {
        let table = [
            ("password", r"(?i)pass(word|wd|phrase)"),
            ("API key", r"(?i)api[_-]?key"),
            ("secret", r"(?i)secret([_-](key|token))?"),
            ("token", r"(?i)(access[_-]?|refresh[_-]?)token"),
        ];
        Self {
            name_patterns: table
                .into_iter()
                .map(|(label, pat)| (label, Regex::new(pat).expect("valid secret name regex")))
                .collect(),
            min_secret_length: params.min_secret_length,
            long_string_threshold: params.long_string_threshold,
            name_match_severity: params.severity.unwrap_or(Severity::High),
        }
    }
}

impl Detector for SecretsDetector {
    fn name(&self) -> &'static str {
        "secrets"
    }

    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in tree.walk() {
            let NodeKind::Assignment { target, value } = &node.kind else {
                continue;
            };
            let Some(literal) = value.as_string_literal() else {
                continue;
            };
            for (label, pattern) in &self.name_patterns {
                if pattern.is_match(target) && literal.chars().count() >= self.min_secret_length {
                    findings.push(
                        Finding::builder("secrets", "Hardcoded Secret", self.name_match_severity)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                format!("Hardcoded {label} found in variable '{target}'"),
                                "Use environment variables or a secret manager",
                            ),
                    );
                }
            }
            // Lower-confidence signal, kept for parity with the name rule.
            if literal.chars().count() > self.long_string_threshold
                && !literal.starts_with("http")
            {
                findings.push(
                    Finding::builder("secrets", "Suspicious String", Severity::Medium)
                        .snippet(node.excerpt.clone())
                        .emit(
                            file,
                            node.line,
                            "Long string literal that might be a secret",
                            "Review whether this value should be hardcoded",
                        ),
                );
            }
        }
        findings
    }
}
