//! Database connection hygiene checks.

use crate::{Detector, Finding, Severity};
use ir::{NodeKind, SyntaxTree};
use regex::Regex;
use std::path::Path;

const DB_MODULES: [&str; 7] = [
    "sqlite3",
    "psycopg2",
    "mysql.connector",
    "pymysql",
    "sqlalchemy",
    "redis",
    "pymongo",
];

/// Redis administrative commands with scan-wide blast radius.
const REDIS_ADMIN_METHODS: [&str; 5] = ["eval", "config_set", "config_get", "flushall", "flushdb"];

/// Flags ephemeral database targets, unencrypted connection settings,
/// dangerous bulk-load statements and administrative cache commands.
pub struct ConnectionHygieneDetector {
    unencrypted_re: Regex,
    plain_scheme_re: Regex,
    bulk_load_re: Regex,
    copy_from_re: Regex,
    ephemeral_severity: Severity,
}

impl ConnectionHygieneDetector {
    pub fn new(severity: Option<Severity>) -> Self {
        Self {
            unencrypted_re: Regex::new(
                r"(?i)(sslmode\s*=\s*disable|use_?ssl\s*=\s*(false|0)|ssl\s*=\s*false|ssl_disabled\s*=\s*true)",
            )
            .expect("valid unencrypted regex"),
            plain_scheme_re: Regex::new(r"(?i)^(mysql|postgres|postgresql)://")
                .expect("valid scheme regex"),
            bulk_load_re: Regex::new(r"(?i)\bLOAD\s+DATA\s+(LOCAL\s+)?INFILE\b")
                .expect("valid bulk load regex"),
            copy_from_re: Regex::new(r"(?i)\bCOPY\s+\S+\s+FROM\b").expect("valid copy regex"),
            ephemeral_severity: severity.unwrap_or(Severity::Low),
        }
    }

    fn check_connect_arg(&self, value: &str, node: &ir::SyntaxNode, file: &Path, out: &mut Vec<Finding>) {
        if value == ":memory:" || value.starts_with("/tmp/") || value.contains("mode=memory") {
            out.push(
                Finding::builder("db", "Database Security", self.ephemeral_severity)
                    .snippet(node.excerpt.clone())
                    .emit(
                        file,
                        node.line,
                        "In-memory or temporary database target; data is not durable",
                        "Use a file-based database with controlled permissions in production",
                    ),
            );
            return;
        }
        if self.unencrypted_re.is_match(value)
            || (self.plain_scheme_re.is_match(value) && !value.contains("sslmode="))
        {
            out.push(
                Finding::builder("db", "Database Security", Severity::Medium)
                    .snippet(node.excerpt.clone())
                    .emit(
                        file,
                        node.line,
                        "Connection configured without transport encryption",
                        "Enable TLS (sslmode=require or equivalent) for database connections",
                    ),
            );
        }
    }
}

impl Detector for ConnectionHygieneDetector {
    fn name(&self) -> &'static str {
        "db"
    }

    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding> {
        let mut findings = Vec::new();
        for node in tree.walk() {
            match &node.kind {
                NodeKind::Call { args, .. } if node.call_method() == Some("connect") => {
                    for value in args.iter().filter_map(|a| a.as_string_literal()) {
                        self.check_connect_arg(value, node, file, &mut findings);
                    }
                }
                NodeKind::Call { .. }
                    if !node.is_plain_call()
                        && node
                            .call_method()
                            .is_some_and(|m| REDIS_ADMIN_METHODS.contains(&m)) =>
                {
                    let method = node.call_method().unwrap_or_default();
                    findings.push(
                        Finding::builder("db", "Cache Administration", Severity::High)
                            .snippet(node.excerpt.clone())
                            .emit(
                                file,
                                node.line,
                                format!("Administrative cache command '{method}' reachable from application code"),
                                "Restrict administrative commands to operational tooling",
                            ),
                    );
                }
                NodeKind::Call { args, .. }
                    if !node.is_plain_call() && node.call_method() == Some("keys") =>
                {
                    // KEYS blocks the server; only flag the wildcard form.
                    if args
                        .iter()
                        .filter_map(|a| a.as_string_literal())
                        .any(|s| s.contains('*'))
                    {
                        findings.push(
                            Finding::builder("db", "Cache Performance", Severity::Medium)
                                .snippet(node.excerpt.clone())
                                .emit(
                                    file,
                                    node.line,
                                    "KEYS with a wildcard pattern scans the whole keyspace",
                                    "Use SCAN for incremental iteration",
                                ),
                        );
                    }
                }
                NodeKind::StringLiteral(text) => {
                    if self.bulk_load_re.is_match(text) {
                        findings.push(
                            Finding::builder("db", "Bulk Load", Severity::High)
                                .snippet(node.excerpt.clone())
                                .emit(
                                    file,
                                    node.line,
                                    "LOAD DATA INFILE reads server-side files",
                                    "Disable local infile and validate import paths",
                                ),
                        );
                    } else if self.copy_from_re.is_match(text) {
                        findings.push(
                            Finding::builder("db", "Bulk Load", Severity::High)
                                .snippet(node.excerpt.clone())
                                .emit(
                                    file,
                                    node.line,
                                    "COPY FROM ingests files with server privileges",
                                    "Restrict COPY to trusted, validated sources",
                                ),
                        );
                    }
                }
                NodeKind::Import { module } => {
                    if DB_MODULES
                        .iter()
                        .any(|m| module == m || module.starts_with(&format!("{m}.")))
                    {
                        findings.push(
                            Finding::builder("db", "Database Import", Severity::Info).emit(
                                file,
                                node.line,
                                format!("Database library '{module}' imported"),
                                "Ensure secure connection practices are followed",
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
        ConnectionHygieneDetector::new(None).inspect(&tree, Path::new("test.py"))
    }

    #[test]
    fn memory_database_is_one_low_finding() {
        let findings = scan("conn = sqlite3.connect(\":memory:\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Low);
        assert_eq!(findings[0].kind, "Database Security");
    }

    #[test]
    fn file_database_is_clean() {
        assert!(scan("conn = sqlite3.connect(\"/data/prod.db\")\n").is_empty());
    }

    #[test]
    fn tmp_path_database_is_low() {
        let findings = scan("conn = sqlite3.connect(\"/tmp/scratch.db\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[test]
    fn disabled_ssl_is_medium() {
        let findings =
            scan("conn = psycopg2.connect(\"host=db dbname=app sslmode=disable\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn plain_scheme_url_without_tls_is_medium() {
        let findings = scan("engine = connect(\"mysql://root@db:3306/app\")\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn url_with_sslmode_is_clean() {
        assert!(scan("c = connect(\"postgresql://db/app?sslmode=require\")\n").is_empty());
    }

    #[test]
    fn bulk_load_statements_are_high() {
        let findings = scan(
            "cursor.execute(\"LOAD DATA INFILE '/tmp/d.csv' INTO TABLE users\")\ncursor.execute(\"COPY users FROM '/tmp/u.csv'\")\n",
        );
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == Severity::High));
    }

    #[test]
    fn redis_admin_commands_are_high_and_keys_medium() {
        let findings = scan("r.flushall()\nr.config_set(\"save\", \"\")\nr.keys(\"session:*\")\n");
        let high = findings
            .iter()
            .filter(|f| f.severity == Severity::High)
            .count();
        let medium = findings
            .iter()
            .filter(|f| f.severity == Severity::Medium)
            .count();
        assert_eq!(high, 2);
        assert_eq!(medium, 1);
    }

    #[test]
    fn keys_with_exact_name_is_clean() {
        assert!(scan("r.keys(\"session:abc\")\n").is_empty());
    }

    #[test]
    fn database_imports_are_info_notes() {
        let findings = scan("import sqlite3\nimport os\nfrom sqlalchemy import create_engine\n");
        let imports: Vec<_> = findings
            .iter()
            .filter(|f| f.kind == "Database Import")
            .collect();
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().all(|f| f.severity == Severity::Info));
    }
}
