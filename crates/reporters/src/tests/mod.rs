use crate::{write_findings, Format, ScanInfo};
use detectors::{Finding, Severity};
use std::path::Path;

fn sample_findings() -> Vec<Finding> {
    vec![
        Finding::builder("sql", "SQL Injection", Severity::High)
            .snippet("cursor.execute(\"SELECT \" + q)")
            .emit(
                Path::new("app.py"),
                12,
                "String concatenation in SQL execute() call",
                "Use parameterized queries",
            ),
        Finding::builder("db", "Database Security", Severity::Low).emit(
            Path::new("conn.py"),
            3,
            "In-memory or temporary database target; data is not durable",
            "Use a file-based database with controlled permissions in production",
        ),
    ]
}

fn info() -> ScanInfo {
    ScanInfo {
        detectors_loaded: 6,
        files_scanned: 2,
        files_skipped: 1,
        duration_ms: 42,
        cache_hits: 6,
        cache_misses: 6,
    }
}

fn render(findings: &[Finding], fmt: Format) -> String {
    let mut buf = Vec::new();
    write_findings(&mut buf, findings, fmt, Some(&info())).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn text_output_lists_location_and_remediation() {
    let out = render(&sample_findings(), Format::Text);
    assert!(out.contains("app.py:12"));
    assert!(out.contains("SQL Injection"));
    assert!(out.contains("Use parameterized queries"));
    assert!(out.contains("Total: 2"));
    assert!(out.contains("Files skipped             1"));
}

#[test]
fn text_output_without_findings_reports_clean() {
    let out = render(&[], Format::Text);
    assert!(out.contains("No issues found."));
}

#[test]
fn severity_colors_use_ansi_codes() {
    let out = render(&sample_findings(), Format::Text);
    assert!(out.contains("\x1b[31mHIGH\x1b[0m"));
    assert!(out.contains("\x1b[32mLOW\x1b[0m"));
}

#[test]
fn json_output_is_parseable_and_complete() {
    let out = render(&sample_findings(), Format::Json);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["metadata"]["tool"], "dbsentry");
    assert_eq!(value["metadata"]["total_findings"], 2);
    assert_eq!(value["metadata"]["files_scanned"], 2);
    let findings = value["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0]["severity"], "HIGH");
    assert_eq!(findings[0]["detector"], "sql");
    assert!(findings[0]["timestamp"].as_u64().unwrap() > 0);
}

#[test]
fn html_output_escapes_markup_in_snippets() {
    let findings = vec![Finding::builder("input", "Dangerous Function", Severity::High)
        .snippet("eval(\"<script>alert(1)</script>\")")
        .emit(Path::new("x.py"), 1, "eval() can execute arbitrary code", "Avoid eval()")];
    let out = render(&findings, Format::Html);
    assert!(out.contains("&lt;script&gt;"));
    assert!(!out.contains("<script>alert"));
    assert!(out.contains("<table>"));
}

#[test]
fn html_output_without_findings_reports_clean() {
    let out = render(&[], Format::Html);
    assert!(out.contains("No issues found."));
    assert!(out.starts_with("<!DOCTYPE html>"));
}
