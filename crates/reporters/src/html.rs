//! Self-contained HTML report.

use crate::{severity_counts, ScanInfo};
use detectors::{Finding, Severity};

fn severity_color(sev: Severity) -> &'static str {
    match sev {
        Severity::Info => "#17a2b8",
        Severity::Low => "#28a745",
        Severity::Medium => "#ffc107",
        Severity::High => "#dc3545",
        Severity::Critical => "#721c24",
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub(crate) fn render(findings: &[Finding], info: Option<&ScanInfo>) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>dbsentry security report</title>\n<style>\n\
         body { font-family: sans-serif; margin: 2em; background: #f8f9fa; }\n\
         h1 { color: #343a40; }\n\
         table { border-collapse: collapse; width: 100%; background: #fff; }\n\
         th, td { border: 1px solid #dee2e6; padding: 8px; text-align: left; vertical-align: top; }\n\
         th { background: #343a40; color: #fff; }\n\
         code { background: #f1f3f5; padding: 2px 4px; }\n\
         .sev { color: #fff; padding: 2px 8px; border-radius: 3px; font-weight: bold; }\n\
         </style>\n</head>\n<body>\n<h1>dbsentry security report</h1>\n",
    );

    if let Some(info) = info {
        page.push_str(&format!(
            "<p>{} file(s) analyzed, {} skipped, {} finding(s), {}ms</p>\n",
            info.files_scanned,
            info.files_skipped,
            findings.len(),
            info.duration_ms
        ));
    }

    if findings.is_empty() {
        page.push_str("<p>No issues found.</p>\n");
    } else {
        page.push_str("<ul>\n");
        for (sev, count) in severity_counts(findings) {
            page.push_str(&format!(
                "<li><span class=\"sev\" style=\"background:{}\">{sev}</span> {count}</li>\n",
                severity_color(sev)
            ));
        }
        page.push_str("</ul>\n");

        page.push_str(
            "<table>\n<tr><th>Severity</th><th>Type</th><th>Location</th><th>Message</th><th>Code</th><th>Remediation</th></tr>\n",
        );
        for f in findings {
            page.push_str(&format!(
                "<tr><td><span class=\"sev\" style=\"background:{}\">{}</span></td><td>{}</td><td>{}:{}</td><td>{}</td><td><code>{}</code></td><td>{}</td></tr>\n",
                severity_color(f.severity),
                f.severity,
                escape(&f.kind),
                escape(&f.file.display().to_string()),
                f.line,
                escape(&f.message),
                escape(f.snippet.as_deref().unwrap_or("")),
                escape(&f.remediation),
            ));
        }
        page.push_str("</table>\n");
    }

    page.push_str("</body>\n</html>\n");
    page
}
