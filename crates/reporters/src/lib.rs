//! Formatters for findings in text, JSON and HTML.
//! Provide human and tool-friendly output.

use detectors::{Finding, Severity};
use serde::Serialize;
use std::io::{self, Write};

mod html;

/// Returns the severity colored with simple ANSI codes.
/// Adds no external dependencies.
fn color_severity(sev: Severity) -> String {
    let (code, text) = match sev {
        Severity::Info => ("\x1b[36m", "INFO"),
        Severity::Low => ("\x1b[32m", "LOW"),
        Severity::Medium => ("\x1b[33m", "MEDIUM"),
        Severity::High => ("\x1b[31m", "HIGH"),
        Severity::Critical => ("\x1b[31m", "CRITICAL"),
    };
    format!("{code}{text}\x1b[0m")
}

fn simple_box(title: &str) -> String {
    let width = title.len() + 2;
    format!(
        "╭{}╮\n│ {} │\n╰{}╯\n",
        "─".repeat(width),
        title,
        "─".repeat(width)
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Supported formats for printing findings.
pub enum Format {
    /// Human-readable output in plain text.
    Text,
    /// JSON structure for integrations.
    Json,
    /// Self-contained HTML report.
    Html,
}

/// Scan-wide figures displayed next to the findings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanInfo {
    pub detectors_loaded: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub duration_ms: u64,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

#[derive(Serialize)]
struct ReportMetadata<'a> {
    tool: &'static str,
    version: &'static str,
    total_findings: usize,
    #[serde(flatten)]
    info: &'a ScanInfo,
}

#[derive(Serialize)]
/// Wrapper used when serialising to JSON.
struct FindingsOut<'a> {
    metadata: ReportMetadata<'a>,
    findings: &'a [Finding],
}

fn severity_counts(findings: &[Finding]) -> Vec<(Severity, usize)> {
    [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ]
    .into_iter()
    .map(|sev| (sev, findings.iter().filter(|f| f.severity == sev).count()))
    .filter(|(_, count)| *count > 0)
    .collect()
}

fn stats_block(info: &ScanInfo) -> String {
    let mut out = String::new();
    out.push_str(&simple_box("Scan Summary"));
    out.push_str(&format!(
        "    Files analyzed            {}\n",
        info.files_scanned
    ));
    out.push_str(&format!(
        "    Files skipped             {}\n",
        info.files_skipped
    ));
    out.push_str(&format!(
        "    Detectors                 {}\n",
        info.detectors_loaded
    ));
    out.push_str(&format!(
        "    Duration                  {}ms\n",
        info.duration_ms
    ));
    if info.cache_hits + info.cache_misses > 0 {
        let rate =
            info.cache_hits as f64 / (info.cache_hits + info.cache_misses) as f64 * 100.0;
        out.push_str(&format!(
            "    Cache                     {} hits / {} misses ({rate:.1}%)\n",
            info.cache_hits, info.cache_misses
        ));
    }
    out
}

/// Prints findings in the selected format.
///
/// # Example
/// ```
/// use reporters::{print_findings, Format, ScanInfo};
/// let info = ScanInfo {
///     detectors_loaded: 6,
///     files_scanned: 5,
///     ..ScanInfo::default()
/// };
/// print_findings(&[], Format::Text, Some(&info)).unwrap();
/// ```
pub fn print_findings(
    findings: &[Finding],
    fmt: Format,
    scan_info: Option<&ScanInfo>,
) -> io::Result<()> {
    let mut out = io::stdout();
    write_findings(&mut out, findings, fmt, scan_info)
}

/// Writes findings to a generic `Write`, used for tests and report files.
pub fn write_findings<W: Write>(
    out: &mut W,
    findings: &[Finding],
    fmt: Format,
    scan_info: Option<&ScanInfo>,
) -> io::Result<()> {
    match fmt {
        Format::Text => {
            if let Some(info) = scan_info {
                writeln!(out, "{}", stats_block(info))?;
            }
            if findings.is_empty() {
                writeln!(out, "{}", simple_box("Results"))?;
                writeln!(out, "No issues found.")?;
            } else {
                writeln!(out, "{}", simple_box("Results"))?;
                writeln!(out, "Found {} issue(s):\n", findings.len())?;
                for f in findings {
                    writeln!(
                        out,
                        "{} {}:{} {}",
                        color_severity(f.severity),
                        f.file.display(),
                        f.line,
                        f.kind
                    )?;
                    writeln!(out, "    {}", f.message)?;
                    if let Some(snippet) = &f.snippet {
                        writeln!(out, "    ↳  {}", snippet.trim())?;
                    }
                    writeln!(out, "    • Remediation: {}", f.remediation)?;
                    writeln!(out, "    • Detector: {}", f.detector)?;
                    writeln!(out)?;
                }
                for (sev, count) in severity_counts(findings) {
                    writeln!(out, "  {}: {count}", color_severity(sev))?;
                }
                writeln!(out, "Total: {}", findings.len())?;
            }
        }
        Format::Json => {
            let default_info = ScanInfo::default();
            let json = FindingsOut {
                metadata: ReportMetadata {
                    tool: "dbsentry",
                    version: env!("CARGO_PKG_VERSION"),
                    total_findings: findings.len(),
                    info: scan_info.unwrap_or(&default_info),
                },
                findings,
            };
            serde_json::to_writer_pretty(&mut *out, &json)?;
            writeln!(out)?;
        }
        Format::Html => {
            let page = html::render(findings, scan_info);
            out.write_all(page.as_bytes())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
