//! Per-file scan orchestration.

use crate::ScanError;
use detectors::{Detector, Finding, Registry};
use ir::SyntaxTree;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Result of scanning one file with every registered detector.
#[derive(Debug, Default)]
pub struct FileScan {
    pub findings: Vec<Finding>,
    /// Read or parse failure, recorded separately from findings.
    pub error: Option<ScanError>,
}

/// Runs detectors over single files. Pure function of
/// (path, current file bytes, registry); holds no scan state.
pub struct Orchestrator<'a> {
    registry: &'a Registry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Reads and parses `path` once, then runs every registered detector
    /// against the single tree. A read or parse failure yields an empty
    /// finding list plus the recorded error.
    pub fn scan_file(&self, path: &Path) -> FileScan {
        let tree = match self.load_tree(path) {
            Ok(tree) => tree,
            Err(error) => {
                debug!(file = %path.display(), %error, "file skipped");
                return FileScan {
                    findings: Vec::new(),
                    error: Some(error),
                };
            }
        };
        let mut findings = Vec::new();
        for detector in self.registry.detectors() {
            let mut batch = detector.inspect(&tree, path);
            debug!(
                detector = detector.name(),
                file = %path.display(),
                count = batch.len(),
                "detector finished"
            );
            findings.append(&mut batch);
        }
        FileScan {
            findings,
            error: None,
        }
    }

    /// Detector-scoped execution path used by the scheduler: parse the
    /// file and run exactly one detector against it.
    pub fn run_detector(
        &self,
        path: &Path,
        detector: &dyn Detector,
    ) -> Result<Vec<Finding>, ScanError> {
        let tree = self.load_tree(path)?;
        Ok(detector.inspect(&tree, path))
    }

    fn load_tree(&self, path: &Path) -> Result<SyntaxTree, ScanError> {
        let content = fs::read_to_string(path).map_err(|source| ScanError::FileRead {
            file: path.to_path_buf(),
            source,
        })?;
        parsers::parse_python(&content).map_err(|error| ScanError::Parse {
            file: path.to_path_buf(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detectors::Severity;
    use std::io::Write;

    fn temp_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".py")
            .tempfile()
            .unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn scan_file_concatenates_all_detector_output() {
        let file = temp_file(
            "import sqlite3\nPASSWORD = \"abc123def456ghi789\"\ncursor.execute(\"SELECT * FROM t WHERE id = \" + i)\n",
        );
        let registry = Registry::with_defaults();
        let scan = Orchestrator::new(&registry).scan_file(file.path());
        assert!(scan.error.is_none());
        let detectors: std::collections::HashSet<&str> =
            scan.findings.iter().map(|f| f.detector.as_str()).collect();
        assert!(detectors.contains("sql"));
        assert!(detectors.contains("secrets"));
        assert!(detectors.contains("db"));
        assert!(scan.findings.iter().all(|f| f.timestamp > 0));
        assert!(scan
            .findings
            .iter()
            .any(|f| f.severity == Severity::High));
    }

    #[test]
    fn missing_file_records_read_error() {
        let registry = Registry::with_defaults();
        let scan = Orchestrator::new(&registry).scan_file(Path::new("/nonexistent/x.py"));
        assert!(scan.findings.is_empty());
        assert!(matches!(scan.error, Some(ScanError::FileRead { .. })));
    }

    #[test]
    fn malformed_file_records_parse_error() {
        let file = temp_file("def broken(:\n");
        let registry = Registry::with_defaults();
        let scan = Orchestrator::new(&registry).scan_file(file.path());
        assert!(scan.findings.is_empty());
        assert!(matches!(scan.error, Some(ScanError::Parse { .. })));
    }

    #[test]
    fn run_detector_scopes_to_one_detector() {
        let file = temp_file("eval(x)\ncursor.execute(\"SELECT \" + q)\n");
        let registry = Registry::with_defaults();
        let orchestrator = Orchestrator::new(&registry);
        let input = registry
            .detectors()
            .iter()
            .find(|d| d.name() == "input")
            .unwrap();
        let findings = orchestrator.run_detector(file.path(), input.as_ref()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detector, "input");
    }
}
