//! Finding record and its builder.

use crate::Severity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// One reported issue. Pure output value: carries no reference back to
/// the tree that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Path of the affected file.
    pub file: PathBuf,
    pub line: usize,
    /// Finding family, e.g. "SQL Injection".
    pub kind: String,
    pub severity: Severity,
    /// Descriptive message of the problem.
    pub message: String,
    /// Relevant code fragment, when one could be captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Suggested steps to remediate.
    pub remediation: String,
    /// Detector that produced the finding.
    pub detector: String,
    /// Emission time, unix seconds.
    pub timestamp: u64,
}

impl Finding {
    /// Starts a builder. Every required field is a parameter of either
    /// this constructor or [`FindingBuilder::emit`], so an incomplete
    /// finding cannot be constructed.
    pub fn builder(
        detector: &'static str,
        kind: impl Into<String>,
        severity: Severity,
    ) -> FindingBuilder {
        FindingBuilder {
            detector,
            kind: kind.into(),
            severity,
            snippet: None,
        }
    }
}

pub struct FindingBuilder {
    detector: &'static str,
    kind: String,
    severity: Severity,
    snippet: Option<String>,
}

impl FindingBuilder {
    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Finalizes the finding, stamping the emission timestamp.
    pub fn emit(
        self,
        file: &Path,
        line: usize,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Finding {
        Finding {
            file: file.to_path_buf(),
            line,
            kind: self.kind,
            severity: self.severity,
            message: message.into(),
            snippet: self.snippet,
            remediation: remediation.into(),
            detector: self.detector.to_string(),
            timestamp: unix_now(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
