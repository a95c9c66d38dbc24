//! Scan engine: per-file orchestration, persisted result cache and the
//! bounded worker pool that fans (file, detector) jobs out.

use std::fmt;
use std::path::PathBuf;

pub mod cache;
mod orchestrator;
mod scheduler;

pub use cache::{CacheConfig, ResultCache};
pub use orchestrator::{FileScan, Orchestrator};
pub use scheduler::{ScanReport, Scheduler};

use parsers::ParseError;

/// Non-fatal failure for one unit of work. The affected file contributes
/// no findings; the scan continues.
#[derive(Debug)]
pub enum ScanError {
    Parse { file: PathBuf, error: ParseError },
    FileRead { file: PathBuf, source: std::io::Error },
}

impl ScanError {
    pub fn file(&self) -> &PathBuf {
        match self {
            ScanError::Parse { file, .. } | ScanError::FileRead { file, .. } => file,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Parse { file, error } => {
                write!(f, "failed to parse {}: {error}", file.display())
            }
            ScanError::FileRead { file, source } => {
                write!(f, "failed to read {}: {source}", file.display())
            }
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Parse { error, .. } => Some(error),
            ScanError::FileRead { source, .. } => Some(source),
        }
    }
}
