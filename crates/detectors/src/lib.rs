//! Detection rules for database security issues.
//!
//! Each detector is a stateless unit compiled once from resolved
//! parameters; the [`Registry`] assembles the enabled set in a stable
//! order and rejects unknown names before any scan work starts.

use ir::SyntaxTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

mod connections;
mod dynamic;
mod finding;
mod nosql;
mod orm;
mod secrets;
mod sql;

pub use connections::ConnectionHygieneDetector;
pub use dynamic::DynamicExecDetector;
pub use finding::{Finding, FindingBuilder};
pub use nosql::NoSqlDetector;
pub use orm::OrmDetector;
pub use secrets::{SecretsDetector, SecretsParams};
pub use sql::SqlInjectionDetector;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
/// Severity associated with a finding, ordered from least to most severe.
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A single detection rule family.
///
/// Implementations hold precompiled pattern data only; every call to
/// [`Detector::inspect`] returns a fresh list scoped to the given tree.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    fn inspect(&self, tree: &SyntaxTree, file: &Path) -> Vec<Finding>;
}

/// Configuration problem severe enough to abort before scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownDetector(String),
    InvalidParameter { detector: String, message: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownDetector(name) => {
                write!(f, "unknown detector '{name}'")
            }
            ConfigurationError::InvalidParameter { detector, message } => {
                write!(f, "invalid parameter for detector '{detector}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Names accepted in a detector selection, in registration order.
pub const DETECTOR_NAMES: [&str; 6] = ["sql", "secrets", "db", "input", "orm", "nosql"];

/// Resolved per-detector parameters, threaded in once at construction.
/// Detectors never see a configuration handle.
#[derive(Debug, Clone, Default)]
pub struct RegistryParams {
    pub secrets: SecretsParams,
    pub sql_severity: Option<Severity>,
    pub db_severity: Option<Severity>,
    pub input_severity: Option<Severity>,
    pub orm_severity: Option<Severity>,
    pub nosql_severity: Option<Severity>,
}

/// Ordered, de-duplicated set of enabled detectors.
pub struct Registry {
    detectors: Vec<Box<dyn Detector>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Registry {
    /// Builds a registry from a selection of detector names. Duplicates
    /// are collapsed keeping the first occurrence; an unknown name is a
    /// fatal [`ConfigurationError`].
    pub fn from_selection(
        names: &[String],
        params: &RegistryParams,
    ) -> Result<Self, ConfigurationError> {
        if params.secrets.long_string_threshold == 0 {
            return Err(ConfigurationError::InvalidParameter {
                detector: "secrets".into(),
                message: "long_string_threshold must be greater than 0".into(),
            });
        }
        let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
        for name in names {
            if detectors.iter().any(|d| d.name() == name.as_str()) {
                debug!(detector = %name, "duplicate detector selection ignored");
                continue;
            }
            let detector: Box<dyn Detector> = match name.as_str() {
                "sql" => Box::new(SqlInjectionDetector::new(params.sql_severity)),
                "secrets" => Box::new(SecretsDetector::new(params.secrets.clone())),
                "db" => Box::new(ConnectionHygieneDetector::new(params.db_severity)),
                "input" => Box::new(DynamicExecDetector::new(params.input_severity)),
                "orm" => Box::new(OrmDetector::new(params.orm_severity)),
                "nosql" => Box::new(NoSqlDetector::new(params.nosql_severity)),
                other => return Err(ConfigurationError::UnknownDetector(other.to_string())),
            };
            detectors.push(detector);
        }
        Ok(Self { detectors })
    }

    /// Registry with every detector enabled at default parameters.
    pub fn with_defaults() -> Self {
        let names: Vec<String> = DETECTOR_NAMES.iter().map(|n| n.to_string()).collect();
        Self::from_selection(&names, &RegistryParams::default())
            .expect("default detector set is valid")
    }

    pub fn detectors(&self) -> &[Box<dyn Detector>] {
        &self.detectors
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn severity_ordering_matches_reporting_scale() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_round_trips_through_str() {
        for sev in [
            Severity::Info,
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(sev.to_string().parse::<Severity>(), Ok(sev));
        }
        assert!("bogus".parse::<Severity>().is_err());
    }

    #[test]
    fn registry_preserves_selection_order_and_dedups() {
        let reg = Registry::from_selection(
            &names(&["secrets", "sql", "secrets"]),
            &RegistryParams::default(),
        )
        .unwrap();
        let got: Vec<&str> = reg.detectors().iter().map(|d| d.name()).collect();
        assert_eq!(got, vec!["secrets", "sql"]);
    }

    #[test]
    fn registry_rejects_unknown_detector() {
        let err =
            Registry::from_selection(&names(&["sql", "sqll"]), &RegistryParams::default())
                .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownDetector("sqll".into()));
    }

    #[test]
    fn registry_rejects_invalid_threshold() {
        let params = RegistryParams {
            secrets: SecretsParams {
                long_string_threshold: 0,
                ..SecretsParams::default()
            },
            ..RegistryParams::default()
        };
        let err = Registry::from_selection(&names(&["secrets"]), &params).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { .. }));
    }

    #[test]
    fn default_registry_carries_all_families() {
        let reg = Registry::with_defaults();
        assert_eq!(reg.len(), DETECTOR_NAMES.len());
    }
}
