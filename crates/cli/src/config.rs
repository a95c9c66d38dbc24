//! Scanner configuration: YAML (or JSON) file deep-merged over built-in
//! defaults via serde field defaults. Immutable for the duration of one
//! scan invocation.

use anyhow::{bail, Context, Result};
use detectors::{RegistryParams, SecretsParams, Severity};
use engine::CacheConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Long analyzer section names and the detector each enables.
pub const ANALYZER_MAP: [(&str, &str); 6] = [
    ("sql_injection", "sql"),
    ("hardcoded_secrets", "secrets"),
    ("database_connection", "db"),
    ("input_validation", "input"),
    ("orm_security", "orm"),
    ("nosql_security", "nosql"),
];

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the detector's primary finding severity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_secret_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_string_threshold: Option<usize>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            severity: None,
            min_secret_length: None,
            long_string_threshold: None,
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub scan_hidden_files: bool,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scan_hidden_files: false,
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_high_threshold() -> usize {
    3
}

fn default_medium_threshold() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: usize,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: usize,
    #[serde(default = "default_enabled")]
    pub fail_on_high: bool,
    #[serde(default = "default_enabled")]
    pub warn_on_medium: bool,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            fail_on_high: true,
            warn_on_medium: true,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".dbsentry_cache")
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_cache_sweep_days() -> u64 {
    7
}

fn default_min_cache_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Worker count; `None` means one worker per available CPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    #[serde(default = "default_cache_sweep_days")]
    pub cache_sweep_days: u64,
    #[serde(default = "default_min_cache_ms")]
    pub min_cache_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_workers: None,
            cache_ttl_hours: default_cache_ttl_hours(),
            cache_sweep_days: default_cache_sweep_days(),
            min_cache_ms: default_min_cache_ms(),
        }
    }
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/__pycache__/**".into(),
        "**/.git/**".into(),
        "**/venv/**".into(),
        "**/node_modules/**".into(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default = "default_ignore_patterns")]
    pub patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            patterns: default_ignore_patterns(),
        }
    }
}

fn default_report_format() -> String {
    "text".into()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./reports")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_report_format")]
    pub default_format: String,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_format: default_report_format(),
            output_directory: default_output_directory(),
        }
    }
}

fn default_analyzers() -> BTreeMap<String, AnalyzerSettings> {
    let mut map = BTreeMap::new();
    for (long, short) in ANALYZER_MAP {
        let mut settings = AnalyzerSettings::default();
        if short == "secrets" {
            settings.min_secret_length = Some(8);
            settings.long_string_threshold = Some(20);
        }
        map.insert(long.to_string(), settings);
    }
    map
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default = "default_analyzers")]
    pub analyzers: BTreeMap<String, AnalyzerSettings>,
    #[serde(default)]
    pub severity: SeverityConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            analyzers: default_analyzers(),
            severity: SeverityConfig::default(),
            performance: PerformanceConfig::default(),
            ignore: IgnoreConfig::default(),
            reports: ReportsConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Detector names enabled by the analyzer tables, in registration
    /// order. Unknown sections are logged and ignored; an all-disabled
    /// configuration falls back to the full set.
    pub fn enabled_detectors(&self) -> Vec<String> {
        for key in self.analyzers.keys() {
            if !ANALYZER_MAP.iter().any(|(long, _)| long == key) {
                warn!(analyzer = %key, "unknown analyzer section ignored");
            }
        }
        let enabled: Vec<String> = ANALYZER_MAP
            .iter()
            .filter(|(long, _)| {
                self.analyzers
                    .get(*long)
                    .map(|a| a.enabled)
                    .unwrap_or(true)
            })
            .map(|(_, short)| short.to_string())
            .collect();
        if enabled.is_empty() {
            ANALYZER_MAP.iter().map(|(_, s)| s.to_string()).collect()
        } else {
            enabled
        }
    }

    /// Resolves the analyzer tables into detector construction
    /// parameters. An unparsable severity is a fatal configuration
    /// problem.
    pub fn registry_params(&self) -> Result<RegistryParams> {
        let severity_of = |long: &str| -> Result<Option<Severity>> {
            match self.analyzers.get(long).and_then(|a| a.severity.as_deref()) {
                Some(raw) => {
                    let sev = raw.parse().map_err(|e: String| {
                        anyhow::anyhow!("analyzer '{long}': {e}")
                    })?;
                    Ok(Some(sev))
                }
                None => Ok(None),
            }
        };
        let secrets_table = self.analyzers.get("hardcoded_secrets");
        let defaults = SecretsParams::default();
        Ok(RegistryParams {
            secrets: SecretsParams {
                min_secret_length: secrets_table
                    .and_then(|a| a.min_secret_length)
                    .unwrap_or(defaults.min_secret_length),
                long_string_threshold: secrets_table
                    .and_then(|a| a.long_string_threshold)
                    .unwrap_or(defaults.long_string_threshold),
                severity: severity_of("hardcoded_secrets")?,
            },
            sql_severity: severity_of("sql_injection")?,
            db_severity: severity_of("database_connection")?,
            input_severity: severity_of("input_validation")?,
            orm_severity: severity_of("orm_security")?,
            nosql_severity: severity_of("nosql_security")?,
        })
    }

    /// Cache settings, with an optional directory override from the CLI.
    pub fn cache_config(&self, dir_override: Option<PathBuf>) -> CacheConfig {
        CacheConfig {
            dir: dir_override.unwrap_or_else(|| self.performance.cache_dir.clone()),
            ttl: Duration::from_secs(self.performance.cache_ttl_hours * 3600),
            sweep_after: Duration::from_secs(self.performance.cache_sweep_days * 86_400),
            min_exec_time: Duration::from_millis(self.performance.min_cache_ms),
        }
    }
}

/// Loads the configuration file, or the defaults when none is given.
/// `.json` files parse as JSON, everything else as YAML.
pub fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    let Some(path) = path else {
        return Ok(ScannerConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    if content.trim().is_empty() {
        bail!("configuration file is empty: {}", path.display());
    }
    let config = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse configuration file {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse configuration file {}", path.display()))?
    };
    Ok(config)
}

/// Writes the default configuration as YAML.
pub fn save_default_config(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }
    let data = serde_yaml::to_string(&ScannerConfig::default())
        .context("failed to serialize configuration")?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}
