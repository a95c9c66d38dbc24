use clap::{Args as ClapArgs, Parser, Subcommand};
use detectors::Severity;
use regex::Regex;
use std::path::PathBuf;

use crate::output::Format;

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse()
}

fn parse_workers(s: &str) -> Result<usize, String> {
    let v: usize = s
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    if v == 0 {
        Err("workers must be greater than 0".into())
    } else {
        Ok(v)
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "dbsentry - static security analysis for database-facing Python code",
    long_about = "dbsentry statically scans Python sources for database security issues:
injection-prone query construction, hardcoded credentials, unsafe dynamic
execution, risky connection configuration and ORM/NoSQL escape hatches.

Examples:
  dbsentry scan src/                      # Scan a directory
  dbsentry scan app.py --format json      # Scan one file, JSON output
  dbsentry scan . --detectors sql,secrets # Restrict the detector set
  dbsentry cache stats                    # Inspect the result cache
  dbsentry config create                  # Write a default configuration",
    subcommand_required = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan code for database security issues
    Scan(ScanArgs),
    /// Manage the persisted result cache
    #[command(subcommand)]
    Cache(CacheCmd),
    /// Manage the scanner configuration
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(ClapArgs)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,
    /// Configuration file (YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Comma-separated detector names to run (default: from configuration)
    #[arg(long, value_delimiter = ',')]
    pub detectors: Vec<String>,
    /// Output format for scan results (default: from configuration)
    #[arg(long, value_enum)]
    pub format: Option<Format>,
    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Number of parallel workers (default: configuration, then CPU count)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,
    /// Exit with error code if a finding of this severity or higher exists
    #[arg(long = "fail-on", value_parser = parse_severity)]
    pub fail_on: Option<Severity>,
    /// Exclude files matching these glob patterns
    #[arg(long, value_parser = crate::parse_exclude, value_delimiter = ',')]
    pub exclude: Vec<Regex>,
    /// Don't use default exclusion patterns
    #[arg(long)]
    pub no_default_exclude: bool,
    /// Maximum file size to scan (in bytes)
    #[arg(long, default_value_t = crate::DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,
    /// Directory for the result cache
    #[arg(long = "cache-dir")]
    pub cache_dir: Option<PathBuf>,
    /// Disable the result cache for this scan
    #[arg(long = "no-cache")]
    pub no_cache: bool,
    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
    /// Suppress non-essential output
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum CacheCmd {
    /// Remove every cached result
    Clear {
        /// Directory of the cache to clear
        #[arg(long = "cache-dir")]
        cache_dir: Option<PathBuf>,
        /// Configuration file supplying the cache directory
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show cache statistics
    Stats {
        /// Directory of the cache to inspect
        #[arg(long = "cache-dir")]
        cache_dir: Option<PathBuf>,
        /// Configuration file supplying the cache directory
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Write a default configuration file
    Create {
        /// Destination path
        #[arg(long, default_value = "security_config.yaml")]
        path: PathBuf,
    },
    /// Print a summary of the effective configuration
    Show {
        /// Configuration file to load
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check that a configuration file loads and resolves
    Validate {
        /// Configuration file to validate
        #[arg(long)]
        config: PathBuf,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
