//! The `config` subcommand: creating, showing and validating
//! configuration files.

use anyhow::Result;
use detectors::Registry;

use crate::args::ConfigCmd;
use crate::config::{load_config, save_default_config};

pub fn run_config_cmd(cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Create { path } => {
            save_default_config(&path)?;
            println!("Created default configuration at {}", path.display());
        }
        ConfigCmd::Show { config } => {
            let cfg = load_config(config.as_deref())?;
            println!("Enabled detectors: {}", cfg.enabled_detectors().join(", "));
            println!("Default report format: {}", cfg.reports.default_format);
            println!(
                "High severity threshold: {} (fail: {})",
                cfg.severity.high_threshold, cfg.severity.fail_on_high
            );
            println!("Cache directory: {}", cfg.performance.cache_dir.display());
            println!("Ignore patterns: {}", cfg.ignore.patterns.len());
        }
        ConfigCmd::Validate { config } => {
            let cfg = load_config(Some(&config))?;
            let params = cfg.registry_params()?;
            Registry::from_selection(&cfg.enabled_detectors(), &params)
                .map_err(anyhow::Error::new)?;
            println!("Configuration is valid: {}", config.display());
            println!("Enabled detectors: {}", cfg.enabled_detectors().join(", "));
        }
    }
    Ok(())
}
