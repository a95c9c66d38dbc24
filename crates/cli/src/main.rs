//! Entry point for the command-line interface.
//! Delegates to dedicated modules for argument handling, scanning and
//! cache/configuration maintenance.

use dbsentry::args::{parse_cli, Commands};
use dbsentry::cache_cmd::run_cache_cmd;
use dbsentry::config_cmd::run_config_cmd;
use dbsentry::scan::run_scan;

fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Cache(cmd) => run_cache_cmd(cmd),
        Commands::Config(cmd) => run_config_cmd(cmd),
    }
}
