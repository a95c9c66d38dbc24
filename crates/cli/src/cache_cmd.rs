//! The `cache` subcommand: clearing and inspecting the result cache.

use anyhow::Result;
use engine::ResultCache;

use crate::args::CacheCmd;
use crate::config::load_config;

pub fn run_cache_cmd(cmd: CacheCmd) -> Result<()> {
    match cmd {
        CacheCmd::Clear { cache_dir, config } => {
            let cfg = load_config(config.as_deref())?;
            let cache = ResultCache::open(cfg.cache_config(cache_dir));
            let removed = cache.clear()?;
            println!("Cleared {removed} cache entries from {}", cache.dir().display());
        }
        CacheCmd::Stats { cache_dir, config } => {
            let cfg = load_config(config.as_deref())?;
            let cache = ResultCache::open(cfg.cache_config(cache_dir));
            println!("Cache directory: {}", cache.dir().display());
            println!("Entries: {}", cache.entry_count());
            println!(
                "Write threshold: {}ms",
                cache.min_exec_time().as_millis()
            );
        }
    }
    Ok(())
}
