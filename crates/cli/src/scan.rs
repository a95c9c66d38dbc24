//! The `scan` subcommand: wiring of configuration, registry, cache,
//! scheduler and reporting.

use anyhow::{Context, Result};
use detectors::{Registry, Severity};
use engine::{ResultCache, Scheduler};
use reporters::ScanInfo;
use std::fs;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use crate::args::ScanArgs;
use crate::config::load_config;
use crate::output::Format;
use crate::ui;
use crate::{default_excludes, is_excluded, parse_exclude, walk};

pub fn run_scan(args: ScanArgs) -> Result<()> {
    let level = if args.quiet {
        LevelFilter::OFF
    } else if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = load_config(args.config.as_deref())?;
    let selection = if args.detectors.is_empty() {
        config.enabled_detectors()
    } else {
        args.detectors.clone()
    };
    // A bad detector selection or parameter aborts before any scheduling.
    let params = config.registry_params()?;
    let registry = Registry::from_selection(&selection, &params).map_err(anyhow::Error::new)?;

    if !args.quiet {
        ui::print_banner();
    }

    let path = args
        .path
        .canonicalize()
        .with_context(|| format!("path not found: {}", args.path.display()))?;
    info!(target = %path.display(), detectors = registry.len(), "scan started");

    let mut patterns = args.exclude.clone();
    if !args.no_default_exclude {
        patterns.extend(default_excludes());
    }
    for pattern in &config.ignore.patterns {
        match parse_exclude(pattern) {
            Ok(re) => patterns.push(re),
            Err(e) => warn!(pattern = %pattern, error = %e, "invalid ignore pattern"),
        }
    }
    let max_file_size = args
        .max_file_size
        .min(config.analysis.max_file_size_mb * 1024 * 1024);
    let scan_hidden = config.analysis.scan_hidden_files;

    let mut files: Vec<PathBuf> = Vec::new();
    // The root itself is never excluded; hidden/ignore rules apply to
    // entries discovered below it.
    walk::visit(
        &path,
        &|p| p != path && is_excluded(p, &patterns, scan_hidden, max_file_size),
        &mut |p| {
            if parsers::detect_type(p).is_some() {
                files.push(p.to_path_buf());
            }
            Ok(())
        },
    )?;
    info!(files = files.len(), "files queued");

    let workers = args
        .workers
        .or(config.performance.max_workers)
        .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));

    let cache = if args.no_cache {
        None
    } else {
        Some(ResultCache::open(
            config.cache_config(args.cache_dir.clone()),
        ))
    };
    let progress = if args.quiet { None } else { ui::ProgressLine::new() };
    let progress_cb: Option<Box<dyn Fn(usize, usize) + Send + Sync + '_>> = progress
        .as_ref()
        .map(|line| {
            Box::new(move |done: usize, total: usize| line.update(done, total)) as Box<_>
        });

    let mut scheduler = Scheduler::new(&registry, workers);
    if let Some(cache) = cache.as_ref() {
        scheduler = scheduler.with_cache(cache);
    }
    if let Some(cb) = progress_cb.as_deref() {
        scheduler = scheduler.with_progress(cb);
    }
    let report = scheduler.scan(&files);
    if let Some(line) = progress.as_ref() {
        line.finish();
    }

    let scan_info = ScanInfo {
        detectors_loaded: registry.len(),
        files_scanned: report.files_scanned,
        files_skipped: report.files_skipped,
        duration_ms: report.duration.as_millis() as u64,
        cache_hits: report.cache_hits,
        cache_misses: report.cache_misses,
    };

    let format: Format = args.format.unwrap_or_else(|| {
        match config.reports.default_format.as_str() {
            "json" => Format::Json,
            "html" => Format::Html,
            _ => Format::Text,
        }
    });
    if let Some(out_path) = &args.output {
        let mut buf = Vec::new();
        reporters::write_findings(&mut buf, &report.findings, format.into(), Some(&scan_info))?;
        fs::write(out_path, &buf)
            .with_context(|| format!("failed to write report to {}", out_path.display()))?;
        info!(report = %out_path.display(), "report written");
    } else {
        reporters::print_findings(&report.findings, format.into(), Some(&scan_info))?;
    }
    info!(
        findings = report.findings.len(),
        skipped = report.files_skipped,
        "scan completed"
    );

    if let Some(threshold) = args.fail_on {
        if report.findings.iter().any(|f| f.severity >= threshold) {
            std::process::exit(1);
        }
        return Ok(());
    }
    let high = report
        .findings
        .iter()
        .filter(|f| f.severity >= Severity::High)
        .count();
    let medium = report
        .findings
        .iter()
        .filter(|f| f.severity == Severity::Medium)
        .count();
    if config.severity.fail_on_high && high >= config.severity.high_threshold {
        warn!(high, threshold = config.severity.high_threshold, "high severity threshold exceeded");
        std::process::exit(1);
    }
    if config.severity.warn_on_medium && medium >= config.severity.medium_threshold {
        warn!(medium, threshold = config.severity.medium_threshold, "medium severity threshold exceeded");
    }
    Ok(())
}
