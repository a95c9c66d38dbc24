//! Fan-out of (file, detector) jobs across a bounded worker pool.

use crate::cache::{self, ResultCache};
use crate::orchestrator::Orchestrator;
use detectors::{Detector, Finding, Registry};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Progress callback: (completed jobs, total jobs).
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

/// Aggregate outcome of one scan invocation.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Union of findings over all completed jobs; ordering across files
    /// and detectors is not specified.
    pub findings: Vec<Finding>,
    /// Number of files handed to the scheduler.
    pub files_scanned: usize,
    /// Files that contributed nothing due to a read or parse failure.
    pub files_skipped: usize,
    pub jobs_total: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub duration: Duration,
}

/// Schedules (file, detector) pairs onto a fixed-size worker pool,
/// consulting the result cache around every job.
pub struct Scheduler<'a> {
    registry: &'a Registry,
    workers: usize,
    cache: Option<&'a ResultCache>,
    progress: Option<&'a ProgressFn<'a>>,
}

impl<'a> Scheduler<'a> {
    pub fn new(registry: &'a Registry, workers: usize) -> Self {
        Self {
            registry,
            workers: workers.max(1),
            cache: None,
            progress: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_progress(mut self, progress: &'a ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Runs every (file, detector) pair to completion. Per-job failures
    /// degrade to empty contributions and never abort sibling jobs.
    pub fn scan(&self, files: &[PathBuf]) -> ScanReport {
        let start = Instant::now();
        let orchestrator = Orchestrator::new(self.registry);
        let jobs: Vec<(&PathBuf, &dyn Detector)> = files
            .iter()
            .flat_map(|file| {
                self.registry
                    .detectors()
                    .iter()
                    .map(move |d| (file, d.as_ref()))
            })
            .collect();
        let total = jobs.len();
        debug!(files = files.len(), jobs = total, workers = self.workers, "scan scheduled");

        let completed = AtomicUsize::new(0);
        let hits = AtomicUsize::new(0);
        let misses = AtomicUsize::new(0);
        let skipped: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .expect("worker pool");
        let results: Vec<Vec<Finding>> = pool.install(|| {
            jobs.par_iter()
                .map(|&(file, detector)| {
                    let findings =
                        self.run_job(&orchestrator, file, detector, &hits, &misses, &skipped);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(progress) = self.progress {
                        progress(done, total);
                    }
                    findings
                })
                .collect()
        });

        let skipped = skipped.into_inner().unwrap_or_else(|e| e.into_inner());
        ScanReport {
            findings: results.into_iter().flatten().collect(),
            files_scanned: files.len(),
            files_skipped: skipped.len(),
            jobs_total: total,
            cache_hits: hits.load(Ordering::Relaxed),
            cache_misses: misses.load(Ordering::Relaxed),
            duration: start.elapsed(),
        }
    }

    fn run_job(
        &self,
        orchestrator: &Orchestrator<'_>,
        file: &PathBuf,
        detector: &dyn Detector,
        hits: &AtomicUsize,
        misses: &AtomicUsize,
        skipped: &Mutex<HashSet<PathBuf>>,
    ) -> Vec<Finding> {
        if let Some(cache) = self.cache {
            if let Some(key) = cache::fingerprint(file, detector.name()) {
                if let Some(found) = cache.get(&key) {
                    hits.fetch_add(1, Ordering::Relaxed);
                    return found;
                }
                misses.fetch_add(1, Ordering::Relaxed);
                let start = Instant::now();
                return match orchestrator.run_detector(file, detector) {
                    Ok(findings) => {
                        cache.put(&key, &findings, start.elapsed());
                        findings
                    }
                    Err(error) => self.record_skip(file, detector, error, skipped),
                };
            }
        }
        match orchestrator.run_detector(file, detector) {
            Ok(findings) => findings,
            Err(error) => self.record_skip(file, detector, error, skipped),
        }
    }

    fn record_skip(
        &self,
        file: &PathBuf,
        detector: &dyn Detector,
        error: crate::ScanError,
        skipped: &Mutex<HashSet<PathBuf>>,
    ) -> Vec<Finding> {
        warn!(detector = detector.name(), %error, "job degraded to empty result");
        skipped
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(file.clone());
        Vec::new()
    }
}
