use detectors::{Finding, Registry};
use engine::cache::{CacheConfig, ResultCache};
use engine::Scheduler;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

const VULNERABLE: &str = r#"import sqlite3

PASSWORD = "abc123def456ghi789jkl"

def fetch(user_id):
    conn = sqlite3.connect(":memory:")
    cursor = conn.cursor()
    cursor.execute("SELECT * FROM users WHERE id = " + user_id)
    return cursor.fetchall()
"#;

const CLEAN: &str = r#"def add(a, b):
    return a + b
"#;

fn write_files(dir: &TempDir, sources: &[(&str, &str)]) -> Vec<PathBuf> {
    sources
        .iter()
        .map(|(name, content)| {
            let path = dir.path().join(name);
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

fn shape(findings: &[Finding]) -> Vec<(String, String, usize, String)> {
    let mut out: Vec<_> = findings
        .iter()
        .map(|f| {
            (
                f.file.display().to_string(),
                f.detector.clone(),
                f.line,
                f.kind.clone(),
            )
        })
        .collect();
    out.sort();
    out
}

fn eager_cache(dir: &TempDir) -> ResultCache {
    ResultCache::open(CacheConfig {
        dir: dir.path().join("cache"),
        min_exec_time: Duration::ZERO,
        ..CacheConfig::default()
    })
}

#[test]
fn parallel_scan_matches_sequential_scan() {
    let tmp = TempDir::new().unwrap();
    let files = write_files(
        &tmp,
        &[
            ("a.py", VULNERABLE),
            ("b.py", CLEAN),
            ("c.py", VULNERABLE),
            ("d.py", "eval(x)\n"),
            ("e.py", "users = db.users.find({\"$where\": \"this.a > 1\"})\n"),
        ],
    );
    let registry = Registry::with_defaults();

    let sequential = Scheduler::new(&registry, 1).scan(&files);
    let parallel = Scheduler::new(&registry, 4).scan(&files);

    assert!(!sequential.findings.is_empty());
    assert_eq!(shape(&sequential.findings), shape(&parallel.findings));
    assert_eq!(sequential.files_skipped, 0);
    assert_eq!(parallel.jobs_total, files.len() * registry.len());
}

#[test]
fn one_bad_file_does_not_poison_the_rest() {
    let tmp = TempDir::new().unwrap();
    let files = write_files(
        &tmp,
        &[
            ("good.py", VULNERABLE),
            ("broken.py", "def broken(:\n"),
            ("other.py", "eval(x)\n"),
        ],
    );
    let registry = Registry::with_defaults();
    let report = Scheduler::new(&registry, 4).scan(&files);

    assert_eq!(report.files_skipped, 1);
    assert!(report
        .findings
        .iter()
        .all(|f| !f.file.ends_with("broken.py")));
    assert!(report.findings.iter().any(|f| f.file.ends_with("good.py")));
    assert!(report.findings.iter().any(|f| f.file.ends_with("other.py")));
}

#[test]
fn unreadable_file_is_counted_once_not_per_detector() {
    let tmp = TempDir::new().unwrap();
    let mut files = write_files(&tmp, &[("good.py", CLEAN)]);
    files.push(tmp.path().join("missing.py"));
    let registry = Registry::with_defaults();
    let report = Scheduler::new(&registry, 2).scan(&files);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.files_scanned, 2);
}

#[test]
fn second_scan_of_unchanged_file_hits_the_cache() {
    let tmp = TempDir::new().unwrap();
    let files = write_files(&tmp, &[("a.py", VULNERABLE)]);
    let registry = Registry::with_defaults();
    let cache = eager_cache(&tmp);

    let first = Scheduler::new(&registry, 2).with_cache(&cache).scan(&files);
    assert_eq!(first.cache_hits, 0);
    assert_eq!(first.cache_misses, registry.len());

    let second = Scheduler::new(&registry, 2).with_cache(&cache).scan(&files);
    assert_eq!(second.cache_hits, registry.len());
    assert_eq!(second.cache_misses, 0);
    assert_eq!(shape(&first.findings), shape(&second.findings));
}

#[test]
fn content_change_invalidates_the_cache() {
    let tmp = TempDir::new().unwrap();
    let files = write_files(&tmp, &[("a.py", VULNERABLE)]);
    let registry = Registry::with_defaults();
    let cache = eager_cache(&tmp);

    Scheduler::new(&registry, 2).with_cache(&cache).scan(&files);
    fs::write(&files[0], format!("{VULNERABLE}\n# touched\n")).unwrap();

    let second = Scheduler::new(&registry, 2).with_cache(&cache).scan(&files);
    assert_eq!(second.cache_hits, 0);
    assert_eq!(second.cache_misses, registry.len());
    assert!(!second.findings.is_empty());
}

#[test]
fn progress_reports_every_completed_job() {
    let tmp = TempDir::new().unwrap();
    let files = write_files(&tmp, &[("a.py", CLEAN), ("b.py", CLEAN)]);
    let registry = Registry::with_defaults();
    let calls = AtomicUsize::new(0);
    let last_total = AtomicUsize::new(0);
    let progress = |_done: usize, total: usize| {
        calls.fetch_add(1, Ordering::SeqCst);
        last_total.store(total, Ordering::SeqCst);
    };
    let report = Scheduler::new(&registry, 3)
        .with_progress(&progress)
        .scan(&files);

    assert_eq!(calls.load(Ordering::SeqCst), report.jobs_total);
    assert_eq!(last_total.load(Ordering::SeqCst), report.jobs_total);
}

#[test]
fn clean_files_produce_no_findings() {
    let tmp = TempDir::new().unwrap();
    let files = write_files(&tmp, &[("a.py", CLEAN), ("b.py", "")]);
    let registry = Registry::with_defaults();
    let report = Scheduler::new(&registry, 2).scan(&files);
    assert!(report.findings.is_empty());
    assert_eq!(report.files_skipped, 0);
}
