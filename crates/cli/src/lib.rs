//! Common utilities for the command line interface.
use regex::Regex;
use std::fs;
use std::path::Path;

pub mod args;
pub mod cache_cmd;
pub mod config;
pub mod config_cmd;
pub mod output;
pub mod scan;
pub mod ui;
pub mod walk;

/// Default maximum size: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Converts a basic glob pattern to a regular expression.
///
/// # Example
///
/// ```
/// use dbsentry::glob_to_regex;
/// let re = glob_to_regex("src/*.py").unwrap();
/// assert!(re.is_match("src/models.py"));
/// ```
pub fn glob_to_regex(pat: &str) -> Result<Regex, regex::Error> {
    let mut regex = String::from("^");
    let mut chars = pat.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push('.'),
            '.' => regex.push_str("\\."),
            '/' => regex.push('/'),
            '(' | ')' | '+' | '|' | '^' | '$' | '[' | ']' | '{' | '}' | '\\' => {
                regex.push('\\');
                regex.push(c);
            }
            _ => regex.push(c),
        }
    }
    regex.push('$');
    Regex::new(&regex)
}

/// Transforms a glob-style exclusion string into [`Regex`].
/// Accepts trailing slashes and expands to `**` automatically.
///
/// # Example
///
/// ```
/// use dbsentry::parse_exclude;
/// let re = parse_exclude("venv/").unwrap();
/// assert!(re.is_match("venv/lib/site.py"));
/// ```
pub fn parse_exclude(s: &str) -> Result<Regex, String> {
    let glob_str = if s.ends_with('/') {
        format!("{s}**")
    } else {
        s.to_string()
    };
    glob_to_regex(&glob_str).map_err(|e| e.to_string())
}

/// Default exclusion patterns.
pub fn default_excludes() -> Vec<Regex> {
    [
        "**/__pycache__/**",
        "**/.git/**",
        "**/venv/**",
        "**/node_modules/**",
    ]
    .iter()
    .map(|p| parse_exclude(p).expect("valid default"))
    .collect()
}

/// Indicates whether a path should be omitted according to patterns,
/// hidden-file policy or size. Separators are normalised to support
/// Windows and Unix.
pub fn is_excluded(
    path: &Path,
    patterns: &[Regex],
    scan_hidden: bool,
    max_file_size: u64,
) -> bool {
    let path_str = path.to_string_lossy().replace('\\', "/");
    if patterns.iter().any(|re| re.is_match(&path_str)) {
        return true;
    }
    if !scan_hidden {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.') && n.len() > 1)
            .unwrap_or(false);
        if hidden {
            return true;
        }
    }
    if max_file_size > 0 {
        if let Ok(meta) = fs::metadata(path) {
            if meta.is_file() && meta.len() > max_file_size {
                return true;
            }
        }
    }
    false
}
