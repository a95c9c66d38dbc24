//! Queue-based directory traversal with symlink and permission safety.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Visits every regular file under `path`, skipping excluded paths,
/// symlinks and entries the process cannot read.
pub fn visit<F, C>(path: &Path, excludes: &F, callback: &mut C) -> anyhow::Result<()>
where
    F: Fn(&Path) -> bool,
    C: FnMut(&Path) -> anyhow::Result<()>,
{
    let mut pending: VecDeque<PathBuf> = VecDeque::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    pending.push_back(path.to_path_buf());

    while let Some(current) = pending.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if excludes(&current) {
            debug!(path = %current.display(), "path excluded");
            continue;
        }
        let metadata = match fs::symlink_metadata(&current) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(path = %current.display(), "permission denied");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            debug!(path = %current.display(), "symlink skipped");
            continue;
        }
        if file_type.is_file() {
            callback(&current)?;
        } else if file_type.is_dir() {
            let entries = match fs::read_dir(&current) {
                Ok(e) => e,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    debug!(path = %current.display(), "permission denied");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            for entry_res in entries {
                let entry = match entry_res {
                    Ok(e) => e,
                    Err(e) if e.kind() == io::ErrorKind::PermissionDenied => continue,
                    Err(e) => return Err(e.into()),
                };
                pending.push_back(entry.path());
            }
        }
    }

    Ok(())
}
