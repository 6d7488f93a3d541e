//! Best-effort removal
//!
//! Cleanup keeps going after individual failures and reports all of them at
//! the end, so one busy mount or unreadable directory does not stop the rest
//! of the work from being done.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::classify::{top_level, PathSet};
use crate::infra::executor::Executor;
use crate::infra::filesystem::{exists_no_follow, is_benign_removal_error};

/// One entry that could not be removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// Path that was being removed
    pub path: PathBuf,
    /// Why it failed
    pub error: String,
}

/// Result of a best-effort removal pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Entries that could not be removed
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Whether everything was removed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record a failure and log it
    pub fn record(&mut self, path: &Path, error: impl ToString) {
        let error = error.to_string();
        tracing::error!("Failed to remove {}: {error}", path.display());
        self.failures.push(CleanupFailure {
            path: path.to_path_buf(),
            error,
        });
    }
}

/// Remove `base/entry` recursively, keeping the paths in `keep`
///
/// `keep` holds paths relative to `base`. Entries with nothing to keep are
/// removed with `rm -rf`; otherwise the tree is walked bottom-up and every
/// entry that is neither kept nor an ancestor of a kept path is removed.
pub fn remove_except(
    executor: &Executor,
    base: &Path,
    entry: &str,
    keep: &PathSet,
    report: &mut CleanupReport,
) {
    let root = base.join(entry);
    if !exists_no_follow(&root) {
        tracing::debug!("{} already removed", root.display());
        return;
    }

    let kept: Vec<&String> = keep.iter().filter(|p| top_level(p) == entry).collect();
    if kept.is_empty() {
        if let Err(e) = executor.remove_tree(&root) {
            report.record(&root, e);
        }
        return;
    }

    let holds_kept = |relative: &str| {
        kept.iter().any(|k| {
            k.as_str() == relative
                || (k.starts_with(relative) && k.as_bytes().get(relative.len()) == Some(&b'/'))
        })
    };

    for item in WalkDir::new(&root).follow_links(false).contents_first(true) {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                report.record(&path, e);
                continue;
            }
        };

        let Ok(relative) = item.path().strip_prefix(base) else {
            continue;
        };
        let relative = relative.to_string_lossy().into_owned();
        if holds_kept(relative.as_str()) {
            continue;
        }

        if let Err(e) = executor.remove_entry(item.path()) {
            if !is_benign_removal_error(&e) {
                report.record(item.path(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::executor::LinkMode;
    use std::fs;
    use tempfile::TempDir;

    fn set(items: &[&str]) -> PathSet {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_remove_except_without_keep_removes_everything() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cache/sub")).unwrap();
        fs::write(dir.path().join("cache/sub/file"), "x").unwrap();
        let mut report = CleanupReport::default();

        remove_except(
            &Executor::new(LinkMode::Reflink),
            dir.path(),
            "cache",
            &PathSet::new(),
            &mut report,
        );

        assert!(report.is_complete());
        assert!(!dir.path().join("cache").exists());
    }

    #[test]
    fn test_remove_except_keeps_listed_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("gcc/x86_64/13")).unwrap();
        fs::create_dir_all(dir.path().join("gcc/x86_64/13/32")).unwrap();
        fs::write(dir.path().join("gcc/x86_64/13/libgcc.a"), "64").unwrap();
        fs::write(dir.path().join("gcc/x86_64/13/32/libgcc.a"), "32").unwrap();
        fs::write(dir.path().join("gcc/x86_64/13/stray"), "x").unwrap();
        let keep = set(&["gcc/x86_64/13/libgcc.a", "other/file"]);
        let mut report = CleanupReport::default();

        remove_except(&Executor::new(LinkMode::Reflink), dir.path(), "gcc", &keep, &mut report);

        assert!(report.is_complete());
        assert!(dir.path().join("gcc/x86_64/13/libgcc.a").is_file());
        assert!(!dir.path().join("gcc/x86_64/13/32").exists());
        assert!(!dir.path().join("gcc/x86_64/13/stray").exists());
    }

    #[test]
    fn test_remove_except_missing_entry_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut report = CleanupReport::default();

        remove_except(
            &Executor::new(LinkMode::Reflink),
            dir.path(),
            "gone",
            &PathSet::new(),
            &mut report,
        );

        assert!(report.is_complete());
    }

    #[test]
    fn test_report_records_failures() {
        let mut report = CleanupReport::default();
        report.record(Path::new("/usr/lib64/gcc"), "Device or resource busy");

        assert!(!report.is_complete());
        assert_eq!(report.failures[0].path, PathBuf::from("/usr/lib64/gcc"));
    }
}
