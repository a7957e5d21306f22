//! Recursive share walker.
//!
//! Walks a subtree of the share depth-first, collecting every file whose
//! extension matches the configured filter. A single unreadable directory
//! must never abort the scan: per-directory failures are accumulated in the
//! result while traversal continues with siblings. Only connection and
//! authentication failures abort the whole walk.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::errors::Result;
use crate::core::paths::{join_share_path, matches_extension, normalize_base_path};
use crate::share::session::ShareSession;

/// One collected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    /// Path relative to the scanned base, `/`-separated.
    pub relative_path: String,
    pub name: String,
    pub is_directory: bool,
    pub size_bytes: u64,
    /// Directory depth below the base path; files directly under the base
    /// have depth 0.
    pub depth: usize,
}

/// A directory that failed to list, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub path: String,
    pub message: String,
}

/// Outcome of one full walk. Immutable once produced; a rescan replaces it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub base_path: String,
    pub entries: Vec<ScanEntry>,
    pub errors: Vec<ScanIssue>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    /// True when the whole subtree listed without a single failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Case-insensitive extension filter; empty matches every file.
    pub extensions: Vec<String>,
    /// Maximum directory depth visited below the base; `None` is unbounded.
    pub max_depth: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["jpg".to_string()],
            max_depth: None,
        }
    }
}

impl ScanOptions {
    #[must_use]
    pub fn from_config(config: &crate::core::config::ScanConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            max_depth: config.max_depth,
        }
    }
}

/// Depth-first scanner over a [`ShareSession`].
pub struct ShareWalker {
    options: ScanOptions,
}

impl ShareWalker {
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Walk `base_path` (normalized first) and collect matching files.
    ///
    /// Traversal order follows the session's listing order, so two scans of
    /// an unchanged share produce identical results.
    pub fn scan(&self, session: &dyn ShareSession, base_path: &str) -> Result<ScanResult> {
        let base = normalize_base_path(base_path);
        let mut entries = Vec::new();
        let mut errors = Vec::new();
        self.walk(session, &base, "", 0, &mut entries, &mut errors)?;
        Ok(ScanResult {
            base_path: base,
            entries,
            errors,
            scanned_at: Utc::now(),
        })
    }

    fn walk(
        &self,
        session: &dyn ShareSession,
        base: &str,
        rel_dir: &str,
        depth: usize,
        entries: &mut Vec<ScanEntry>,
        errors: &mut Vec<ScanIssue>,
    ) -> Result<()> {
        let dir_path = if rel_dir.is_empty() {
            base.to_string()
        } else {
            join_share_path(base, rel_dir)
        };

        let listing = match session.list_dir(&dir_path) {
            Ok(listing) => listing,
            Err(e) if e.is_fatal_for_scan() => return Err(e),
            Err(e) => {
                // The directory and its whole subtree drop out of `entries`;
                // the failure is recorded instead of silently swallowed.
                errors.push(ScanIssue {
                    path: dir_path,
                    message: e.to_string(),
                });
                return Ok(());
            }
        };

        for item in listing {
            let relative = if rel_dir.is_empty() {
                item.name.clone()
            } else {
                format!("{rel_dir}/{}", item.name)
            };

            if item.is_directory {
                if self.options.max_depth.is_none_or(|limit| depth + 1 <= limit) {
                    self.walk(session, base, &relative, depth + 1, entries, errors)?;
                }
            } else if matches_extension(&item.name, &self.options.extensions) {
                entries.push(ScanEntry {
                    relative_path: relative,
                    name: item.name,
                    is_directory: false,
                    size_bytes: item.size_bytes,
                    depth,
                });
            }
        }

        Ok(())
    }
}
