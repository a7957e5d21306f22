//! Batch discovery over the share's fixed layout.
//!
//! Scan batches live at `{base}/{hole_id}/batch-{to}/depth.txt`, e.g.
//! `/incoming/Orexplore/DDH-001/batch-100.5/depth.txt`. The `depth.txt`
//! sidecar is a loose `key: value` file written by the scanning machine:
//!
//! ```text
//! from_depth: 0.0
//! to_depth: 100.5
//! scan_date: 2026-01-14T10:30:00Z
//! quality: good
//! machine: OREX-01
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::core::errors::Result;
use crate::core::paths::{join_share_path, normalize_base_path};
use crate::scanner::walker::ScanIssue;
use crate::share::session::ShareSession;

/// File name of the per-batch metadata sidecar.
pub const DEPTH_FILE_NAME: &str = "depth.txt";

/// Batch directories are `batch-{to}` with a numeric final depth.
static BATCH_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^batch-([0-9]+(?:\.[0-9]+)?)$").expect("batch directory pattern compiles")
});

/// Parsed `depth.txt` contents. Every field is optional: the parser is
/// deliberately forgiving because the scanning machines occasionally write
/// truncated files mid-scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthFile {
    pub from_depth: Option<f64>,
    pub to_depth: Option<f64>,
    pub machine: Option<String>,
    pub quality: Option<String>,
    pub scan_date: Option<DateTime<Utc>>,
}

/// Parse a `depth.txt` body. Unknown keys are ignored and malformed values
/// degrade to `None`; this never fails.
#[must_use]
pub fn parse_depth_file(raw: &str) -> DepthFile {
    let mut parsed = DepthFile::default();
    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "from_depth" => parsed.from_depth = value.parse::<f64>().ok(),
            "to_depth" => parsed.to_depth = value.parse::<f64>().ok(),
            "machine" => parsed.machine = Some(value.to_string()),
            "quality" => parsed.quality = Some(value.to_string()),
            "scan_date" => {
                parsed.scan_date = DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
            }
            _ => {}
        }
    }
    parsed
}

/// Extract the `{to}` value from a `batch-{to}` directory name.
#[must_use]
pub fn parse_batch_dir_name(name: &str) -> Option<f64> {
    BATCH_DIR
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// One batch discovered on the share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareBatch {
    pub hole_id: String,
    /// Final depth as named by the batch directory.
    pub batch_to: f64,
    pub depth_from: f64,
    pub depth_to: f64,
    pub machine_id: String,
    pub quality: String,
    pub scan_date: Option<DateTime<Utc>>,
    /// Share path of the `depth.txt` this record came from.
    pub path: String,
}

/// Outcome of a discovery pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    pub base_path: String,
    pub batches: Vec<ShareBatch>,
    pub errors: Vec<ScanIssue>,
    pub scanned_at: DateTime<Utc>,
}

/// Walks the two-level hole/batch layout and reads each batch's sidecar.
pub struct BatchScanner {
    base_path: String,
}

impl BatchScanner {
    #[must_use]
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: normalize_base_path(base_path),
        }
    }

    /// Discover every batch under the base path.
    ///
    /// Per-hole and per-batch failures are recorded and skipped; only
    /// connection and authentication failures abort discovery.
    pub fn discover(&self, session: &dyn ShareSession) -> Result<DiscoveryResult> {
        let mut batches = Vec::new();
        let mut errors = Vec::new();

        let holes = match session.list_dir(&self.base_path) {
            Ok(listing) => listing,
            Err(e) if e.is_fatal_for_scan() => return Err(e),
            Err(e) => {
                errors.push(ScanIssue {
                    path: self.base_path.clone(),
                    message: e.to_string(),
                });
                return Ok(self.result(batches, errors));
            }
        };

        for hole in holes.iter().filter(|h| h.is_directory) {
            self.scan_hole(session, &hole.name, &mut batches, &mut errors)?;
        }

        Ok(self.result(batches, errors))
    }

    /// Discover the batches of a single hole.
    pub fn for_hole(&self, session: &dyn ShareSession, hole_id: &str) -> Result<DiscoveryResult> {
        let mut batches = Vec::new();
        let mut errors = Vec::new();
        self.scan_hole(session, hole_id, &mut batches, &mut errors)?;
        Ok(self.result(batches, errors))
    }

    fn result(&self, batches: Vec<ShareBatch>, errors: Vec<ScanIssue>) -> DiscoveryResult {
        DiscoveryResult {
            base_path: self.base_path.clone(),
            batches,
            errors,
            scanned_at: Utc::now(),
        }
    }

    fn scan_hole(
        &self,
        session: &dyn ShareSession,
        hole_id: &str,
        batches: &mut Vec<ShareBatch>,
        errors: &mut Vec<ScanIssue>,
    ) -> Result<()> {
        let hole_path = join_share_path(&self.base_path, hole_id);
        let listing = match session.list_dir(&hole_path) {
            Ok(listing) => listing,
            Err(e) if e.is_fatal_for_scan() => return Err(e),
            Err(e) => {
                errors.push(ScanIssue {
                    path: hole_path,
                    message: e.to_string(),
                });
                return Ok(());
            }
        };

        for entry in listing.iter().filter(|e| e.is_directory) {
            let Some(batch_to) = parse_batch_dir_name(&entry.name) else {
                continue;
            };
            let depth_path =
                join_share_path(&join_share_path(&hole_path, &entry.name), DEPTH_FILE_NAME);

            let raw = match session.read_file(&depth_path) {
                Ok(raw) => raw,
                Err(e) if e.is_fatal_for_scan() => return Err(e),
                Err(e) => {
                    errors.push(ScanIssue {
                        path: depth_path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let parsed = parse_depth_file(&String::from_utf8_lossy(&raw));
            batches.push(ShareBatch {
                hole_id: hole_id.to_string(),
                batch_to,
                depth_from: parsed.from_depth.unwrap_or(0.0),
                depth_to: parsed.to_depth.unwrap_or(0.0),
                machine_id: parsed.machine.unwrap_or_else(|| "unknown".to_string()),
                quality: parsed.quality.unwrap_or_else(|| "good".to_string()),
                scan_date: parsed.scan_date,
                path: depth_path,
            });
        }

        Ok(())
    }
}
