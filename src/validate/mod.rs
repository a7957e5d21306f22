//! Discrepancy validation: operator-entered batch records vs share data.
//!
//! Mismatches are data, not errors — callers get a structured list of
//! [`Discrepancy`] values and decide what to flag.

use serde::Serialize;

use crate::scanner::batches::ShareBatch;

/// Absolute tolerance for depth comparisons, in depth units (metres).
pub const DEPTH_TOLERANCE: f64 = 0.1;

/// Depth range beyond which a batch is considered suspicious.
const UNUSUAL_DEPTH_RANGE: f64 = 1000.0;

/// An operator-entered batch record. Storage of these records belongs to
/// the caller; the validator only reads them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub hole_id: String,
    pub machine_id: String,
    pub depth_from: f64,
    pub depth_to: f64,
}

/// Presence/shape check for retrieved data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Data was present at all (not a missing/null retrieval).
    pub exists: bool,
    /// Present and non-empty.
    pub valid: bool,
    pub count: usize,
    pub message: String,
}

/// Check that retrieved data exists and is non-empty.
///
/// `None` → neither exists nor valid; `Some(&[])` → exists but empty;
/// anything else → valid with its element count.
#[must_use]
pub fn verify_data_exists<T>(data: Option<&[T]>, label: &str) -> VerificationResult {
    match data {
        None => VerificationResult {
            exists: false,
            valid: false,
            count: 0,
            message: format!("{label}: no data retrieved"),
        },
        Some(items) if items.is_empty() => VerificationResult {
            exists: true,
            valid: false,
            count: 0,
            message: format!("{label}: retrieved but empty"),
        },
        Some(items) => VerificationResult {
            exists: true,
            valid: true,
            count: items.len(),
            message: format!("{label}: {} record(s)", items.len()),
        },
    }
}

/// One detected mismatch between a record and the share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub field: String,
    pub expected: String,
    pub actual: String,
    pub message: String,
}

/// Outcome of validating one batch record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub has_discrepancies: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub message: String,
}

/// A suspicious batch record found without consulting the share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub hole_id: String,
    pub kind: AnomalyKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    InvalidDepthRange,
    UnusualDepthRange,
}

/// Compares batch records against batches discovered on the share.
#[derive(Debug, Default)]
pub struct BatchValidator;

impl BatchValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate one record against the share's discovered batches.
    ///
    /// When the hole is absent from the share entirely the result carries a
    /// single hole-level discrepancy instead of per-field noise. Depth
    /// fields compare within [`DEPTH_TOLERANCE`]; machine data that the
    /// share never recorded (all `unknown`) is skipped rather than flagged.
    #[must_use]
    pub fn validate_batch(&self, batch: &BatchRecord, discovered: &[ShareBatch]) -> ValidationResult {
        let matched: Vec<&ShareBatch> = discovered
            .iter()
            .filter(|b| b.hole_id == batch.hole_id)
            .collect();

        if matched.is_empty() {
            let discrepancy = Discrepancy {
                field: "hole_id".to_string(),
                expected: batch.hole_id.clone(),
                actual: String::new(),
                message: format!("no data found on the share for hole {}", batch.hole_id),
            };
            return ValidationResult {
                has_discrepancies: true,
                message: discrepancy.message.clone(),
                discrepancies: vec![discrepancy],
            };
        }

        let mut discrepancies = Vec::new();
        self.check_machine(batch, &matched, &mut discrepancies);
        self.check_depth_range(batch, &matched, &mut discrepancies);

        let has_discrepancies = !discrepancies.is_empty();
        let message = if has_discrepancies {
            format!(
                "found {} discrepancy(ies) for hole {}",
                discrepancies.len(),
                batch.hole_id
            )
        } else {
            format!("share data is consistent for hole {}", batch.hole_id)
        };
        ValidationResult {
            has_discrepancies,
            discrepancies,
            message,
        }
    }

    fn check_machine(
        &self,
        batch: &BatchRecord,
        matched: &[&ShareBatch],
        discrepancies: &mut Vec<Discrepancy>,
    ) {
        let mut machines: Vec<&str> = matched
            .iter()
            .map(|b| b.machine_id.as_str())
            .filter(|m| !m.is_empty() && *m != "unknown")
            .collect();
        machines.sort_unstable();
        machines.dedup();

        // The scanning machine doesn't always stamp itself into the sidecar;
        // an all-unknown subtree proves nothing either way.
        if machines.is_empty() {
            return;
        }

        if !machines.iter().any(|m| *m == batch.machine_id) {
            discrepancies.push(Discrepancy {
                field: "machine_id".to_string(),
                expected: batch.machine_id.clone(),
                actual: machines.join(", "),
                message: format!(
                    "machine {} not among machines recorded on the share",
                    batch.machine_id
                ),
            });
        }
    }

    fn check_depth_range(
        &self,
        batch: &BatchRecord,
        matched: &[&ShareBatch],
        discrepancies: &mut Vec<Discrepancy>,
    ) {
        let share_from = matched
            .iter()
            .map(|b| b.depth_from)
            .filter(|d| *d > 0.0)
            .fold(f64::INFINITY, f64::min);
        let share_to = matched
            .iter()
            .map(|b| b.depth_to)
            .filter(|d| *d > 0.0)
            .fold(f64::NEG_INFINITY, f64::max);

        // Sidecars without usable depth data prove nothing either way.
        if !share_from.is_finite() && !share_to.is_finite() {
            return;
        }

        if share_from.is_finite() && (batch.depth_from - share_from).abs() > DEPTH_TOLERANCE {
            discrepancies.push(Discrepancy {
                field: "depth_from".to_string(),
                expected: format!("{:.2}", batch.depth_from),
                actual: format!("{share_from:.2}"),
                message: format!(
                    "recorded start depth {:.2} differs from share data {share_from:.2}",
                    batch.depth_from
                ),
            });
        }
        if share_to.is_finite() && (batch.depth_to - share_to).abs() > DEPTH_TOLERANCE {
            discrepancies.push(Discrepancy {
                field: "depth_to".to_string(),
                expected: format!("{:.2}", batch.depth_to),
                actual: format!("{share_to:.2}"),
                message: format!(
                    "recorded final depth {:.2} differs from share data {share_to:.2}",
                    batch.depth_to
                ),
            });
        }
    }

    /// Flag records that are internally inconsistent, share or no share.
    #[must_use]
    pub fn detect_anomalies(&self, records: &[BatchRecord]) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for record in records {
            if record.depth_from >= record.depth_to {
                anomalies.push(Anomaly {
                    hole_id: record.hole_id.clone(),
                    kind: AnomalyKind::InvalidDepthRange,
                    message: format!(
                        "invalid depth range: {:.2} >= {:.2}",
                        record.depth_from, record.depth_to
                    ),
                });
            }
            if record.depth_to - record.depth_from > UNUSUAL_DEPTH_RANGE {
                anomalies.push(Anomaly {
                    hole_id: record.hole_id.clone(),
                    kind: AnomalyKind::UnusualDepthRange,
                    message: format!(
                        "unusually large depth range: {:.2}m",
                        record.depth_to - record.depth_from
                    ),
                });
            }
        }
        anomalies
    }
}
