//! Reconciliation of recomputed and pipeline-reported accuracy
//!
//! The viewer always shows its own recomputed accuracy. The pipeline's
//! `extraction_accuracy_pct` is kept alongside it and any large gap between
//! the two is flagged instead of silently dropped.

use serde::Serialize;
use tracing::warn;

use crate::completeness::Completeness;

/// Default gap, in percentage points, above which the two figures diverge
pub const DEFAULT_DIVERGENCE_THRESHOLD_PCT: f64 = 10.0;

/// Recomputed accuracy next to the pipeline-reported value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub recomputed_pct: f64,
    pub reported_pct: Option<f64>,
    /// Absolute difference, when a reported value exists
    pub divergence_pct: Option<f64>,
    pub diverges: bool,
}

/// Compare a completeness score with the pipeline-reported accuracy
///
/// A missing or non-finite reported value never diverges.
pub fn reconcile(
    document_id: &str,
    completeness: &Completeness,
    reported_pct: Option<f64>,
    threshold_pct: f64,
) -> AccuracyReport {
    let reported_pct = reported_pct.filter(|v| v.is_finite());
    let divergence_pct = reported_pct.map(|r| (r - completeness.accuracy_pct).abs());
    let diverges = divergence_pct.is_some_and(|d| d > threshold_pct);

    if diverges {
        warn!(
            document_id,
            recomputed = completeness.accuracy_pct,
            reported = ?reported_pct,
            "Reported extraction accuracy diverges from recomputed accuracy"
        );
    }

    AccuracyReport {
        recomputed_pct: completeness.accuracy_pct,
        reported_pct,
        divergence_pct,
        diverges,
    }
}
