//! Session Statistics
//!
//! ## Responsibilities
//!
//! - Derive display statistics from the retained detection set
//! - Always a full recompute over current records, never incremental
//! - An empty set yields all-zero stats

use crate::session::RecordedPlate;
use chrono::{DateTime, Utc};

/// Derived statistics for the current capture session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionStats {
    pub total: usize,
    pub valid_count: usize,
    /// Mean OCR confidence over all retained records, 0-100
    pub average_confidence: f64,
    /// Detections per elapsed minute since the session started
    pub rate_per_minute: f64,
}

/// Recompute statistics over the retained set.
pub fn recompute<'a, I>(
    records: I,
    session_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SessionStats
where
    I: IntoIterator<Item = &'a RecordedPlate>,
{
    let mut total = 0usize;
    let mut valid_count = 0usize;
    let mut confidence_sum = 0.0f64;

    for r in records {
        total += 1;
        confidence_sum += r.plate.confidence;
        if r.plate.is_valid {
            valid_count += 1;
        }
    }

    if total == 0 {
        return SessionStats::default();
    }

    let elapsed_minutes = now.signed_duration_since(session_start).num_milliseconds() as f64
        / 60_000.0;
    let rate_per_minute = if elapsed_minutes > 0.0 {
        total as f64 / elapsed_minutes
    } else {
        0.0
    };

    SessionStats {
        total,
        valid_count,
        average_confidence: confidence_sum / total as f64,
        rate_per_minute,
    }
}
