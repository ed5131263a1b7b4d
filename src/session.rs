//! Session State - Retained Detections
//!
//! ## Responsibilities
//!
//! - Own the capped, most-recent-first set of detections on display
//! - Apply the deduplication window before admitting a new record
//! - Track the detection toggle, session start and upload throttle
//!
//! The set is cleared when a capture session starts and kept when it
//! stops, so a finished session stays reviewable.

use crate::protocol::Plate;
use crate::stats::{self, SessionStats};
use crate::dedup;
use crate::throttle::FrameThrottler;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Cap on retained detections; oldest are dropped first
pub const MAX_RETAINED_PLATES: usize = 50;

/// One retained detection with its local arrival stamp.
///
/// `recorded_at` drives the dedup window; the plate's own timestamp is
/// display-only and comes from the source.
#[derive(Debug, Clone)]
pub struct RecordedPlate {
    pub plate: Plate,
    pub recorded_at: DateTime<Utc>,
}

/// Mutable state for one client session
#[derive(Debug)]
pub struct SessionState {
    /// Front is newest
    plates: VecDeque<RecordedPlate>,
    pub detection_enabled: bool,
    session_start: DateTime<Utc>,
    pub throttle: FrameThrottler,
}

impl SessionState {
    pub fn new(detection_enabled: bool, now: DateTime<Utc>) -> Self {
        Self {
            plates: VecDeque::new(),
            detection_enabled,
            session_start: now,
            throttle: FrameThrottler::new(),
        }
    }

    /// A capture session has started: clear the set, restart the session
    /// clock and make the first frame upload-eligible.
    pub fn begin_capture(&mut self, now: DateTime<Utc>) {
        self.plates.clear();
        self.session_start = now;
        self.throttle.reset_interval();
    }

    /// Record one plate read unless the dedup window suppresses it.
    /// Returns whether the set changed.
    pub fn record(&mut self, plate: Plate, now: DateTime<Utc>) -> bool {
        if dedup::is_duplicate(&self.plates, &plate.text, now) {
            return false;
        }
        self.plates.push_front(RecordedPlate {
            plate,
            recorded_at: now,
        });
        self.plates.truncate(MAX_RETAINED_PLATES);
        true
    }

    /// Replace the whole set with server records, newest first.
    /// Server records share one arrival stamp; the window they open keeps
    /// the stream from immediately re-adding what the server just returned.
    pub fn replace_all(&mut self, plates: Vec<Plate>, now: DateTime<Utc>) {
        self.plates = plates
            .into_iter()
            .map(|plate| RecordedPlate {
                plate,
                recorded_at: now,
            })
            .collect();
        self.plates.truncate(MAX_RETAINED_PLATES);
    }

    pub fn plates(&self) -> impl Iterator<Item = &RecordedPlate> {
        self.plates.iter()
    }

    pub fn plate_views(&self) -> Vec<Plate> {
        self.plates.iter().map(|r| r.plate.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        stats::recompute(&self.plates, self.session_start, now)
    }
}
