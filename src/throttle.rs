//! Frame Throttler - Upload Admission
//!
//! ## Responsibilities
//!
//! - Enforce a minimum interval between snapshot uploads
//! - Single-flight: at most one upload outstanding at a time
//! - Interval resets when a new capture session begins

use chrono::{DateTime, Utc};

/// Minimum spacing between admitted uploads
pub const MIN_UPLOAD_INTERVAL_MS: i64 = 5000;

/// Upload admission state for one capture session
#[derive(Debug, Clone, Default)]
pub struct FrameThrottler {
    in_flight: bool,
    last_upload_at: Option<DateTime<Utc>>,
}

impl FrameThrottler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or reject an upload candidate.
    ///
    /// Admission stamps the interval clock and takes the in-flight slot,
    /// so a rejected candidate has no effect on later decisions.
    pub fn try_admit(&mut self, now: DateTime<Utc>) -> bool {
        if self.in_flight {
            return false;
        }
        if let Some(last) = self.last_upload_at {
            if now.signed_duration_since(last).num_milliseconds() < MIN_UPLOAD_INTERVAL_MS {
                return false;
            }
        }
        self.in_flight = true;
        self.last_upload_at = Some(now);
        true
    }

    /// Release the in-flight slot. Called on success and failure alike.
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Forget the interval clock so the first frame of a new capture
    /// session is immediately eligible. Does not touch the in-flight slot.
    pub fn reset_interval(&mut self) {
        self.last_upload_at = None;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}
