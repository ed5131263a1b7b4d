//! UI Projection
//!
//! ## Responsibilities
//!
//! - One-way surface the core pushes display updates through
//! - The core never reads UI state back; every decision input lives in
//!   `SessionState` or the connection state machine
//!
//! The default projection renders to the tracing log. Tests substitute a
//! recording implementation.

use crate::protocol::Plate;
use crate::stats::SessionStats;
use std::fmt;
use tracing::{error, info};

/// Severity of a status banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::Info => write!(f, "info"),
            StatusLevel::Success => write!(f, "success"),
            StatusLevel::Error => write!(f, "error"),
        }
    }
}

/// Display surface for the client.
///
/// Implementations must tolerate calls from the event loop at frame rate;
/// `show_frame` in particular fires for every received frame.
pub trait UIProjection: Send + Sync {
    /// Status banner update
    fn status(&self, level: StatusLevel, message: &str);

    /// Capture session running or not
    fn capture_active(&self, active: bool);

    /// Detection toggle state
    fn detection_enabled(&self, enabled: bool);

    /// Latest video frame, base64-encoded JPEG
    fn show_frame(&self, frame_base64: &str);

    /// Full detection list, newest first
    fn render_plates(&self, plates: &[Plate]);

    /// Derived session statistics
    fn render_stats(&self, stats: &SessionStats);

    /// Which controls are actionable
    fn controls(&self, start_enabled: bool, stop_enabled: bool);
}

/// Projection that renders everything into the structured log
pub struct TracingProjection;

impl UIProjection for TracingProjection {
    fn status(&self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Error => error!(level = %level, "{}", message),
            _ => info!(level = %level, "{}", message),
        }
    }

    fn capture_active(&self, active: bool) {
        info!(active = active, "Capture session state changed");
    }

    fn detection_enabled(&self, enabled: bool) {
        info!(enabled = enabled, "Detection toggled");
    }

    fn show_frame(&self, frame_base64: &str) {
        // Frame-rate event; keep it out of the default log level.
        tracing::trace!(bytes = frame_base64.len(), "Frame received");
    }

    fn render_plates(&self, plates: &[Plate]) {
        if let Some(newest) = plates.first() {
            info!(
                count = plates.len(),
                plate = %newest.text,
                confidence = newest.confidence,
                "Detection list updated"
            );
        } else {
            info!(count = 0usize, "Detection list updated");
        }
    }

    fn render_stats(&self, stats: &SessionStats) {
        info!(
            total = stats.total,
            valid = stats.valid_count,
            avg_confidence = stats.average_confidence,
            per_minute = stats.rate_per_minute,
            "Session statistics"
        );
    }

    fn controls(&self, start_enabled: bool, stop_enabled: bool) {
        info!(
            start = start_enabled,
            stop = stop_enabled,
            "Controls updated"
        );
    }
}
