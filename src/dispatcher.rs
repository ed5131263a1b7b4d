//! Message Dispatcher
//!
//! ## Responsibilities
//!
//! - One handler per inbound event discriminant
//! - Mutates session state and pushes display updates; upload admission
//!   stays with the controller
//! - Frames with detections become upload candidates whenever detection
//!   is enabled, whether or not the dedup window admitted them locally

use crate::protocol::{InboundEvent, Plate};
use crate::session::SessionState;
use crate::ui::{StatusLevel, UIProjection};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// What the controller should do after an event is handled
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Nothing beyond the handler's own effects
    None,
    /// Frame carried detections; offer it to the upload throttle
    UploadCandidate(String),
    /// Backend confirmed the channel; auto-start may fire
    Ready,
}

/// Routes inbound events into session mutations and display updates
pub struct MessageDispatcher {
    pub session: SessionState,
    ui: Arc<dyn UIProjection>,
}

impl MessageDispatcher {
    pub fn new(session: SessionState, ui: Arc<dyn UIProjection>) -> Self {
        Self { session, ui }
    }

    pub fn dispatch(&mut self, event: InboundEvent, now: DateTime<Utc>) -> DispatchOutcome {
        match event {
            InboundEvent::Frame { frame, plates } => self.on_frame(frame, plates, now),

            InboundEvent::CameraStarted { message } => {
                self.session.begin_capture(now);
                self.ui.status(
                    StatusLevel::Success,
                    if message.is_empty() {
                        "Camera started"
                    } else {
                        &message
                    },
                );
                self.ui.capture_active(true);
                self.ui.controls(false, true);
                self.render_session(now);
                DispatchOutcome::None
            }

            InboundEvent::CameraStopped { message } => {
                // Retained detections stay on display after a stop.
                self.ui.status(
                    StatusLevel::Info,
                    if message.is_empty() {
                        "Camera stopped"
                    } else {
                        &message
                    },
                );
                self.ui.capture_active(false);
                self.ui.controls(true, false);
                DispatchOutcome::None
            }

            InboundEvent::Error { message } => {
                self.ui.status(StatusLevel::Error, &message);
                self.ui.capture_active(false);
                self.ui.controls(true, false);
                DispatchOutcome::None
            }

            InboundEvent::Connection { message } => {
                self.ui.status(
                    StatusLevel::Info,
                    if message.is_empty() {
                        "Channel established"
                    } else {
                        &message
                    },
                );
                DispatchOutcome::Ready
            }

            InboundEvent::PlateDetectorReady { message } => {
                self.ui.status(
                    StatusLevel::Info,
                    if message.is_empty() {
                        "Plate detector ready"
                    } else {
                        &message
                    },
                );
                DispatchOutcome::None
            }

            InboundEvent::DetectionToggled { enabled } => {
                self.session.detection_enabled = enabled;
                self.ui.detection_enabled(enabled);
                DispatchOutcome::None
            }

            InboundEvent::Unknown => {
                debug!("Ignoring unrecognized event type");
                DispatchOutcome::None
            }
        }
    }

    fn on_frame(
        &mut self,
        frame: String,
        plates: Vec<crate::protocol::FramePlate>,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        // Every frame is displayed, detections or not.
        self.ui.show_frame(&frame);

        if !self.session.detection_enabled || plates.is_empty() {
            return DispatchOutcome::None;
        }

        let display_time = now.format("%H:%M:%S").to_string();
        let mut changed = false;
        for raw in plates {
            let plate: Plate = raw.into_plate(display_time.clone());
            if plate.text.is_empty() {
                continue;
            }
            changed |= self.session.record(plate, now);
        }
        if changed {
            self.render_session(now);
        }

        DispatchOutcome::UploadCandidate(frame)
    }

    /// Push the full detection list and recomputed stats.
    pub fn render_session(&self, now: DateTime<Utc>) {
        self.ui.render_plates(&self.session.plate_views());
        self.ui.render_stats(&self.session.stats(now));
    }
}
