//! Wire protocol for the video-stream channel
//!
//! ## Responsibilities
//!
//! - Closed tagged unions for inbound events and outbound commands
//! - Boundary validation: anything that does not match a known shape is
//!   rejected here, never accessed optimistically downstream
//! - Unknown event types decode to `InboundEvent::Unknown` and are ignored
//!   by the dispatcher (forward compatibility)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One detection record as displayed and deduplicated by the client.
///
/// Immutable once recorded. Equality for dedup purposes is by `text` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub text: String,
    /// OCR confidence, 0-100
    pub confidence: f64,
    /// Detector-stage confidence, 0-100
    pub yolo_confidence: f64,
    /// Display timestamp as provided by the source
    pub timestamp: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cropped_image_url: Option<String>,
}

/// Plate payload as it appears inside a `frame` event.
///
/// The backend emits per-frame detections with raw detector fields;
/// `into_plate` normalizes them into the display model.
#[derive(Debug, Clone, Deserialize)]
pub struct FramePlate {
    #[serde(default)]
    pub plate_number: String,
    #[serde(default)]
    pub text: String,
    /// Detector confidence for the plate region
    #[serde(default)]
    pub confidence: f64,
    /// OCR confidence for the read text
    #[serde(default)]
    pub text_confidence: f64,
}

impl FramePlate {
    /// Normalize into the display model. Confidences arrive either as
    /// fractions (0-1) or percentages depending on the backend build;
    /// both map onto the 0-100 scale.
    pub fn into_plate(self, timestamp: String) -> Plate {
        let text = if self.text.is_empty() {
            self.plate_number
        } else {
            self.text
        };
        Plate {
            text,
            confidence: as_percent(self.text_confidence),
            yolo_confidence: as_percent(self.confidence),
            timestamp,
            is_valid: false,
            plate_type: None,
            cropped_image_url: None,
        }
    }
}

fn as_percent(v: f64) -> f64 {
    if v <= 1.0 {
        v * 100.0
    } else {
        v
    }
}

/// Inbound events, discriminated by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Frame {
        #[serde(default)]
        frame: String,
        #[serde(default)]
        plates: Vec<FramePlate>,
    },
    CameraStarted {
        #[serde(default)]
        message: String,
    },
    CameraStopped {
        #[serde(default)]
        message: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    Connection {
        #[serde(default)]
        message: String,
    },
    PlateDetectorReady {
        #[serde(default)]
        message: String,
    },
    DetectionToggled {
        enabled: bool,
    },
    /// Any event type this client does not know about
    #[serde(other)]
    Unknown,
}

/// Outbound user commands, discriminated by `command`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum OutboundCommand {
    StartCamera {
        camera_id: u32,
        detection_enabled: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_type: Option<String>,
    },
    StopCamera,
    ToggleDetection {
        enabled: bool,
    },
}

/// Decode one inbound text frame.
///
/// Malformed payloads are a boundary error: callers log and drop them
/// without tearing down the connection.
pub fn decode_event(text: &str) -> Result<InboundEvent> {
    serde_json::from_str(text).map_err(|e| Error::Decode(e.to_string()))
}
