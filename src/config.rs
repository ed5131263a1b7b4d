//! Client configuration
//!
//! Environment-driven settings for the stream endpoint, persistence API
//! and capture defaults.

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint for the video/detection stream
    pub ws_url: String,
    /// Snapshot persistence endpoint (multipart POST)
    pub upload_url: String,
    /// Read-model endpoint returning persisted detections
    pub plates_url: String,
    /// Camera index passed to start_camera
    pub camera_id: u32,
    /// Initial detection toggle state
    pub detection_enabled: bool,
    /// Send start_camera automatically once the backend confirms the connection
    pub auto_start: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: std::env::var("PLATEWATCH_WS_URL")
                .unwrap_or_else(|_| "ws://localhost:8000/ws/video-stream/".to_string()),
            upload_url: std::env::var("PLATEWATCH_UPLOAD_URL").unwrap_or_else(|_| {
                "http://localhost:8000/api/detections/detect_plates/".to_string()
            }),
            plates_url: std::env::var("PLATEWATCH_PLATES_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api/detected-plates/".to_string()),
            camera_id: std::env::var("PLATEWATCH_CAMERA_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            detection_enabled: std::env::var("PLATEWATCH_DETECTION_ENABLED")
                .map(|v| v != "false")
                .unwrap_or(true),
            auto_start: std::env::var("PLATEWATCH_AUTO_START")
                .map(|v| v != "false")
                .unwrap_or(true),
        }
    }
}
