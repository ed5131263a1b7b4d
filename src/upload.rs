//! Upload Client - Snapshot Persistence and Read Model
//!
//! ## Responsibilities
//!
//! - POST admitted frames to the detection endpoint as multipart form data
//! - GET the persisted detection list and project it into display plates
//! - Map the backend's `{error}` body onto a typed error
//!
//! Behind a trait so the controller can run against a stub in tests.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::Plate;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a successful snapshot upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// Detection record id, when the backend assigns one
    pub id: Option<i64>,
    /// Plates the backend found in the uploaded frame
    pub plate_count: usize,
}

/// Persistence boundary for admitted frames and the server-side read model
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persist one frame (raw JPEG bytes).
    async fn upload_frame(&self, frame: Vec<u8>) -> Result<UploadReceipt>;

    /// Fetch the persisted detection list, newest first.
    async fn fetch_persisted(&self) -> Result<Vec<Plate>>;
}

// ========================================
// HTTP implementation
// ========================================

/// Upload success body
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    plates: Vec<serde_json::Value>,
}

/// Backend error body
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
}

/// One persisted detection as returned by the read-model endpoint
#[derive(Debug, Deserialize)]
pub struct PersistedDetection {
    #[serde(default)]
    pub known_plate_number: Option<String>,
    #[serde(default)]
    pub plate_number_detected: Option<String>,
    #[serde(default)]
    pub best_ocr_text: Option<String>,
    #[serde(default)]
    pub best_ocr_confidence: Option<f64>,
    #[serde(default)]
    pub yolo_confidence: Option<f64>,
    #[serde(default)]
    pub detection_created_at: Option<String>,
    #[serde(default)]
    pub known_plate: Option<serde_json::Value>,
    #[serde(default)]
    pub plate_type: Option<String>,
    #[serde(default)]
    pub cropped_image_url: Option<String>,
}

impl PersistedDetection {
    /// Project onto the display model. Confidences are stored as
    /// fractions server-side; validity means the read matched a known
    /// plate record.
    pub fn into_plate(self) -> Plate {
        let is_valid = matches!(
            &self.known_plate,
            Some(v) if !v.is_null() && *v != serde_json::Value::Bool(false)
        );
        let text = self
            .known_plate_number
            .or(self.plate_number_detected)
            .or(self.best_ocr_text)
            .unwrap_or_else(|| "UNKNOWN".to_string());
        Plate {
            text,
            confidence: self.best_ocr_confidence.unwrap_or(0.0) * 100.0,
            yolo_confidence: self.yolo_confidence.unwrap_or(0.0) * 100.0,
            timestamp: self.detection_created_at.unwrap_or_default(),
            is_valid,
            plate_type: self.plate_type,
            cropped_image_url: self.cropped_image_url,
        }
    }
}

/// reqwest-backed sink against the backend REST API
pub struct HttpUploadClient {
    client: reqwest::Client,
    upload_url: String,
    plates_url: String,
}

impl HttpUploadClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            plates_url: config.plates_url.clone(),
        })
    }
}

#[async_trait]
impl SnapshotSink for HttpUploadClient {
    async fn upload_frame(&self, frame: Vec<u8>) -> Result<UploadReceipt> {
        let filename = format!("frame_{}.jpg", Utc::now().timestamp_millis());
        let part = reqwest::multipart::Part::bytes(frame)
            .file_name(filename)
            .mime_str("image/jpeg")
            .map_err(|e| Error::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("original_image", part);

        debug!(url = %self.upload_url, "Uploading frame");
        let resp = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let body: UploadResponse = resp.json().await?;
            info!(
                id = ?body.id,
                plates = body.plates.len(),
                "Frame persisted"
            );
            Ok(UploadReceipt {
                id: body.id,
                plate_count: body.plates.len(),
            })
        } else {
            let message = match resp.json::<ErrorResponse>().await {
                Ok(body) if !body.error.is_empty() => body.error,
                _ => format!("HTTP {}", status),
            };
            warn!(status = %status, error = %message, "Frame upload rejected");
            Err(Error::Upload(message))
        }
    }

    async fn fetch_persisted(&self) -> Result<Vec<Plate>> {
        debug!(url = %self.plates_url, "Fetching persisted detections");
        let resp = self.client.get(&self.plates_url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Query(format!("HTTP {}", status)));
        }

        let records: Vec<PersistedDetection> = resp.json().await?;
        Ok(records.into_iter().map(PersistedDetection::into_plate).collect())
    }
}
