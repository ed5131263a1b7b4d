//! End-to-end flows through decode, dispatch, throttle and session state.

use chrono::{DateTime, Duration, Utc};
use platewatch::dispatcher::{DispatchOutcome, MessageDispatcher};
use platewatch::protocol::{decode_event, Plate};
use platewatch::session::{SessionState, MAX_RETAINED_PLATES};
use platewatch::stats::SessionStats;
use platewatch::throttle::MIN_UPLOAD_INTERVAL_MS;
use platewatch::ui::{StatusLevel, UIProjection};
use platewatch::upload::{SnapshotSink, UploadReceipt};
use std::sync::{Arc, Mutex};

// ========================================
// Test doubles
// ========================================

#[derive(Debug, Clone, PartialEq)]
enum UiCall {
    Status(StatusLevel, String),
    CaptureActive(bool),
    DetectionEnabled(bool),
    ShowFrame,
    RenderPlates(Vec<String>),
    RenderStats(SessionStats),
    Controls(bool, bool),
}

#[derive(Default)]
struct RecordingProjection {
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingProjection {
    fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: UiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl UIProjection for RecordingProjection {
    fn status(&self, level: StatusLevel, message: &str) {
        self.push(UiCall::Status(level, message.to_string()));
    }
    fn capture_active(&self, active: bool) {
        self.push(UiCall::CaptureActive(active));
    }
    fn detection_enabled(&self, enabled: bool) {
        self.push(UiCall::DetectionEnabled(enabled));
    }
    fn show_frame(&self, _frame_base64: &str) {
        self.push(UiCall::ShowFrame);
    }
    fn render_plates(&self, plates: &[Plate]) {
        self.push(UiCall::RenderPlates(
            plates.iter().map(|p| p.text.clone()).collect(),
        ));
    }
    fn render_stats(&self, stats: &SessionStats) {
        self.push(UiCall::RenderStats(*stats));
    }
    fn controls(&self, start_enabled: bool, stop_enabled: bool) {
        self.push(UiCall::Controls(start_enabled, stop_enabled));
    }
}

struct StubSink {
    persisted: Mutex<Vec<Plate>>,
    uploads: Mutex<usize>,
}

impl StubSink {
    fn with_persisted(plates: Vec<Plate>) -> Self {
        Self {
            persisted: Mutex::new(plates),
            uploads: Mutex::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotSink for StubSink {
    async fn upload_frame(&self, _frame: Vec<u8>) -> platewatch::Result<UploadReceipt> {
        *self.uploads.lock().unwrap() += 1;
        Ok(UploadReceipt {
            id: Some(1),
            plate_count: 1,
        })
    }

    async fn fetch_persisted(&self) -> platewatch::Result<Vec<Plate>> {
        Ok(self.persisted.lock().unwrap().clone())
    }
}

// ========================================
// Helpers
// ========================================

fn t0() -> DateTime<Utc> {
    "2026-01-01T12:00:00Z".parse().unwrap()
}

fn frame_json(plate: &str) -> String {
    format!(
        r#"{{"type":"frame","frame":"aGVsbG8=","plates":[{{"plate_number":"{plate}","confidence":0.9,"text":"{plate}","text_confidence":0.85}}]}}"#
    )
}

fn server_plate(text: &str, is_valid: bool) -> Plate {
    Plate {
        text: text.to_string(),
        confidence: 92.0,
        yolo_confidence: 88.0,
        timestamp: "2026-01-01T11:59:00Z".to_string(),
        is_valid,
        plate_type: None,
        cropped_image_url: None,
    }
}

fn new_dispatcher(ui: Arc<RecordingProjection>) -> MessageDispatcher {
    MessageDispatcher::new(SessionState::new(true, t0()), ui)
}

// ========================================
// Flows
// ========================================

#[test]
fn capture_flow_records_dedups_and_reports_stats() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui.clone());

    let started = decode_event(r#"{"type":"camera_started","message":"Camera 0 started"}"#).unwrap();
    dispatcher.dispatch(started, t0());

    // Three frames: two distinct plates plus one in-window repeat.
    let mut now = t0() + Duration::seconds(1);
    for (plate, step_ms) in [("ABC1234", 0), ("ABC1234", 1000), ("XYZ9876", 500)] {
        now = now + Duration::milliseconds(step_ms);
        let event = decode_event(&frame_json(plate)).unwrap();
        dispatcher.dispatch(event, now);
    }

    assert_eq!(dispatcher.session.len(), 2);

    let calls = ui.calls();
    assert!(calls.contains(&UiCall::Status(
        StatusLevel::Success,
        "Camera 0 started".to_string()
    )));
    assert!(calls.contains(&UiCall::CaptureActive(true)));
    assert!(calls.contains(&UiCall::Controls(false, true)));

    // Newest plate leads the last rendered list.
    let last_render = calls
        .iter()
        .rev()
        .find_map(|c| match c {
            UiCall::RenderPlates(texts) => Some(texts.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_render, vec!["XYZ9876", "ABC1234"]);

    let last_stats = calls
        .iter()
        .rev()
        .find_map(|c| match c {
            UiCall::RenderStats(s) => Some(*s),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_stats.total, 2);
    assert!((last_stats.average_confidence - 85.0).abs() < 1e-9);
}

#[test]
fn detection_toggle_off_stops_recording_and_uploading() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui.clone());

    let toggle = decode_event(r#"{"type":"detection_toggled","enabled":false}"#).unwrap();
    dispatcher.dispatch(toggle, t0());

    let event = decode_event(&frame_json("ABC1234")).unwrap();
    let outcome = dispatcher.dispatch(event, t0() + Duration::seconds(1));

    assert_eq!(outcome, DispatchOutcome::None);
    assert_eq!(dispatcher.session.len(), 0);
    // The frame itself is still displayed.
    assert!(ui.calls().contains(&UiCall::ShowFrame));
}

#[test]
fn camera_stop_keeps_detections_and_resets_controls() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui.clone());

    dispatcher.dispatch(decode_event(&frame_json("ABC1234")).unwrap(), t0());
    let stopped = decode_event(r#"{"type":"camera_stopped","message":"Camera stopped"}"#).unwrap();
    dispatcher.dispatch(stopped, t0() + Duration::seconds(10));

    assert_eq!(dispatcher.session.len(), 1);
    let calls = ui.calls();
    assert!(calls.contains(&UiCall::CaptureActive(false)));
    assert!(calls.contains(&UiCall::Controls(true, false)));
}

#[test]
fn restart_clears_previous_session() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui);

    dispatcher.dispatch(decode_event(&frame_json("ABC1234")).unwrap(), t0());
    dispatcher.dispatch(
        decode_event(r#"{"type":"camera_started","message":""}"#).unwrap(),
        t0() + Duration::minutes(1),
    );
    assert_eq!(dispatcher.session.len(), 0);

    // First frame of the new session is immediately upload-eligible even
    // though an upload happened moments before the restart.
    let now = t0() + Duration::minutes(1) + Duration::seconds(1);
    assert!(dispatcher.session.throttle.try_admit(now));
}

#[test]
fn malformed_message_is_dropped_without_poisoning_the_stream() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui);

    assert!(decode_event("{broken json").is_err());
    assert!(decode_event(r#"{"plates": []}"#).is_err());

    // A later valid frame still flows through.
    let outcome = dispatcher.dispatch(decode_event(&frame_json("ABC1234")).unwrap(), t0());
    assert!(matches!(outcome, DispatchOutcome::UploadCandidate(_)));
}

#[test]
fn upload_admission_respects_interval_across_frames() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui);

    let mut admitted = 0;
    for i in 0..10 {
        let now = t0() + Duration::milliseconds(i * 1000);
        let outcome = dispatcher.dispatch(
            decode_event(&frame_json(&format!("PLT{:04}", i))).unwrap(),
            now,
        );
        if matches!(outcome, DispatchOutcome::UploadCandidate(_))
            && dispatcher.session.throttle.try_admit(now)
        {
            admitted += 1;
            dispatcher.session.throttle.complete();
        }
    }

    // Ten frames at 1 Hz with a 5 s floor: admissions at 0s and 5s only.
    assert_eq!(MIN_UPLOAD_INTERVAL_MS, 5000);
    assert_eq!(admitted, 2);
}

#[test]
fn detection_set_is_capped_newest_first() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui);

    for i in 0..(MAX_RETAINED_PLATES + 5) {
        let now = t0() + Duration::seconds(10 * i as i64);
        dispatcher.dispatch(
            decode_event(&frame_json(&format!("PLT{:04}", i))).unwrap(),
            now,
        );
    }

    assert_eq!(dispatcher.session.len(), MAX_RETAINED_PLATES);
    let newest = dispatcher.session.plates().next().unwrap();
    assert_eq!(newest.plate.text, format!("PLT{:04}", MAX_RETAINED_PLATES + 4));
}

#[tokio::test]
async fn successful_upload_refresh_replaces_local_set() {
    let ui = Arc::new(RecordingProjection::default());
    let mut dispatcher = new_dispatcher(ui);
    let sink = StubSink::with_persisted(vec![
        server_plate("ABC1234", true),
        server_plate("XYZ9876", false),
    ]);

    dispatcher.dispatch(decode_event(&frame_json("LOCAL01")).unwrap(), t0());
    assert_eq!(dispatcher.session.len(), 1);

    let receipt = sink.upload_frame(vec![0xFF, 0xD8]).await.unwrap();
    assert_eq!(receipt.plate_count, 1);

    let persisted = sink.fetch_persisted().await.unwrap();
    let now = t0() + Duration::seconds(2);
    dispatcher.session.replace_all(persisted, now);

    let texts: Vec<_> = dispatcher
        .session
        .plates()
        .map(|r| r.plate.text.clone())
        .collect();
    assert_eq!(texts, vec!["ABC1234", "XYZ9876"]);

    let stats = dispatcher.session.stats(now);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.valid_count, 1);
}
