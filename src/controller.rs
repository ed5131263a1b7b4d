//! Session Controller
//!
//! ## Responsibilities
//!
//! - Single event loop over socket events, upload completions and shutdown
//! - Upload admission: throttle-gated, one outstanding upload at a time
//! - Post-upload read-model refresh replacing the local detection set
//! - Auto-start and graceful stop of the capture session
//! - Hands out a `SessionHandle` so callers can relay user commands
//!
//! Uploads run on a spawned task and report back through a channel, so
//! every piece of session state is mutated from this loop only.

use crate::config::ClientConfig;
use crate::connection::transitions::ConnectionState;
use crate::connection::ConnectionManager;
use crate::dispatcher::{DispatchOutcome, MessageDispatcher};
use crate::error::{Error, Result};
use crate::protocol::OutboundCommand;
use crate::session::SessionState;
use crate::ui::{StatusLevel, UIProjection};
use crate::upload::{SnapshotSink, UploadReceipt};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{info, warn};

/// Gate for user-initiated commands. Commands are refused while the
/// connection is anything but open.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<OutboundCommand>,
    link_state: Arc<RwLock<ConnectionState>>,
    ui: Arc<dyn UIProjection>,
}

impl SessionHandle {
    pub async fn send_command(&self, command: OutboundCommand) -> Result<()> {
        if *self.link_state.read().await != ConnectionState::Open {
            self.ui
                .status(StatusLevel::Error, "Not connected to the video stream");
            return Err(Error::NotConnected);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::NotConnected)
    }

    /// Relay a start_camera for the given capture settings.
    pub async fn start_camera(
        &self,
        camera_id: u32,
        detection_enabled: bool,
    ) -> Result<()> {
        self.send_command(OutboundCommand::StartCamera {
            camera_id,
            detection_enabled,
            source_type: None,
        })
        .await
    }

    /// Relay a stop_camera.
    pub async fn stop_camera(&self) -> Result<()> {
        self.send_command(OutboundCommand::StopCamera).await
    }

    /// Relay a detection toggle.
    pub async fn toggle_detection(&self, enabled: bool) -> Result<()> {
        self.send_command(OutboundCommand::ToggleDetection { enabled })
            .await
    }
}

/// Owns the event loop for one client session
pub struct SessionController {
    config: ClientConfig,
    ui: Arc<dyn UIProjection>,
    sink: Arc<dyn SnapshotSink>,
    manager: Option<ConnectionManager>,
    command_tx: mpsc::Sender<OutboundCommand>,
    command_rx: Option<mpsc::Receiver<OutboundCommand>>,
    link_state: Arc<RwLock<ConnectionState>>,
}

impl SessionController {
    pub fn new(
        config: ClientConfig,
        ui: Arc<dyn UIProjection>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let manager = ConnectionManager::new(config.ws_url.clone(), ui.clone());
        let link_state = manager.state_handle();
        Self {
            config,
            ui,
            sink,
            manager: Some(manager),
            command_tx,
            command_rx: Some(command_rx),
            link_state,
        }
    }

    /// Command gate for callers. Valid before and during `run`; commands
    /// sent while the connection is not open are refused.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            commands: self.command_tx.clone(),
            link_state: self.link_state.clone(),
            ui: self.ui.clone(),
        }
    }

    /// Run until the connection gives up or shutdown is signaled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let Some(manager) = self.manager.take() else {
            return Err(Error::Config("controller already running".to_string()));
        };
        let Some(command_rx) = self.command_rx.take() else {
            return Err(Error::Config("controller already running".to_string()));
        };

        let (event_tx, mut event_rx) = mpsc::channel(64);
        // The manager gets its own close signal so a final stop_camera is
        // queued before the socket is told to close.
        let (close_tx, close_rx) = watch::channel(false);
        let conn_task = tokio::spawn(manager.run(event_tx, command_rx, close_rx));

        let handle = self.handle();
        let mut dispatcher = MessageDispatcher::new(
            SessionState::new(self.config.detection_enabled, Utc::now()),
            self.ui.clone(),
        );
        self.ui.controls(true, false);
        self.ui.detection_enabled(self.config.detection_enabled);

        // Seed the display from the read model before any frame arrives.
        match self.sink.fetch_persisted().await {
            Ok(plates) => {
                dispatcher.session.replace_all(plates, Utc::now());
                dispatcher.render_session(Utc::now());
            }
            Err(e) => {
                self.ui.status(
                    StatusLevel::Error,
                    &format!("Could not load detections: {}", e),
                );
            }
        }

        let (upload_tx, mut upload_rx) = mpsc::channel::<Result<UploadReceipt>>(4);
        let mut auto_started = false;

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        // Connection manager gave up; nothing more will come.
                        break;
                    };
                    let now = Utc::now();
                    match dispatcher.dispatch(event, now) {
                        DispatchOutcome::UploadCandidate(frame_base64) => {
                            self.maybe_upload(&mut dispatcher, frame_base64, &upload_tx);
                        }
                        DispatchOutcome::Ready => {
                            if self.config.auto_start && !auto_started {
                                auto_started = true;
                                if let Err(e) = handle
                                    .start_camera(
                                        self.config.camera_id,
                                        self.config.detection_enabled,
                                    )
                                    .await
                                {
                                    warn!(error = %e, "Auto-start failed");
                                }
                            }
                        }
                        DispatchOutcome::None => {}
                    }
                }

                completed = upload_rx.recv() => {
                    if let Some(result) = completed {
                        dispatcher.session.throttle.complete();
                        self.on_upload_done(&mut dispatcher, result).await;
                    }
                }

                _ = shutdown.changed() => {
                    info!("Shutting down");
                    if *self.link_state.read().await == ConnectionState::Open {
                        let _ = self.command_tx.send(OutboundCommand::StopCamera).await;
                    }
                    let _ = close_tx.send(true);
                    break;
                }
            }
        }

        let _ = conn_task.await;
        Ok(())
    }

    /// Offer a frame to the throttle; spawn the upload if admitted.
    /// The payload is decoded first so a bad frame costs no throttle slot.
    fn maybe_upload(
        &self,
        dispatcher: &mut MessageDispatcher,
        frame_base64: String,
        upload_tx: &mpsc::Sender<Result<UploadReceipt>>,
    ) {
        let bytes = match BASE64.decode(frame_base64.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Frame payload is not valid base64");
                return;
            }
        };
        if !dispatcher.session.throttle.try_admit(Utc::now()) {
            return;
        }

        let sink = self.sink.clone();
        let tx = upload_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(sink.upload_frame(bytes).await).await;
        });
    }

    /// Handle an upload completion: refresh the read model on success,
    /// leave the local set untouched on any failure.
    async fn on_upload_done(
        &self,
        dispatcher: &mut MessageDispatcher,
        result: Result<UploadReceipt>,
    ) {
        match result {
            Ok(receipt) => {
                self.ui.status(
                    StatusLevel::Success,
                    &format!("Frame saved ({} plates)", receipt.plate_count),
                );
                match self.sink.fetch_persisted().await {
                    Ok(plates) => {
                        dispatcher.session.replace_all(plates, Utc::now());
                        dispatcher.render_session(Utc::now());
                    }
                    Err(e) => {
                        // Local set stays as-is until the next refresh.
                        self.ui.status(
                            StatusLevel::Error,
                            &format!("Could not refresh detections: {}", e),
                        );
                    }
                }
            }
            Err(e) => {
                self.ui
                    .status(StatusLevel::Error, &format!("Frame save failed: {}", e));
            }
        }
    }
}
