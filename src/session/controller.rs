use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::clock::format_time;
use super::config::SessionConfig;
use super::stats::{SessionOutcome, SessionSummary};
use crate::audio::{CaptureSource, CaptureStream, Fragment};
use crate::upload::{Payload, UploadSink};
use crate::widget::{ControlPosture, WidgetView};

/// Shown when the capture device cannot be acquired or started
pub const DEVICE_ERROR_MESSAGE: &str =
    "Unable to access microphone. Please ensure microphone permissions are granted.";

/// Shown when the recording could not be delivered
pub const UPLOAD_ERROR_MESSAGE: &str = "Failed to upload audio. Please try again.";

enum SessionState {
    Idle,
    Recording(ActiveSession),
}

struct ActiveSession {
    id: Uuid,
    stop_tx: Option<oneshot::Sender<()>>,
}

struct Shared {
    source: Arc<dyn CaptureSource>,
    sink: Arc<dyn UploadSink>,
    view: Arc<dyn WidgetView>,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

/// Drives one recording at a time: capture, elapsed-time display, upload
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct RecordingController {
    shared: Arc<Shared>,
}

impl RecordingController {
    /// Create a controller and put the view in the idle posture
    pub fn new(
        source: Arc<dyn CaptureSource>,
        sink: Arc<dyn UploadSink>,
        view: Arc<dyn WidgetView>,
        config: SessionConfig,
    ) -> Self {
        ControlPosture::Idle.apply(view.as_ref());

        Self {
            shared: Arc::new(Shared {
                source,
                sink,
                view,
                config,
                state: Mutex::new(SessionState::Idle),
            }),
        }
    }

    /// Start a recording session
    ///
    /// The controls switch to the recording posture before this returns; the
    /// device request and everything after it runs on a spawned task whose
    /// handle may be dropped. Returns `None` if a session is already active.
    pub fn start(&self) -> Option<JoinHandle<SessionSummary>> {
        let (id, stop_rx) = {
            let mut state = self.state();
            if let SessionState::Recording(active) = &*state {
                warn!("Recording already in progress ({})", active.id);
                return None;
            }

            let id = Uuid::new_v4();
            let (stop_tx, stop_rx) = oneshot::channel();
            *state = SessionState::Recording(ActiveSession {
                id,
                stop_tx: Some(stop_tx),
            });
            (id, stop_rx)
        };

        ControlPosture::Recording.apply(self.shared.view.as_ref());
        info!("Starting recording session: {}", id);

        let controller = self.clone();
        Some(tokio::spawn(async move {
            controller.run_session(id, stop_rx).await
        }))
    }

    /// Stop the active session, if any
    ///
    /// The controls return to the idle posture immediately. The captured
    /// audio is uploaded by the session task once the stream has flushed.
    pub fn stop(&self) {
        let previous = std::mem::replace(&mut *self.state(), SessionState::Idle);

        match previous {
            SessionState::Recording(mut active) => {
                info!("Stopping recording session: {}", active.id);
                if let Some(stop_tx) = active.stop_tx.take() {
                    let _ = stop_tx.send(());
                }
            }
            SessionState::Idle => debug!("Stop requested with no active session"),
        }

        ControlPosture::Idle.apply(self.shared.view.as_ref());
    }

    /// Check if a session is currently active
    pub fn is_recording(&self) -> bool {
        matches!(&*self.state(), SessionState::Recording(_))
    }

    /// Identifier of the active session
    pub fn current_session(&self) -> Option<Uuid> {
        match &*self.state() {
            SessionState::Recording(active) => Some(active.id),
            SessionState::Idle => None,
        }
    }

    async fn run_session(
        &self,
        id: Uuid,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> SessionSummary {
        let mut summary = SessionSummary::new(id);
        let source = &self.shared.source;

        info!("Requesting capture device: {}", source.name());

        let stream = match source.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Error accessing microphone: {}", e);
                self.shared.view.notify(DEVICE_ERROR_MESSAGE);
                self.return_to_idle(id);
                return summary.finish(SessionOutcome::DeviceUnavailable {
                    error: e.to_string(),
                });
            }
        };

        let mut device = DeviceGuard::new(stream);

        // Stop pressed while the permission request was pending
        if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
            info!("Session {} stopped before capture began", id);
            device.release();
            return summary.finish(SessionOutcome::Cancelled);
        }

        let mut fragments_rx = match device.stream.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Error starting capture: {:#}", e);
                device.release();
                self.shared.view.notify(DEVICE_ERROR_MESSAGE);
                self.return_to_idle(id);
                return summary.finish(SessionOutcome::DeviceUnavailable {
                    error: format!("{:#}", e),
                });
            }
        };

        let started = Instant::now();
        summary.started_at = Some(Utc::now());
        info!("Capture started on {}", device.stream.name());

        let tick = self.shared.config.tick_interval;
        let mut ticker = interval_at(started + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut fragments: Vec<Fragment> = Vec::new();
        let mut stop_requested = false;
        let mut finalize_error = None;

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx, if !stop_requested => {
                    stop_requested = true;
                    if let Err(e) = device.stream.finalize().await {
                        error!("Failed to finalize capture: {:#}", e);
                        finalize_error = Some(e);
                        break;
                    }
                }
                fragment = fragments_rx.recv() => match fragment {
                    Some(fragment) => {
                        debug!(
                            "Fragment {} arrived: {} bytes at {}ms",
                            fragments.len(),
                            fragment.len(),
                            fragment.timestamp_ms
                        );
                        fragments.push(fragment);
                    }
                    None => break,
                },
                _ = ticker.tick(), if !stop_requested => {
                    let elapsed = started.elapsed().as_secs();
                    self.render_tick(id, &format_time(elapsed));
                }
            }
        }

        drop(ticker);
        summary.duration_secs = started.elapsed().as_secs_f64();

        if !stop_requested {
            warn!("Capture for session {} ended without a stop request", id);
            self.return_to_idle(id);
        }

        self.reset_timer(id);

        // A recording that could not be flushed is never uploaded
        if let Some(e) = finalize_error {
            device.release();
            self.shared.view.notify(DEVICE_ERROR_MESSAGE);
            self.return_to_idle(id);
            return summary.finish(SessionOutcome::DeviceUnavailable {
                error: format!("{:#}", e),
            });
        }

        let payload = Payload::assemble(fragments);
        summary.fragment_count = payload.fragment_count;
        summary.payload_bytes = payload.len();

        info!(
            "Session {} captured {:.1}s in {} fragments ({} bytes)",
            id,
            summary.duration_secs,
            summary.fragment_count,
            summary.payload_bytes
        );

        let outcome = match self.shared.sink.upload(payload).await {
            Ok(()) => {
                self.shared.view.reload();
                SessionOutcome::Uploaded
            }
            Err(e) => {
                error!("Error uploading audio: {}", e);
                self.shared.view.notify(UPLOAD_ERROR_MESSAGE);
                SessionOutcome::UploadFailed {
                    error: e.to_string(),
                }
            }
        };

        device.release();

        summary.finish(outcome)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the timer only while this session is the active one
    fn render_tick(&self, id: Uuid, text: &str) {
        let current = matches!(&*self.state(), SessionState::Recording(active) if active.id == id);
        if current {
            self.shared.view.set_timer_text(text);
        }
    }

    /// Reset the timer unless a newer session owns the display
    fn reset_timer(&self, id: Uuid) {
        let owned = Self::owns_display(&self.state(), id);
        if owned {
            self.shared.view.set_timer_text(&format_time(0));
        }
    }

    /// Leave the recording state if this session still holds it
    fn return_to_idle(&self, id: Uuid) {
        let mut state = self.state();
        if !Self::owns_display(&state, id) {
            return;
        }
        *state = SessionState::Idle;
        drop(state);

        ControlPosture::Idle.apply(self.shared.view.as_ref());
    }

    fn owns_display(state: &SessionState, id: Uuid) -> bool {
        match state {
            SessionState::Idle => true,
            SessionState::Recording(active) => active.id == id,
        }
    }
}

/// Stops the device's tracks exactly once, whichever way the session ends
struct DeviceGuard {
    stream: Box<dyn CaptureStream>,
    released: bool,
}

impl DeviceGuard {
    fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.stream.stop_tracks();
        debug!("Capture device released: {}", self.stream.name());
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.release();
    }
}
