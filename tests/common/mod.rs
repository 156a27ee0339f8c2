// Test doubles for the capture device, the widget view and the upload sink
#![allow(dead_code)]

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{mpsc, Notify};
use voice_drop::{
    CaptureSource, CaptureStream, DeviceError, Fragment, Payload, RecordingController,
    UploadError, UploadSink, WidgetView,
};

/// A capture device the test drives by hand
pub struct FakeDevice {
    deny: bool,
    fail_start: bool,
    fail_finalize: bool,
    gate: Option<Notify>,
    sender: Mutex<Option<mpsc::Sender<Fragment>>>,
    stop_tracks: AtomicUsize,
    finalize_calls: AtomicUsize,
    emitted: AtomicUsize,
}

impl FakeDevice {
    fn build(deny: bool, gated: bool) -> Self {
        Self {
            deny,
            fail_start: false,
            fail_finalize: false,
            gate: gated.then(Notify::new),
            sender: Mutex::new(None),
            stop_tracks: AtomicUsize::new(0),
            finalize_calls: AtomicUsize::new(0),
            emitted: AtomicUsize::new(0),
        }
    }

    /// Grants access immediately
    pub fn granting() -> Arc<Self> {
        Arc::new(Self::build(false, false))
    }

    /// Refuses access (permission denied)
    pub fn denying() -> Arc<Self> {
        Arc::new(Self::build(true, false))
    }

    /// Grants access only once `open_gate` is called
    pub fn gated() -> Arc<Self> {
        Arc::new(Self::build(false, true))
    }

    /// Grants access, but the recorder refuses to start
    pub fn failing_start() -> Arc<Self> {
        Arc::new(Self {
            fail_start: true,
            ..Self::build(false, false)
        })
    }

    /// Records normally, but cannot flush its audio on stop
    pub fn failing_finalize() -> Arc<Self> {
        Arc::new(Self {
            fail_finalize: true,
            ..Self::build(false, false)
        })
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn source(self: &Arc<Self>) -> Arc<dyn CaptureSource> {
        Arc::new(FakeSource {
            device: Arc::clone(self),
        })
    }

    /// Deliver one fragment as the recorder would
    pub fn emit(&self, data: &[u8]) {
        let sender = self.sender.lock().unwrap();
        let sender = sender.as_ref().expect("capture not started");
        let index = self.emitted.fetch_add(1, Ordering::SeqCst) as u64;
        sender
            .try_send(Fragment::new(data.to_vec(), index * 1000))
            .expect("fragment channel full or closed");
    }

    /// End the capture from the device side
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }

    pub fn stop_tracks_count(&self) -> usize {
        self.stop_tracks.load(Ordering::SeqCst)
    }

    pub fn finalize_count(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }
}

struct FakeSource {
    device: Arc<FakeDevice>,
}

#[async_trait::async_trait]
impl CaptureSource for FakeSource {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        if let Some(gate) = &self.device.gate {
            gate.notified().await;
        }
        if self.device.deny {
            return Err(DeviceError::PermissionDenied);
        }
        Ok(Box::new(FakeStream {
            device: Arc::clone(&self.device),
            capturing: false,
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeStream {
    device: Arc<FakeDevice>,
    capturing: bool,
}

#[async_trait::async_trait]
impl CaptureStream for FakeStream {
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>> {
        if self.device.fail_start {
            anyhow::bail!("recorder failed to start");
        }
        let (tx, rx) = mpsc::channel(16);
        *self.device.sender.lock().unwrap() = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn finalize(&mut self) -> Result<()> {
        self.device.finalize_calls.fetch_add(1, Ordering::SeqCst);
        self.capturing = false;
        if self.device.fail_finalize {
            anyhow::bail!("failed to encode recorded audio");
        }
        self.device.close();
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn stop_tracks(&mut self) {
        self.device.stop_tracks.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    StartEnabled(bool),
    StopEnabled(bool),
    Timer(String),
    Notify(String),
    Reload,
}

/// Records everything the controller does to the widget
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn timer_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Timer(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Notify(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn reloads(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == ViewEvent::Reload)
            .count()
    }

    pub fn start_enabled(&self) -> bool {
        self.events()
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::StartEnabled(enabled) => Some(*enabled),
                _ => None,
            })
            .unwrap_or(true)
    }

    pub fn stop_enabled(&self) -> bool {
        self.events()
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::StopEnabled(enabled) => Some(*enabled),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl WidgetView for RecordingView {
    fn set_start_enabled(&self, enabled: bool) {
        self.push(ViewEvent::StartEnabled(enabled));
    }

    fn set_stop_enabled(&self, enabled: bool) {
        self.push(ViewEvent::StopEnabled(enabled));
    }

    fn set_timer_text(&self, text: &str) {
        self.push(ViewEvent::Timer(text.to_string()));
    }

    fn notify(&self, message: &str) {
        self.push(ViewEvent::Notify(message.to_string()));
    }

    fn reload(&self) {
        self.push(ViewEvent::Reload);
    }
}

/// Stops the session from inside the first timer update it receives
pub struct StoppingView {
    inner: Arc<RecordingView>,
    controller: OnceLock<RecordingController>,
}

impl StoppingView {
    pub fn new(inner: &Arc<RecordingView>) -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::clone(inner),
            controller: OnceLock::new(),
        })
    }

    pub fn attach(&self, controller: RecordingController) {
        let _ = self.controller.set(controller);
    }
}

impl WidgetView for StoppingView {
    fn set_start_enabled(&self, enabled: bool) {
        self.inner.set_start_enabled(enabled);
    }

    fn set_stop_enabled(&self, enabled: bool) {
        self.inner.set_stop_enabled(enabled);
    }

    fn set_timer_text(&self, text: &str) {
        self.inner.set_timer_text(text);
        if let Some(controller) = self.controller.get() {
            if controller.is_recording() {
                controller.stop();
            }
        }
    }

    fn notify(&self, message: &str) {
        self.inner.notify(message);
    }

    fn reload(&self) {
        self.inner.reload();
    }
}

/// Upload sink that keeps payloads in memory
pub struct FakeSink {
    fail: bool,
    payloads: Mutex<Vec<Payload>>,
    watched: Option<Arc<FakeDevice>>,
    releases_seen: Mutex<Vec<usize>>,
}

impl FakeSink {
    pub fn accepting() -> Arc<Self> {
        Self::build(false, None)
    }

    pub fn failing() -> Arc<Self> {
        Self::build(true, None)
    }

    /// Also note how many times `device` had been released at upload time
    pub fn watching(fail: bool, device: &Arc<FakeDevice>) -> Arc<Self> {
        Self::build(fail, Some(Arc::clone(device)))
    }

    fn build(fail: bool, watched: Option<Arc<FakeDevice>>) -> Arc<Self> {
        Arc::new(Self {
            fail,
            payloads: Mutex::new(Vec::new()),
            watched,
            releases_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn releases_seen(&self) -> Vec<usize> {
        self.releases_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl UploadSink for FakeSink {
    async fn upload(&self, payload: Payload) -> Result<(), UploadError> {
        if let Some(device) = &self.watched {
            self.releases_seen
                .lock()
                .unwrap()
                .push(device.stop_tracks_count());
        }
        self.payloads.lock().unwrap().push(payload);

        if self.fail {
            Err(UploadError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            Ok(())
        }
    }
}

/// Upload sink that panics mid-upload
pub struct PanickingSink;

#[async_trait::async_trait]
impl UploadSink for PanickingSink {
    async fn upload(&self, _payload: Payload) -> Result<(), UploadError> {
        panic!("sink exploded");
    }
}
