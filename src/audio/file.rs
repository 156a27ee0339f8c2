use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::backend::{CaptureSource, CaptureStream, Fragment};
use super::wav::{inspect_wav, WavInfo};
use crate::error::DeviceError;

/// Capture source that replays a WAV file as if it were a microphone
///
/// With a timeslice the file bytes are emitted in timeslice-paced fragments;
/// without one a single fragment is emitted when the stream is finalized.
/// Either way the fragments concatenate back to the original file.
pub struct FileCapture {
    path: PathBuf,
    timeslice: Option<Duration>,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>, timeslice: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            timeslice,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for FileCapture {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        info!("Opening capture file: {}", self.path.display());

        let wav = inspect_wav(&self.path)?;
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| DeviceError::Backend(format!("{}: {}", self.path.display(), e)))?;

        info!(
            "Capture file ready: {:.1}s, {}Hz, {} channels, {} bytes",
            wav.duration_seconds,
            wav.sample_rate,
            wav.channels,
            bytes.len()
        );

        Ok(Box::new(FileCaptureStream {
            bytes: Some(bytes),
            wav,
            timeslice: self.timeslice,
            finalize_tx: None,
            task: None,
            capturing: false,
            released: false,
        }))
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}

struct FileCaptureStream {
    bytes: Option<Vec<u8>>,
    wav: WavInfo,
    timeslice: Option<Duration>,
    finalize_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    capturing: bool,
    released: bool,
}

#[async_trait::async_trait]
impl CaptureStream for FileCaptureStream {
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>> {
        if self.released {
            bail!("Capture device already released");
        }
        let Some(bytes) = self.bytes.take() else {
            bail!("Already capturing");
        };

        let (tx, rx) = mpsc::channel(100);
        let (finalize_tx, finalize_rx) = oneshot::channel();

        let slice_bytes = self.timeslice.map(|slice| {
            let per_slice = self.wav.byte_rate() * slice.as_millis() as u64 / 1000;
            (slice, per_slice.max(1) as usize)
        });

        self.task = Some(tokio::spawn(replay(bytes, slice_bytes, tx, finalize_rx)));
        self.finalize_tx = Some(finalize_tx);
        self.capturing = true;

        info!("File capture started");

        Ok(rx)
    }

    async fn finalize(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(tx) = self.finalize_tx.take() {
            // The replay task may already be gone if the receiver was dropped.
            let _ = tx.send(());
        }
        self.capturing = false;

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn stop_tracks(&mut self) {
        if self.released {
            return;
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.finalize_tx = None;
        self.capturing = false;
        self.released = true;

        debug!("File capture released");
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}

async fn replay(
    bytes: Vec<u8>,
    slice_bytes: Option<(Duration, usize)>,
    tx: mpsc::Sender<Fragment>,
    mut finalize_rx: oneshot::Receiver<()>,
) {
    let started = Instant::now();
    let mut offset = 0;

    match slice_bytes {
        Some((slice, per_slice)) => {
            let mut ticker = interval_at(started + slice, slice);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut finalize_rx => break,
                    _ = ticker.tick() => {
                        if offset >= bytes.len() {
                            continue;
                        }
                        let end = (offset + per_slice).min(bytes.len());
                        let fragment =
                            Fragment::new(bytes[offset..end].to_vec(), elapsed_ms(started));
                        if tx.send(fragment).await.is_err() {
                            return;
                        }
                        offset = end;
                    }
                }
            }
        }
        None => {
            let _ = finalize_rx.await;
        }
    }

    if offset < bytes.len() {
        let fragment = Fragment::new(bytes[offset..].to_vec(), elapsed_ms(started));
        let _ = tx.send(fragment).await;
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
