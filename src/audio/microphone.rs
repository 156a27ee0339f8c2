// Microphone capture using cpal's default input device

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::backend::{CaptureSource, CaptureStream, Fragment};
use super::wav::encode_wav;
use crate::error::DeviceError;

/// Captures the default input device into one WAV fragment per session
///
/// cpal streams are not `Send`, so each granted stream lives on its own
/// thread and is driven through a command channel.
pub struct MicrophoneCapture;

impl MicrophoneCapture {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicrophoneCapture {
    fn default() -> Self {
        Self::new()
    }
}

type Ack = oneshot::Sender<Result<(), DeviceError>>;

enum Command {
    Start(mpsc::Sender<Fragment>, Ack),
    Finalize(Ack),
    Release,
}

#[async_trait::async_trait]
impl CaptureSource for MicrophoneCapture {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (cmd_tx, cmd_rx) = std_mpsc::channel();

        thread::Builder::new()
            .name("microphone".to_string())
            .spawn(move || run_device(ready_tx, cmd_rx))
            .map_err(|e| DeviceError::Backend(e.to_string()))?;

        let device_name = ready_rx
            .await
            .map_err(|_| DeviceError::Backend("microphone thread exited".to_string()))??;

        info!("Microphone granted: {}", device_name);

        Ok(Box::new(MicrophoneStream {
            commands: cmd_tx,
            capturing: false,
            released: false,
        }))
    }

    fn name(&self) -> &str {
        "Microphone"
    }
}

struct MicrophoneStream {
    commands: std_mpsc::Sender<Command>,
    capturing: bool,
    released: bool,
}

#[async_trait::async_trait]
impl CaptureStream for MicrophoneStream {
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>> {
        if self.released {
            bail!("Capture device already released");
        }
        if self.capturing {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(4);
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Start(tx, ack_tx)).is_err() {
            bail!("Microphone thread exited");
        }
        ack_rx.await.context("Microphone thread exited")??;
        self.capturing = true;

        Ok(rx)
    }

    async fn finalize(&mut self) -> Result<()> {
        if !self.capturing {
            return Ok(());
        }

        self.capturing = false;

        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Finalize(ack_tx)).is_err() {
            bail!("Microphone thread exited");
        }
        ack_rx.await.context("Microphone thread exited")??;

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn stop_tracks(&mut self) {
        if self.released {
            return;
        }

        let _ = self.commands.send(Command::Release);
        self.capturing = false;
        self.released = true;
    }

    fn name(&self) -> &str {
        "Microphone"
    }
}

fn run_device(
    ready_tx: oneshot::Sender<Result<String, DeviceError>>,
    commands: std_mpsc::Receiver<Command>,
) {
    let samples = Arc::new(Mutex::new(Vec::<i16>::new()));

    let opened = open_input(Arc::clone(&samples));
    let (stream, sample_rate, channels, name) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if ready_tx.send(Ok(name)).is_err() {
        return;
    }

    let mut sink: Option<mpsc::Sender<Fragment>> = None;
    let mut started = Instant::now();

    while let Ok(command) = commands.recv() {
        match command {
            Command::Start(tx, ack) => {
                // Some hosts deliver data before play().
                if let Ok(mut buf) = samples.lock() {
                    buf.clear();
                }
                if let Err(e) = stream.play() {
                    error!("Failed to start microphone stream: {}", e);
                    let _ = ack.send(Err(DeviceError::Backend(e.to_string())));
                    continue;
                }
                started = Instant::now();
                sink = Some(tx);
                let _ = ack.send(Ok(()));
                info!(
                    "Microphone capture started ({}Hz, {} channels)",
                    sample_rate, channels
                );
            }
            Command::Finalize(ack) => {
                let _ = stream.pause();
                let recorded = match samples.lock() {
                    Ok(mut buf) => std::mem::take(&mut *buf),
                    Err(_) => Vec::new(),
                };

                let Some(tx) = sink.take() else {
                    let _ = ack.send(Ok(()));
                    continue;
                };

                // Ack before the sender drops so a failure is seen ahead of the close.
                match encode_wav(&recorded, sample_rate, channels) {
                    Ok(bytes) => {
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        let _ = tx.blocking_send(Fragment::new(bytes, elapsed_ms));
                        let _ = ack.send(Ok(()));
                    }
                    Err(e) => {
                        error!("Failed to encode microphone audio: {:#}", e);
                        let _ = ack.send(Err(DeviceError::Backend(format!("{:#}", e))));
                    }
                }
                drop(tx);
            }
            Command::Release => break,
        }
    }

    drop(stream);
    debug!("Microphone released");
}

fn open_input(
    samples: Arc<Mutex<Vec<i16>>>,
) -> Result<(cpal::Stream, u32, u16, String), DeviceError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| DeviceError::NotFound("no default input device".to_string()))?;
    let name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported = device
        .default_input_config()
        .map_err(|e| DeviceError::Unsupported(e.to_string()))?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();
    let config: cpal::StreamConfig = supported.config();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_input::<f32>(&device, &config, samples),
        cpal::SampleFormat::I16 => build_input::<i16>(&device, &config, samples),
        cpal::SampleFormat::U16 => build_input::<u16>(&device, &config, samples),
        other => return Err(DeviceError::Unsupported(format!("sample format {:?}", other))),
    }
    .map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => DeviceError::Busy,
        other => DeviceError::Backend(other.to_string()),
    })?;

    Ok((stream, sample_rate, channels, name))
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Mutex<Vec<i16>>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buf) = samples.lock() {
                buf.extend(data.iter().map(|&s| i16::from_sample(s)));
            }
        },
        |e| error!("Microphone stream error: {}", e),
        None,
    )
}
