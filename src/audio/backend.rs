use anyhow::Result;
use tokio::sync::mpsc;

use crate::error::DeviceError;

/// One opaque chunk of encoded audio, in the order the capture stream produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Encoded bytes as handed over by the backend
    pub data: Vec<u8>,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

impl Fragment {
    pub fn new(data: Vec<u8>, timestamp_ms: u64) -> Self {
        Self { data, timestamp_ms }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Capture source trait
///
/// Implementations:
/// - File: replays a WAV file as if it came from a device (testing/demo)
/// - Microphone: default cpal input device (feature `microphone`)
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Request access to the device
    ///
    /// Suspends until access is granted or refused. Not cancellable.
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, DeviceError>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// A granted capture stream
///
/// Fragments arrive on the receiver returned by `start`. The stream signals
/// stop by closing that channel, which happens after `finalize` has flushed
/// any buffered data or when the device goes away on its own.
#[async_trait::async_trait]
pub trait CaptureStream: Send {
    /// Begin capturing
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>>;

    /// Ask the stream to flush pending data and close its channel
    async fn finalize(&mut self) -> Result<()>;

    /// Check if the stream is currently capturing
    fn is_capturing(&self) -> bool;

    /// Release the underlying device (stop all tracks)
    ///
    /// Must be safe to call more than once.
    fn stop_tracks(&mut self);

    /// Get stream name for logging
    fn name(&self) -> &str;
}
