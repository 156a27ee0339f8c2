pub mod audio;
pub mod config;
pub mod error;
pub mod session;
pub mod upload;
pub mod widget;

pub use audio::{CaptureSource, CaptureStream, FileCapture, Fragment};
pub use config::Config;
pub use error::{DeviceError, UploadError};
pub use session::{
    format_time, RecordingController, SessionConfig, SessionOutcome, SessionSummary,
};
pub use upload::{HttpUploadSink, Payload, UploadSink};
pub use widget::{ControlPosture, TerminalView, WidgetView};

#[cfg(feature = "microphone")]
pub use audio::MicrophoneCapture;
