pub mod backend;
pub mod file;
pub mod wav;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use backend::{CaptureSource, CaptureStream, Fragment};
pub use file::FileCapture;
pub use wav::{encode_wav, inspect_wav, WavInfo};

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneCapture;
