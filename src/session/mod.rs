//! Recording session management
//!
//! This module provides the `RecordingController` that manages:
//! - Capture device acquisition and release
//! - The elapsed-time display while recording
//! - Fragment collection, payload assembly and upload
//! - The start/stop control posture

mod clock;
mod config;
mod controller;
mod stats;

pub use clock::format_time;
pub use config::SessionConfig;
pub use controller::{RecordingController, DEVICE_ERROR_MESSAGE, UPLOAD_ERROR_MESSAGE};
pub use stats::{SessionOutcome, SessionSummary};
