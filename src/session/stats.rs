use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a recording session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The server accepted the recording
    Uploaded,

    /// The recording was captured but the upload failed
    UploadFailed { error: String },

    /// The capture device could not be acquired or started
    DeviceUnavailable { error: String },

    /// Stop was pressed before the device was granted
    Cancelled,
}

/// Report of a finished recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier
    pub session_id: Uuid,

    /// When start was pressed
    pub requested_at: DateTime<Utc>,

    /// When capture actually began, if it did
    pub started_at: Option<DateTime<Utc>>,

    /// Capture duration in seconds
    pub duration_secs: f64,

    /// Number of fragments collected
    pub fragment_count: usize,

    /// Size of the uploaded payload in bytes
    pub payload_bytes: usize,

    pub outcome: SessionOutcome,
}

impl SessionSummary {
    pub(crate) fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            requested_at: Utc::now(),
            started_at: None,
            duration_secs: 0.0,
            fragment_count: 0,
            payload_bytes: 0,
            outcome: SessionOutcome::Cancelled,
        }
    }

    pub(crate) fn finish(mut self, outcome: SessionOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}
