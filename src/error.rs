use thiserror::Error;

/// Failure to acquire or drive the capture device
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no capture device available: {0}")]
    NotFound(String),

    #[error("capture device is busy")]
    Busy,

    #[error("unsupported capture input: {0}")]
    Unsupported(String),

    #[error("capture backend error: {0}")]
    Backend(String),
}

/// Failure to deliver a recording to the upload sink
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upload rejected with status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid upload url: {0}")]
    InvalidUrl(String),

    #[error("invalid media type: {0}")]
    InvalidMediaType(String),
}
