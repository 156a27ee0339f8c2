//! Delivery of finished recordings to the server
//!
//! The server expects one multipart part named `audio_data`, declared as
//! `recorded_audio.wav` with type `audio/wav`, posted to `/upload`.

mod http;
mod payload;

pub use http::{HttpUploadSink, UploadSink, DEFAULT_UPLOAD_PATH};
pub use payload::{Payload, AUDIO_FIELD_NAME, AUDIO_FILE_NAME, AUDIO_MEDIA_TYPE};
