use crate::audio::Fragment;

/// Multipart field the server reads the recording from
pub const AUDIO_FIELD_NAME: &str = "audio_data";

/// File name declared for every upload
pub const AUDIO_FILE_NAME: &str = "recorded_audio.wav";

/// Media type declared for every upload
///
/// Declared regardless of what the capture backend actually encoded; the
/// server only accepts `.wav` uploads.
pub const AUDIO_MEDIA_TYPE: &str = "audio/wav";

/// A finished recording, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub file_name: String,
    pub field_name: String,
    /// Number of fragments the bytes were assembled from
    pub fragment_count: usize,
}

impl Payload {
    /// Concatenate fragments in arrival order into one audio payload
    pub fn assemble(fragments: Vec<Fragment>) -> Self {
        let fragment_count = fragments.len();
        let total: usize = fragments.iter().map(Fragment::len).sum();

        let mut bytes = Vec::with_capacity(total);
        for fragment in fragments {
            bytes.extend_from_slice(&fragment.data);
        }

        Self {
            bytes,
            media_type: AUDIO_MEDIA_TYPE.to_string(),
            file_name: AUDIO_FILE_NAME.to_string(),
            field_name: AUDIO_FIELD_NAME.to_string(),
            fragment_count,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
