use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::Path;

use crate::error::DeviceError;

/// Format details read from a WAV file header
#[derive(Debug, Clone, PartialEq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub duration_seconds: f64,
}

impl WavInfo {
    /// Bytes of sample data per second of audio
    pub fn byte_rate(&self) -> u64 {
        let bytes_per_sample = (self.bits_per_sample as u64 / 8).max(1);
        self.sample_rate as u64 * self.channels as u64 * bytes_per_sample
    }
}

/// Read the header of a WAV file
pub fn inspect_wav(path: impl AsRef<Path>) -> Result<WavInfo, DeviceError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DeviceError::NotFound(path.display().to_string()));
    }

    let reader = WavReader::open(path)
        .map_err(|e| DeviceError::Unsupported(format!("{}: {}", path.display(), e)))?;

    let spec = reader.spec();
    let duration_seconds = reader.duration() as f64 / spec.sample_rate as f64;

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        duration_seconds,
    })
}

/// Encode interleaved 16-bit PCM into an in-memory WAV file
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }

    Ok(cursor.into_inner())
}
