//! Output audio format negotiated from chain configuration

use serde::Serialize;

/// PCM layout the mixing layer renders a segment in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputAudioFormat {
    /// e.g. `PCM_SIGNED`, `PCM_FLOAT`
    pub encoding: String,
    pub frame_rate: u32,
    pub sample_bits: u16,
    pub channels: u16,
    /// Bytes per frame: `channels × sample_bits / 8`
    pub frame_size: u32,
    pub big_endian: bool,
}

impl OutputAudioFormat {
    /// Little-endian format from its parts
    pub fn new(encoding: impl Into<String>, frame_rate: u32, sample_bits: u16, channels: u16) -> Self {
        Self {
            encoding: encoding.into(),
            frame_rate,
            sample_bits,
            channels,
            frame_size: u32::from(channels) * u32::from(sample_bits) / 8,
            big_endian: false,
        }
    }

    /// Bytes of audio per second
    pub fn byte_rate(&self) -> u64 {
        u64::from(self.frame_rate) * u64::from(self.frame_size)
    }
}

/// Waveform file extension for an output container name
pub fn container_extension(container: &str) -> String {
    container.trim().to_lowercase()
}
