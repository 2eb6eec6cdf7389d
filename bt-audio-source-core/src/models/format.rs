use serde::{Deserialize, Serialize};

/// Sample rates every Bluetooth source device is required to support.
pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [32000, 44100, 48000];

/// The only sample width the source emits (S16LE).
pub const SUPPORTED_BITS_PER_SAMPLE: u16 = 16;

/// Interleaved linear PCM format emitted to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// 16-bit stereo at `sample_rate`.
    pub fn s16_stereo(sample_rate: u32) -> Self {
        Self::new(sample_rate, 2, SUPPORTED_BITS_PER_SAMPLE)
    }

    /// Check the format against the fixed capability contract:
    /// S16LE, interleaved, 32/44.1/48 kHz, mono or stereo.
    pub fn validate(&self) -> Result<(), String> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(format!("unsupported sample rate: {}", self.sample_rate));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.bits_per_sample != SUPPORTED_BITS_PER_SAMPLE {
            return Err(format!("unsupported bits per sample: {}", self.bits_per_sample));
        }
        Ok(())
    }

    /// Bytes in one interleaved frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> u32 {
        self.channels as u32 * self.bits_per_sample as u32 / 8
    }

    /// Bytes per second of media.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.bytes_per_frame()
    }

    /// Bits per second of media.
    pub fn bitrate(&self) -> u32 {
        self.byte_rate() * 8
    }

    /// Number of bytes covering `millis` of media, rounded down to a whole frame.
    pub fn bytes_for_millis(&self, millis: u64) -> usize {
        let frames = self.sample_rate as u64 * millis / 1000;
        (frames * self.bytes_per_frame() as u64) as usize
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::s16_stereo(44100)
    }
}
