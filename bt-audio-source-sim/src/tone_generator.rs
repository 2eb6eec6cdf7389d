//! S16LE PCM payload generator for the simulated source.

use bt_audio_source_core::AudioFormat;

/// What the simulated remote device is playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Silence,
    /// Sine wave; `amplitude` in 0.0–1.0 of full scale.
    Sine { frequency: f64, amplitude: f64 },
}

/// Generates continuous interleaved S16LE PCM, one block at a time.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    format: AudioFormat,
    signal: Signal,
    frame_index: u64,
}

impl ToneGenerator {
    pub fn new(format: AudioFormat, signal: Signal) -> Self {
        Self {
            format,
            signal,
            frame_index: 0,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Frames generated so far.
    pub fn frames_generated(&self) -> u64 {
        self.frame_index
    }

    /// Next `frames` frames as little-endian bytes, same sample on every channel.
    pub fn next_block(&mut self, frames: usize) -> Vec<u8> {
        let channels = self.format.channels as usize;
        let mut bytes = Vec::with_capacity(frames * self.format.bytes_per_frame() as usize);
        let sample_rate = f64::from(self.format.sample_rate);

        for _ in 0..frames {
            let sample = match self.signal {
                Signal::Silence => 0i16,
                Signal::Sine { frequency, amplitude } => {
                    let t = self.frame_index as f64 / sample_rate;
                    let value = (2.0 * std::f64::consts::PI * frequency * t).sin() * amplitude.clamp(0.0, 1.0);
                    (value * i16::MAX as f64) as i16
                }
            };

            for _ in 0..channels {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
            self.frame_index += 1;
        }

        bytes
    }
}
