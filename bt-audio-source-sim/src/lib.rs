//! # bt-audio-source-sim
//!
//! Simulated Bluetooth audio source service for bt-audio-source-core.
//!
//! Provides:
//! - `SimulatedSourceService` — in-process `SourceService` with a real-time frame delivery thread
//! - `ToneGenerator` — S16LE sine/silence payloads
//!
//! Useful for demos and end-to-end tests without Bluetooth hardware.
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use bt_audio_source_core::{AudioFormat, BluetoothAudioSource, SourceConfiguration};
//! use bt_audio_source_sim::{Signal, SimulatedSourceService};
//!
//! let format = AudioFormat::s16_stereo(48000);
//! let service = Arc::new(SimulatedSourceService::new(format));
//! let source = BluetoothAudioSource::new(Arc::clone(&service), SourceConfiguration::default()).unwrap();
//!
//! service.power_on();
//! service.connect().unwrap();
//! source.open().unwrap();
//! source.prepare(format).unwrap();
//! source.start().unwrap();
//! service.start_streaming(Signal::Sine { frequency: 440.0, amplitude: 0.5 }).unwrap();
//!
//! let mut block = vec![0u8; format.bytes_for_millis(10)];
//! source.read(&mut block).unwrap();
//! ```

pub mod simulated_service;
pub mod tone_generator;

pub use simulated_service::{SimulatedSourceService, MAX_FRAME_BYTES};
pub use tone_generator::{Signal, ToneGenerator};
