//! # bt-audio-source-core
//!
//! Pacing core for a Bluetooth audio source feeding a pull-style playback
//! pipeline.
//!
//! The Bluetooth audio source service pushes PCM frames at arbitrary times
//! and sizes; the pipeline pulls fixed-size blocks and blocks until they are
//! filled. In between sits a fixed 64 KiB receive buffer with startup
//! buffering, drop-oldest overflow, silence on underflow, real-time pacing
//! and cooperative cancellation.
//!
//! ## Architecture
//!
//! ```text
//! bt-audio-source-core (this crate)
//! ├── traits/       ← SourceService, ServiceListener, AudioSink
//! ├── models/       ← SourceError, AudioFormat, SourceConfiguration, SourceLifecycle, diagnostics
//! ├── processing/   ← RingBuffer, PacingBuffer, MediaClock
//! └── session/      ← BluetoothAudioSource (facade), TransportAdapter, ServiceHandle
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{SourceConfiguration, RECEIVE_BUFFER_SIZE};
pub use models::diagnostics::{BufferDiagnostics, SessionInfo};
pub use models::error::SourceError;
pub use models::format::{AudioFormat, SUPPORTED_SAMPLE_RATES};
pub use models::state::{PlaybackSpeed, SourceLifecycle, SourceState};
pub use processing::media_clock::MediaClock;
pub use processing::pacing_buffer::PacingBuffer;
pub use processing::ring_buffer::{RingBuffer, WriteOutcome};
pub use session::audio_source::BluetoothAudioSource;
pub use session::service_handle::ServiceHandle;
pub use session::transport::TransportAdapter;
pub use traits::audio_sink::AudioSink;
pub use traits::service_listener::ServiceListener;
pub use traits::source_service::SourceService;
