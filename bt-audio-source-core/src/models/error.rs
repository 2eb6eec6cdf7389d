use thiserror::Error;

/// Errors surfaced by the audio source core.
///
/// Overflow and underflow are not errors: they are data-continuity events
/// that get logged and counted in [`BufferDiagnostics`](super::diagnostics::BufferDiagnostics).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("failed to allocate {capacity} byte receive buffer")]
    AllocationFailed { capacity: usize },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported playback speed: {0}")]
    UnsupportedSpeed(i8),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("audio source service unavailable")]
    ServiceUnavailable,

    #[error("service call failed: {0}")]
    ServiceCallFailed(String),
}
