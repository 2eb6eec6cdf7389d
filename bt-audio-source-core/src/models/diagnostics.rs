use serde::Serialize;

use super::format::AudioFormat;

/// Counters for debugging buffer health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BufferDiagnostics {
    pub frames_pushed: u64,
    pub bytes_pushed: u64,
    pub overflow_count: u64,
    pub bytes_dropped: u64,
    pub underflow_count: u64,
    pub reads: u64,
    pub bytes_served: u64,
    pub silence_bytes: u64,
    pub cancelled_reads: u64,
}

/// Identity of one prepared playback session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub started_at: String,
    pub format: AudioFormat,
}

impl SessionInfo {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            format,
        }
    }
}
