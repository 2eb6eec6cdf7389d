use crate::models::error::SourceError;
use crate::models::format::AudioFormat;

/// Sink controls the Bluetooth audio source service drives.
///
/// All methods are called from the service's callback context, on an
/// arbitrary thread. They must return quickly.
pub trait AudioSink: Send + Sync {
    /// The provider negotiated `format` for the upcoming stream.
    fn configure(&self, format: &AudioFormat) -> Result<(), SourceError>;

    /// The provider starts a session with this sink.
    fn acquire(&self) -> Result<(), SourceError>;

    /// The provider ends its session with this sink.
    fn relinquish(&self) -> Result<(), SourceError>;

    /// Transport speed in percent: `0` stops, `100` plays.
    fn set_speed(&self, speed: i8) -> Result<(), SourceError>;

    /// Played media time in milliseconds.
    fn time(&self) -> Result<u32, SourceError>;

    /// Buffered, unplayed audio in frames.
    fn delay(&self) -> Result<u32, SourceError>;

    /// A chunk of PCM bytes arrived. Fire-and-forget.
    fn frame(&self, frame: &[u8]);
}
