use std::sync::Arc;

use crate::models::error::SourceError;
use crate::traits::audio_sink::AudioSink;
use crate::traits::service_listener::ServiceListener;

/// Interface to the external Bluetooth audio source service.
///
/// Implemented by:
/// - `SimulatedSourceService` (bt-audio-source-sim)
/// - Future: a binding to the platform's audio source daemon
pub trait SourceService: Send + Sync {
    /// Subscribe to operational and connection state updates.
    fn register_listener(&self, listener: Arc<dyn ServiceListener>) -> Result<(), SourceError>;

    fn unregister_listener(&self);

    /// Install (or with `None`, remove) the sink that receives frames and
    /// transport controls.
    fn set_sink(&self, sink: Option<Arc<dyn AudioSink>>) -> Result<(), SourceError>;

    /// Give up the current provider session, if any.
    fn relinquish(&self) -> Result<(), SourceError>;

    /// Release the service connection. Called once, last.
    fn dispose(&self);
}
