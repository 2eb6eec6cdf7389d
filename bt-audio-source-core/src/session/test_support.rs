//! In-memory service double for unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::SourceError;
use crate::models::state::SourceState;
use crate::traits::audio_sink::AudioSink;
use crate::traits::service_listener::ServiceListener;
use crate::traits::source_service::SourceService;

#[derive(Default)]
pub struct RecordingService {
    pub calls: Mutex<Vec<&'static str>>,
    listener: Mutex<Option<Arc<dyn ServiceListener>>>,
    sink: Mutex<Option<Arc<dyn AudioSink>>>,
    pub fail_register: bool,
}

impl RecordingService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_register: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn sink(&self) -> Option<Arc<dyn AudioSink>> {
        self.sink.lock().clone()
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Report the service as running; the listener installs its sink.
    pub fn come_up(&self) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_operational_state_changed(true);
        }
    }

    pub fn report(&self, state: SourceState) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_state_changed(state);
        }
    }
}

impl SourceService for RecordingService {
    fn register_listener(&self, listener: Arc<dyn ServiceListener>) -> Result<(), SourceError> {
        self.calls.lock().push("register_listener");
        if self.fail_register {
            return Err(SourceError::ServiceUnavailable);
        }
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    fn unregister_listener(&self) {
        self.calls.lock().push("unregister_listener");
        *self.listener.lock() = None;
    }

    fn set_sink(&self, sink: Option<Arc<dyn AudioSink>>) -> Result<(), SourceError> {
        self.calls.lock().push(if sink.is_some() { "set_sink" } else { "clear_sink" });
        *self.sink.lock() = sink;
        Ok(())
    }

    fn relinquish(&self) -> Result<(), SourceError> {
        self.calls.lock().push("relinquish");
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => sink.relinquish(),
            None => Ok(()),
        }
    }

    fn dispose(&self) {
        self.calls.lock().push("dispose");
    }
}
