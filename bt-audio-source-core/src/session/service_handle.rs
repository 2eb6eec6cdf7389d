use std::sync::{Arc, Weak};

use crate::models::error::SourceError;
use crate::models::state::SourceState;
use crate::session::transport::TransportAdapter;
use crate::traits::audio_sink::AudioSink;
use crate::traits::service_listener::ServiceListener;
use crate::traits::source_service::SourceService;

/// Listens to the service and installs the sink once it is operational.
struct ServiceBridge<S: SourceService> {
    service: Weak<S>,
    transport: Arc<TransportAdapter>,
}

impl<S: SourceService> ServiceListener for ServiceBridge<S> {
    fn on_operational_state_changed(&self, running: bool) {
        if !running {
            log::info!("Bluetooth audio source service is now unavailable");
            return;
        }

        log::info!("Bluetooth audio source service now available");

        let Some(service) = self.service.upgrade() else {
            return;
        };
        let sink: Arc<dyn AudioSink> = self.transport.clone();
        match service.set_sink(Some(sink)) {
            Ok(()) => log::info!("Sink installed on audio source service"),
            Err(e) => log::error!("Failed to install sink: {}", e),
        }
    }

    fn on_state_changed(&self, state: SourceState) {
        self.transport.handle_state_changed(state);
    }
}

/// Scoped ownership of the audio source service.
///
/// Registers for service updates on construction. On drop, relinquishes the
/// provider session, removes the sink, unregisters and disposes the service.
pub struct ServiceHandle<S: SourceService + 'static> {
    service: Arc<S>,
}

impl<S: SourceService + 'static> ServiceHandle<S> {
    pub fn acquire(service: Arc<S>, transport: Arc<TransportAdapter>) -> Result<Self, SourceError> {
        let bridge = Arc::new(ServiceBridge {
            service: Arc::downgrade(&service),
            transport,
        });
        service.register_listener(bridge)?;
        log::info!("Registered for audio source service updates");

        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }
}

impl<S: SourceService + 'static> Drop for ServiceHandle<S> {
    fn drop(&mut self) {
        log::info!("Releasing audio source service");

        if let Err(e) = self.service.relinquish() {
            log::error!("Failed to relinquish audio source: {}", e);
        }
        if let Err(e) = self.service.set_sink(None) {
            log::error!("Failed to remove sink: {}", e);
        }
        self.service.unregister_listener();
        self.service.dispose();
    }
}
