use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::SourceError;
use crate::models::format::AudioFormat;
use crate::models::state::SourceState;
use crate::processing::pacing_buffer::PacingBuffer;
use crate::traits::audio_sink::AudioSink;

#[derive(Debug, Default)]
struct LinkState {
    negotiated: Option<AudioFormat>,
    acquired: bool,
    connection: Option<SourceState>,
}

/// Translates provider events into pacing buffer transitions.
///
/// Installed on the service as its [`AudioSink`]; frames go straight into
/// the pacing buffer and speed control toggles playing/buffering.
pub struct TransportAdapter {
    buffer: Arc<PacingBuffer>,
    link: Mutex<LinkState>,
}

impl TransportAdapter {
    pub fn new(buffer: Arc<PacingBuffer>) -> Self {
        Self {
            buffer,
            link: Mutex::new(LinkState::default()),
        }
    }

    /// Format last negotiated by the provider, if any.
    pub fn negotiated_format(&self) -> Option<AudioFormat> {
        self.link.lock().negotiated
    }

    pub fn is_acquired(&self) -> bool {
        self.link.lock().acquired
    }

    /// Last connection state reported by the service.
    pub fn connection_state(&self) -> Option<SourceState> {
        self.link.lock().connection
    }

    /// Record and log a connection state change of the remote device.
    pub fn handle_state_changed(&self, state: SourceState) {
        self.link.lock().connection = Some(state);

        match state {
            SourceState::Connected => log::info!("Bluetooth audio source is now connected"),
            SourceState::ConnectedBad => log::error!("Invalid device connected, can't play"),
            SourceState::Disconnected => log::warn!("Bluetooth audio source is now disconnected"),
            SourceState::Ready => log::info!("Bluetooth audio source now ready"),
            SourceState::Streaming => log::info!("Bluetooth audio source is now streaming"),
        }
    }
}

impl AudioSink for TransportAdapter {
    fn configure(&self, format: &AudioFormat) -> Result<(), SourceError> {
        format.validate().map_err(SourceError::UnsupportedFormat)?;

        self.link.lock().negotiated = Some(*format);

        let prepared = self.buffer.format();
        if prepared != *format {
            log::warn!(
                "Negotiated {} Hz/{} ch differs from prepared {} Hz/{} ch",
                format.sample_rate,
                format.channels,
                prepared.sample_rate,
                prepared.channels
            );
        } else {
            log::info!("Sink configured: {} Hz, {} ch", format.sample_rate, format.channels);
        }
        Ok(())
    }

    fn acquire(&self) -> Result<(), SourceError> {
        let mut link = self.link.lock();
        if link.acquired {
            return Err(SourceError::InvalidState("sink already acquired".into()));
        }
        link.acquired = true;
        log::info!("Sink acquired");
        Ok(())
    }

    fn relinquish(&self) -> Result<(), SourceError> {
        self.link.lock().acquired = false;
        self.buffer.stop();
        log::info!("Sink relinquished");
        Ok(())
    }

    fn set_speed(&self, speed: i8) -> Result<(), SourceError> {
        self.buffer.set_speed(speed)
    }

    fn time(&self) -> Result<u32, SourceError> {
        let millis = self.buffer.played().as_millis();
        Ok(u32::try_from(millis).unwrap_or(u32::MAX))
    }

    fn delay(&self) -> Result<u32, SourceError> {
        Ok(self.buffer.delay_frames())
    }

    fn frame(&self, frame: &[u8]) {
        self.buffer.push(frame);
    }
}
