use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::SourceConfiguration;
use crate::models::diagnostics::{BufferDiagnostics, SessionInfo};
use crate::models::error::SourceError;
use crate::models::format::AudioFormat;
use crate::models::state::SourceLifecycle;
use crate::processing::pacing_buffer::PacingBuffer;
use crate::session::service_handle::ServiceHandle;
use crate::session::transport::TransportAdapter;
use crate::traits::source_service::SourceService;

/// Pull-style Bluetooth audio source, as seen by a playback pipeline.
///
/// Generic over the audio source service via the `SourceService` trait.
/// The service pushes frames and transport controls into the transport
/// adapter; the pipeline thread pulls fixed-size blocks with [`read`].
///
/// ```text
/// [SourceService] → [TransportAdapter] → [PacingBuffer] → read() → [pipeline]
/// ```
///
/// All methods take `&self` so that `reset` can be called from another
/// thread while `read` blocks.
///
/// [`read`]: BluetoothAudioSource::read
pub struct BluetoothAudioSource<S: SourceService + 'static> {
    buffer: Arc<PacingBuffer>,
    transport: Arc<TransportAdapter>,
    lifecycle: Mutex<SourceLifecycle>,
    session: Mutex<Option<SessionInfo>>,
    // Dropped after everything above has stopped being used.
    handle: ServiceHandle<S>,
}

impl<S: SourceService + 'static> BluetoothAudioSource<S> {
    /// Allocate the receive buffer and register with `service`.
    pub fn new(service: Arc<S>, config: SourceConfiguration) -> Result<Self, SourceError> {
        log::debug!("init");

        let buffer = Arc::new(PacingBuffer::new(&config)?);
        let transport = Arc::new(TransportAdapter::new(Arc::clone(&buffer)));
        let handle = ServiceHandle::acquire(service, Arc::clone(&transport))?;

        Ok(Self {
            buffer,
            transport,
            lifecycle: Mutex::new(SourceLifecycle::Closed),
            session: Mutex::new(None),
            handle,
        })
    }

    pub fn lifecycle(&self) -> SourceLifecycle {
        *self.lifecycle.lock()
    }

    pub fn session(&self) -> Option<SessionInfo> {
        self.session.lock().clone()
    }

    pub fn diagnostics(&self) -> BufferDiagnostics {
        self.buffer.diagnostics()
    }

    /// Format the pipeline is fed with.
    pub fn format(&self) -> AudioFormat {
        self.buffer.format()
    }

    /// Format the provider negotiated, if it has configured the sink.
    pub fn negotiated_format(&self) -> Option<AudioFormat> {
        self.transport.negotiated_format()
    }

    pub fn transport(&self) -> &Arc<TransportAdapter> {
        &self.transport
    }

    pub fn service(&self) -> &Arc<S> {
        self.handle.service()
    }

    /// Transitions: closed → opened.
    pub fn open(&self) -> Result<(), SourceError> {
        log::debug!("open");
        self.transition(SourceLifecycle::Opened, |s| s.is_closed(), "can only open from closed state")
    }

    /// Prepare a session with `format`. Transitions: opened → prepared.
    pub fn prepare(&self, format: AudioFormat) -> Result<(), SourceError> {
        log::debug!("prepare");

        let mut lifecycle = self.lifecycle.lock();
        if *lifecycle != SourceLifecycle::Opened {
            return Err(SourceError::InvalidState(
                "can only prepare from opened state".into(),
            ));
        }

        self.buffer.prepare(format)?;

        // Until the remote side configures the link, the prepared format stands in.
        let negotiated = self.transport.negotiated_format().unwrap_or(format);
        let session = SessionInfo::new(negotiated);
        log::info!(
            "Prepared session {} ({} Hz, {} ch)",
            session.id,
            negotiated.sample_rate,
            negotiated.channels
        );
        *self.session.lock() = Some(session);
        *lifecycle = SourceLifecycle::Prepared;
        Ok(())
    }

    /// The pipeline went to playing: anchor pacing. Transitions: prepared → playing.
    pub fn start(&self) -> Result<(), SourceError> {
        self.transition(
            SourceLifecycle::Playing,
            |s| *s == SourceLifecycle::Prepared,
            "can only start from prepared state",
        )?;
        self.buffer.start_clock();
        log::info!("State changed to playing");
        Ok(())
    }

    /// Transitions: playing → prepared.
    pub fn pause(&self) -> Result<(), SourceError> {
        self.transition(
            SourceLifecycle::Prepared,
            |s| s.is_playing(),
            "can only pause from playing state",
        )
    }

    /// Undo `prepare`. Any blocked read is released. Transitions: prepared/playing → opened.
    pub fn unprepare(&self) -> Result<(), SourceError> {
        log::debug!("unprepare");
        self.transition(
            SourceLifecycle::Opened,
            |s| s.can_read(),
            "can only unprepare from prepared or playing state",
        )?;
        self.buffer.reset();
        *self.session.lock() = None;
        Ok(())
    }

    /// Transitions: opened → closed.
    pub fn close(&self) -> Result<(), SourceError> {
        log::debug!("close");
        self.transition(
            SourceLifecycle::Closed,
            |s| *s == SourceLifecycle::Opened,
            "can only close from opened state",
        )
    }

    /// Blocking read of `dest.len()` bytes of S16LE PCM.
    ///
    /// Returns the number of bytes filled; fewer than requested only when
    /// cancelled with [`reset`](Self::reset).
    pub fn read(&self, dest: &mut [u8]) -> Result<usize, SourceError> {
        let lifecycle = self.lifecycle();
        if !lifecycle.can_read() {
            return Err(SourceError::InvalidState(format!(
                "cannot read while {}",
                lifecycle
            )));
        }
        Ok(self.buffer.read(dest))
    }

    /// Frames queued and not yet read.
    pub fn delay(&self) -> u32 {
        self.buffer.delay_frames()
    }

    /// Unblock a pending read. Reads return immediately until the next
    /// prepare or transport start.
    pub fn reset(&self) {
        log::debug!("reset");
        self.buffer.reset();
    }

    fn transition(
        &self,
        to: SourceLifecycle,
        allowed: impl FnOnce(&SourceLifecycle) -> bool,
        message: &str,
    ) -> Result<(), SourceError> {
        let mut lifecycle = self.lifecycle.lock();
        if !allowed(&*lifecycle) {
            return Err(SourceError::InvalidState(message.into()));
        }
        *lifecycle = to;
        Ok(())
    }
}
