//! Simulated Bluetooth audio source service.
//!
//! Stands in for the platform's audio source daemon: reports operational and
//! connection state to its listener, drives the installed sink's transport
//! controls, and delivers PCM frames from a dedicated thread at real-time
//! cadence.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use bt_audio_source_core::{
    AudioFormat, AudioSink, PlaybackSpeed, ServiceListener, SourceError, SourceService,
    SourceState,
};

use crate::tone_generator::{Signal, ToneGenerator};

/// Delivery thread wake-up interval.
const DELIVERY_INTERVAL: Duration = Duration::from_millis(10);

/// Largest frame handed to the sink in one call; fits a 16-bit length and
/// holds whole frames for every supported format.
pub const MAX_FRAME_BYTES: usize = 60 * 1024;

/// In-process Bluetooth audio source service.
pub struct SimulatedSourceService {
    format: AudioFormat,
    listener: Mutex<Option<Arc<dyn ServiceListener>>>,
    sink: Mutex<Option<Arc<dyn AudioSink>>>,
    operational: AtomicBool,
    disposed: AtomicBool,

    // Delivery thread control
    running: Arc<AtomicBool>,
    delivery_handle: Mutex<Option<thread::JoinHandle<()>>>,
    bytes_delivered: Arc<AtomicU64>,
}

impl SimulatedSourceService {
    /// A service whose remote device streams `format`.
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            listener: Mutex::new(None),
            sink: Mutex::new(None),
            operational: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
            delivery_handle: Mutex::new(None),
            bytes_delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn is_operational(&self) -> bool {
        self.operational.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn has_sink(&self) -> bool {
        self.sink.lock().is_some()
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// PCM bytes handed to the sink by the delivery thread.
    pub fn bytes_delivered(&self) -> u64 {
        self.bytes_delivered.load(Ordering::SeqCst)
    }

    /// Bring the service up and tell the listener.
    pub fn power_on(&self) {
        self.operational.store(true, Ordering::SeqCst);
        if let Some(listener) = self.listener() {
            listener.on_operational_state_changed(true);
        }
    }

    /// Take the service down. Streaming stops.
    pub fn power_off(&self) {
        self.stop_delivery();
        self.operational.store(false, Ordering::SeqCst);
        if let Some(listener) = self.listener() {
            listener.on_operational_state_changed(false);
        }
    }

    /// A remote device connects: the sink is configured and acquired.
    pub fn connect(&self) -> Result<(), SourceError> {
        let sink = self.require_sink()?;

        self.notify(SourceState::Connected);
        sink.configure(&self.format)?;
        sink.acquire()?;
        self.notify(SourceState::Ready);
        Ok(())
    }

    /// The remote device starts playing `signal`.
    pub fn start_streaming(&self, signal: Signal) -> Result<(), SourceError> {
        self.format.validate().map_err(SourceError::UnsupportedFormat)?;
        let sink = self.require_sink()?;
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::InvalidState("already streaming".into()));
        }

        sink.set_speed(PlaybackSpeed::NOMINAL)?;
        self.notify(SourceState::Streaming);
        self.start_delivery(sink, signal)
    }

    /// The remote device pauses; buffered audio drains on the sink side.
    pub fn pause_streaming(&self) -> Result<(), SourceError> {
        let sink = self.require_sink()?;
        self.stop_delivery();
        sink.set_speed(PlaybackSpeed::STOPPED)?;
        self.notify(SourceState::Ready);
        Ok(())
    }

    /// The remote device goes away.
    pub fn disconnect(&self) -> Result<(), SourceError> {
        self.stop_delivery();
        let result = match self.sink() {
            Some(sink) => sink.relinquish(),
            None => Ok(()),
        };
        self.notify(SourceState::Disconnected);
        result
    }

    /// Forward a raw speed control value to the sink.
    pub fn send_speed(&self, speed: i8) -> Result<(), SourceError> {
        self.require_sink()?.set_speed(speed)
    }

    /// Hand a frame to the sink directly, bypassing the delivery thread.
    pub fn inject_frame(&self, frame: &[u8]) -> Result<(), SourceError> {
        self.require_sink()?.frame(frame);
        Ok(())
    }

    /// Played time reported by the sink, in milliseconds.
    pub fn query_time(&self) -> Result<u32, SourceError> {
        self.require_sink()?.time()
    }

    /// Buffered frames reported by the sink.
    pub fn query_delay(&self) -> Result<u32, SourceError> {
        self.require_sink()?.delay()
    }

    // --- Internal helpers ---

    fn listener(&self) -> Option<Arc<dyn ServiceListener>> {
        self.listener.lock().clone()
    }

    fn sink(&self) -> Option<Arc<dyn AudioSink>> {
        self.sink.lock().clone()
    }

    fn require_sink(&self) -> Result<Arc<dyn AudioSink>, SourceError> {
        if !self.is_operational() || self.is_disposed() {
            return Err(SourceError::ServiceUnavailable);
        }
        self.sink()
            .ok_or_else(|| SourceError::InvalidState("no sink installed".into()))
    }

    /// Listener callbacks run without any service lock held, so they may
    /// call back into the service.
    fn notify(&self, state: SourceState) {
        if let Some(listener) = self.listener() {
            listener.on_state_changed(state);
        }
    }

    fn start_delivery(&self, sink: Arc<dyn AudioSink>, signal: Signal) -> Result<(), SourceError> {
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let delivered = Arc::clone(&self.bytes_delivered);
        let generator = ToneGenerator::new(self.format, signal);

        let handle = thread::Builder::new()
            .name("bt-audio-delivery".into())
            .spawn(move || {
                let _running = RunningGuard(&running);
                delivery_loop(&running, &delivered, sink, generator);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                SourceError::ServiceCallFailed(format!("failed to spawn delivery thread: {}", e))
            })?;

        *self.delivery_handle.lock() = Some(handle);
        Ok(())
    }

    fn stop_delivery(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.delivery_handle.lock().take() {
            if handle.join().is_err() {
                log::error!("Delivery thread panicked");
            }
        }
    }
}

/// Clears the run flag when the delivery thread exits, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Deliver exactly as many frames as wall-clock time since the start allows,
/// polling every 10 ms.
fn delivery_loop(
    running: &AtomicBool,
    delivered: &AtomicU64,
    sink: Arc<dyn AudioSink>,
    mut generator: ToneGenerator,
) {
    let format = generator.format();
    let bytes_per_frame = format.bytes_per_frame() as usize;
    let frames_per_chunk = MAX_FRAME_BYTES / bytes_per_frame;
    let started = Instant::now();

    log::info!(
        "Delivery started: {} Hz, {} ch",
        format.sample_rate,
        format.channels
    );

    while running.load(Ordering::SeqCst) {
        thread::sleep(DELIVERY_INTERVAL);

        let due = started.elapsed().as_nanos() * format.sample_rate as u128 / 1_000_000_000;
        let mut pending = (due as u64).saturating_sub(generator.frames_generated()) as usize;

        while pending > 0 {
            let frames = pending.min(frames_per_chunk);
            let block = generator.next_block(frames);
            sink.frame(&block);
            delivered.fetch_add(block.len() as u64, Ordering::SeqCst);
            pending -= frames;
        }
    }

    log::info!("Delivery stopped after {} frames", generator.frames_generated());
}

impl SourceService for SimulatedSourceService {
    fn register_listener(&self, listener: Arc<dyn ServiceListener>) -> Result<(), SourceError> {
        if self.is_disposed() {
            return Err(SourceError::ServiceUnavailable);
        }
        *self.listener.lock() = Some(Arc::clone(&listener));

        // Late subscribers learn about an already running service right away.
        if self.is_operational() {
            listener.on_operational_state_changed(true);
        }
        Ok(())
    }

    fn unregister_listener(&self) {
        *self.listener.lock() = None;
    }

    fn set_sink(&self, sink: Option<Arc<dyn AudioSink>>) -> Result<(), SourceError> {
        if sink.is_none() {
            self.stop_delivery();
        }
        *self.sink.lock() = sink;
        Ok(())
    }

    fn relinquish(&self) -> Result<(), SourceError> {
        self.stop_delivery();
        match self.sink() {
            Some(sink) => sink.relinquish(),
            None => Ok(()),
        }
    }

    fn dispose(&self) {
        self.stop_delivery();
        self.disposed.store(true, Ordering::SeqCst);
        *self.sink.lock() = None;
        *self.listener.lock() = None;
        log::info!("Simulated audio source service disposed");
    }
}

impl Drop for SimulatedSourceService {
    fn drop(&mut self) {
        self.stop_delivery();
    }
}
