use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::config::SourceConfiguration;
use crate::models::diagnostics::BufferDiagnostics;
use crate::models::error::SourceError;
use crate::models::format::AudioFormat;
use crate::models::state::PlaybackSpeed;
use crate::processing::media_clock::MediaClock;
use crate::processing::ring_buffer::RingBuffer;

/// Shared playback state, protected by one `parking_lot::Mutex`.
struct PacingState {
    ring: RingBuffer,
    format: AudioFormat,
    playing: bool,
    buffering: bool,
    reset_requested: bool,
    clock: MediaClock,
    diagnostics: BufferDiagnostics,
}

impl PacingState {
    fn advance_clock(&mut self, bytes: usize) -> Duration {
        self.clock.advance(bytes, self.format.byte_rate())
    }
}

/// Bridges asynchronous frame pushes to blocking, real-time paced reads.
///
/// ```text
/// [frame callback] → push() ─┐
///                            ├→ [RingBuffer] → read() → [pipeline thread]
/// [set_speed / reset] ───────┘
/// ```
///
/// The producer side only holds the lock for one buffer write. The consumer
/// side holds it for one read-and-bookkeeping step per loop iteration, and
/// waits for the wall clock with the lock released.
pub struct PacingBuffer {
    state: Mutex<PacingState>,
    wakeup: Condvar,
    live_pacing: bool,
}

impl PacingBuffer {
    /// Allocate the receive buffer. Fails with `AllocationFailed` when the
    /// fixed-size buffer cannot be reserved.
    pub fn new(config: &SourceConfiguration) -> Result<Self, SourceError> {
        config.validate().map_err(SourceError::ConfigurationFailed)?;

        let ring = RingBuffer::new(config.buffer_capacity)?;

        Ok(Self {
            state: Mutex::new(PacingState {
                ring,
                format: config.default_format,
                playing: false,
                buffering: false,
                reset_requested: false,
                clock: MediaClock::new(),
                diagnostics: BufferDiagnostics::default(),
            }),
            wakeup: Condvar::new(),
            live_pacing: config.live_pacing,
        })
    }

    /// Queue a frame delivered by the producer. Never blocks beyond the lock hold time.
    ///
    /// On overflow the oldest unread bytes are discarded.
    pub fn push(&self, frame: &[u8]) {
        let (outcome, buffered) = {
            let mut s = self.state.lock();
            let outcome = s.ring.write(frame);
            s.diagnostics.frames_pushed += 1;
            s.diagnostics.bytes_pushed += frame.len() as u64;
            if outcome.overflowed {
                s.diagnostics.overflow_count += 1;
                s.diagnostics.bytes_dropped += outcome.dropped as u64;
            }
            (outcome, s.ring.len())
        };

        if outcome.overflowed {
            log::warn!(
                "Buffer overflow ({} bytes dropped, {} buffered)",
                outcome.dropped,
                buffered
            );
        }
    }

    /// Fill `dest` with audio, blocking until it is filled or a reset is requested.
    ///
    /// Returns the number of bytes filled. This is `dest.len()` unless a reset
    /// cut the read short.
    ///
    /// Each iteration either serves buffered data or, when too little is
    /// available for a live source, zero-fills everything still outstanding.
    /// Either way the media clock is credited. Afterwards the call waits until
    /// the wall clock catches up with the played media time.
    pub fn read(&self, dest: &mut [u8]) -> usize {
        let length = dest.len();
        let mut filled = 0;
        let mut advanced = false;
        let mut cancelled = false;

        if length == 0 {
            return 0;
        }

        self.state.lock().diagnostics.reads += 1;

        while filled < length {
            let mut guard = self.state.lock();
            let s = &mut *guard;

            if s.reset_requested {
                cancelled = true;
                s.diagnostics.cancelled_reads += 1;
                break;
            }

            let remaining = length - filled;
            let available = s.ring.len();

            let threshold = if s.buffering {
                let threshold = s.ring.capacity() / 4;
                log::debug!("buffering... ({}/{})", available, threshold);
                threshold
            } else {
                remaining
            };

            if (s.playing && available >= threshold) || (!s.playing && available > 0) {
                // Playing with enough buffered, or stopped but data left to play out.
                let count = s.ring.read(&mut dest[filled..]);
                filled += count;
                s.advance_clock(count);
                s.buffering = false;
                s.diagnostics.bytes_served += count as u64;
            } else {
                if s.playing && !s.buffering {
                    s.diagnostics.underflow_count += 1;
                    log::warn!("buffer underflow ({}/{})", available, threshold);
                }

                // Live source: stuff the rest with silence instead of stalling.
                dest[filled..].fill(0);
                s.advance_clock(remaining);
                s.diagnostics.silence_bytes += remaining as u64;
                filled = length;
            }

            advanced = true;
        }

        if advanced && !cancelled && self.live_pacing {
            self.pace();
        }

        filled
    }

    /// Wait until wall-clock time since the anchor reaches played media time.
    ///
    /// Returns early when a reset is requested. No wait when behind schedule
    /// or when the clock has not been anchored.
    fn pace(&self) {
        let mut guard = self.state.lock();
        let Some(deadline) = guard.clock.deadline() else {
            return;
        };

        while !guard.reset_requested && Instant::now() < deadline {
            if self.wakeup.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
    }

    /// Anchor pacing for a playing session: wall clock now, played time zero.
    pub fn start_clock(&self) {
        self.state.lock().clock.anchor(Instant::now());
        log::info!("Media clock anchored");
    }

    /// Apply a transport speed control value.
    ///
    /// `0` stops playing; `100` clears a pending reset and starts playing with
    /// a fresh startup fill. Every other value is rejected and leaves the
    /// state untouched.
    pub fn set_speed(&self, speed: i8) -> Result<(), SourceError> {
        match PlaybackSpeed::from_raw(speed) {
            Some(PlaybackSpeed::Stopped) => {
                self.stop();
                Ok(())
            }
            Some(PlaybackSpeed::Nominal) => {
                {
                    let mut s = self.state.lock();
                    s.reset_requested = false;
                    s.playing = true;
                    s.buffering = true;
                }
                log::info!("Playback started, buffering");
                Ok(())
            }
            None => {
                log::warn!("Rejected unsupported playback speed {}", speed);
                Err(SourceError::UnsupportedSpeed(speed))
            }
        }
    }

    /// Stop playing. Data still buffered is played out before silence.
    pub fn stop(&self) {
        {
            let mut s = self.state.lock();
            s.playing = false;
            s.buffering = false;
        }
        log::info!("Playback stopped");
    }

    /// Request cancellation of any pending or future read.
    ///
    /// Stays in effect until the next `prepare` or nominal-speed start.
    pub fn reset(&self) {
        self.state.lock().reset_requested = true;
        self.wakeup.notify_all();
    }

    /// Start a new session with `format`: clears buffered data, the reset
    /// flag, the media clock and diagnostics.
    pub fn prepare(&self, format: AudioFormat) -> Result<(), SourceError> {
        format.validate().map_err(SourceError::UnsupportedFormat)?;

        let mut s = self.state.lock();
        s.format = format;
        s.ring.clear();
        s.reset_requested = false;
        s.clock = MediaClock::new();
        s.diagnostics = BufferDiagnostics::default();
        Ok(())
    }

    /// Buffered, unplayed audio in frames.
    pub fn delay_frames(&self) -> u32 {
        let s = self.state.lock();
        let bytes_per_frame = s.format.bytes_per_frame().max(1) as usize;
        (s.ring.len() / bytes_per_frame) as u32
    }

    pub fn buffered_bytes(&self) -> usize {
        self.state.lock().ring.len()
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().ring.capacity()
    }

    pub fn format(&self) -> AudioFormat {
        self.state.lock().format
    }

    /// Total media time handed to the consumer since the clock was anchored.
    pub fn played(&self) -> Duration {
        self.state.lock().clock.played()
    }

    /// How far played media time runs ahead of the wall clock right now.
    pub fn lead(&self) -> Duration {
        self.state.lock().clock.lead(Instant::now())
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn is_buffering(&self) -> bool {
        self.state.lock().buffering
    }

    pub fn is_reset_requested(&self) -> bool {
        self.state.lock().reset_requested
    }

    pub fn diagnostics(&self) -> BufferDiagnostics {
        self.state.lock().diagnostics.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use approx::assert_relative_eq;

    use super::*;

    fn unpaced(capacity: usize) -> PacingBuffer {
        let config = SourceConfiguration {
            buffer_capacity: capacity,
            live_pacing: false,
            ..Default::default()
        };
        PacingBuffer::new(&config).unwrap()
    }

    fn paced(format: AudioFormat) -> PacingBuffer {
        let config = SourceConfiguration {
            default_format: format,
            ..Default::default()
        };
        PacingBuffer::new(&config).unwrap()
    }

    fn paced_off_default() -> PacingBuffer {
        unpaced(SourceConfiguration::default().buffer_capacity)
    }

    fn seconds_for(bytes: usize, format: AudioFormat) -> f64 {
        bytes as f64 * 8.0 / format.bitrate() as f64
    }

    #[test]
    fn allocation_failure_surfaces_at_construction() {
        let config = SourceConfiguration {
            buffer_capacity: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(
            PacingBuffer::new(&config),
            Err(SourceError::AllocationFailed { capacity: usize::MAX })
        ));
    }

    #[test]
    fn drains_pushed_bytes_when_stopped() {
        let buffer = unpaced(16);
        buffer.push(&(0..10).collect::<Vec<u8>>());

        let mut out = [0xffu8; 6];
        assert_eq!(buffer.read(&mut out), 6);
        assert_eq!(out, [0, 1, 2, 3, 4, 5]);
        assert_eq!(buffer.buffered_bytes(), 4);
    }

    #[test]
    fn stopped_and_empty_reads_silence() {
        let buffer = unpaced(16);
        let format = buffer.format();

        let mut out = [0xffu8; 100];
        assert_eq!(buffer.read(&mut out), 100);
        assert!(out.iter().all(|&b| b == 0));
        assert_relative_eq!(
            buffer.played().as_secs_f64(),
            seconds_for(100, format),
            epsilon = 1e-8
        );

        let diag = buffer.diagnostics();
        assert_eq!(diag.silence_bytes, 100);
        assert_eq!(diag.underflow_count, 0);
    }

    #[test]
    fn stopped_plays_out_remaining_data_then_silence() {
        let buffer = unpaced(64);
        buffer.push(&[7u8; 10]);

        let mut out = [0xffu8; 16];
        assert_eq!(buffer.read(&mut out), 16);
        assert_eq!(&out[..10], &[7u8; 10]);
        assert_eq!(&out[10..], &[0u8; 6]);
        assert_eq!(buffer.diagnostics().underflow_count, 0);
    }

    #[test]
    fn startup_buffering_withholds_data() {
        let buffer = paced_off_default();
        let quarter = buffer.capacity() / 4;
        buffer.set_speed(100).unwrap();
        assert!(buffer.is_buffering());

        let mut out = [0xffu8; 1000];
        assert_eq!(buffer.read(&mut out), 1000);
        assert!(out.iter().all(|&b| b == 0));
        assert!(buffer.is_buffering());
        assert_eq!(buffer.diagnostics().underflow_count, 0);

        buffer.push(&vec![1u8; quarter - 1]);
        buffer.read(&mut out);
        assert!(out.iter().all(|&b| b == 0));
        assert_eq!(buffer.buffered_bytes(), quarter - 1);

        buffer.push(&[1u8]);
        buffer.read(&mut out);
        assert!(out.iter().all(|&b| b == 1));
        assert!(!buffer.is_buffering());
        assert_eq!(buffer.buffered_bytes(), quarter - 1000);
    }

    #[test]
    fn startup_silence_still_advances_clock() {
        let buffer = paced_off_default();
        let format = buffer.format();
        buffer.set_speed(100).unwrap();

        let mut out = vec![0u8; 1000];
        buffer.read(&mut out);
        buffer.read(&mut out);
        assert_relative_eq!(
            buffer.played().as_secs_f64(),
            seconds_for(2000, format),
            epsilon = 1e-8
        );
    }

    #[test]
    fn underflow_mixes_data_and_silence() {
        let buffer = unpaced(64);
        let format = buffer.format();
        let data: Vec<u8> = (1..=20).collect();
        buffer.set_speed(100).unwrap();
        buffer.push(&data);

        // 20 ≥ 64/4: served, then the rest underflows into silence.
        let mut out = [0xffu8; 32];
        assert_eq!(buffer.read(&mut out), 32);
        assert_eq!(&out[..20], data.as_slice());
        assert_eq!(&out[20..], &[0u8; 12]);
        assert_relative_eq!(
            buffer.played().as_secs_f64(),
            seconds_for(32, format),
            epsilon = 1e-8
        );

        let diag = buffer.diagnostics();
        assert_eq!(diag.bytes_served, 20);
        assert_eq!(diag.silence_bytes, 12);
        assert_eq!(diag.underflow_count, 1);
    }

    #[test]
    fn playing_short_buffer_keeps_data_for_next_read() {
        let buffer = unpaced(64);
        buffer.set_speed(100).unwrap();
        buffer.push(&[5u8; 20]);

        let mut out = [0u8; 8];
        buffer.read(&mut out); // leaves buffering
        assert_eq!(buffer.buffered_bytes(), 12);

        // Fewer than requested: whole request becomes silence, data stays.
        let mut big = [0xffu8; 16];
        buffer.read(&mut big);
        assert!(big.iter().all(|&b| b == 0));
        assert_eq!(buffer.buffered_bytes(), 12);
        assert_eq!(buffer.diagnostics().underflow_count, 1);

        let mut small = [0u8; 12];
        buffer.read(&mut small);
        assert_eq!(small, [5u8; 12]);
    }

    #[test]
    fn overflow_is_counted() {
        let buffer = unpaced(16);
        buffer.push(&[1u8; 12]);
        buffer.push(&[2u8; 8]);

        let diag = buffer.diagnostics();
        assert_eq!(diag.frames_pushed, 2);
        assert_eq!(diag.bytes_pushed, 20);
        assert_eq!(diag.overflow_count, 1);
        assert_eq!(buffer.buffered_bytes(), 4);
    }

    #[test]
    fn reset_cancels_reads_until_start() {
        let buffer = unpaced(64);
        buffer.push(&[3u8; 10]);
        buffer.reset();
        assert!(buffer.is_reset_requested());

        let mut out = [0xffu8; 8];
        assert_eq!(buffer.read(&mut out), 0);
        assert_eq!(out, [0xffu8; 8]);
        assert_eq!(buffer.read(&mut out), 0);
        assert_eq!(buffer.diagnostics().cancelled_reads, 2);
        assert_eq!(buffer.played(), Duration::ZERO);

        buffer.set_speed(100).unwrap();
        assert!(!buffer.is_reset_requested());
        assert_eq!(buffer.read(&mut out), 8);
    }

    #[test]
    fn prepare_clears_reset_and_data() {
        let buffer = unpaced(64);
        buffer.push(&[3u8; 10]);
        buffer.reset();

        buffer.prepare(AudioFormat::new(48000, 1, 16)).unwrap();
        assert!(!buffer.is_reset_requested());
        assert_eq!(buffer.buffered_bytes(), 0);
        assert_eq!(buffer.format().channels, 1);
        assert_eq!(buffer.diagnostics(), BufferDiagnostics::default());
    }

    #[test]
    fn prepare_rejects_unsupported_format() {
        let buffer = unpaced(64);
        let err = buffer.prepare(AudioFormat::new(22050, 2, 16)).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat(_)));
        assert_eq!(buffer.format(), AudioFormat::default());
    }

    #[test]
    fn unsupported_speed_leaves_state_untouched() {
        let buffer = unpaced(64);
        buffer.reset();

        assert_eq!(buffer.set_speed(50), Err(SourceError::UnsupportedSpeed(50)));
        assert_eq!(buffer.set_speed(-1), Err(SourceError::UnsupportedSpeed(-1)));
        assert!(!buffer.is_playing());
        assert!(buffer.is_reset_requested());
    }

    #[test]
    fn stop_clears_buffering() {
        let buffer = unpaced(64);
        buffer.set_speed(100).unwrap();
        assert!(buffer.is_playing() && buffer.is_buffering());

        buffer.set_speed(0).unwrap();
        assert!(!buffer.is_playing());
        assert!(!buffer.is_buffering());
    }

    #[test]
    fn delay_reports_buffered_frames() {
        let buffer = unpaced(64);
        assert_eq!(buffer.delay_frames(), 0);

        buffer.push(&[0u8; 10]); // stereo 16-bit: 4 bytes per frame
        assert_eq!(buffer.delay_frames(), 2);

        buffer.prepare(AudioFormat::new(44100, 1, 16)).unwrap();
        buffer.push(&[0u8; 10]);
        assert_eq!(buffer.delay_frames(), 5);
    }

    #[test]
    fn empty_read_returns_immediately() {
        let buffer = unpaced(16);
        assert_eq!(buffer.read(&mut []), 0);
        assert_eq!(buffer.diagnostics().reads, 0);
    }

    #[test]
    fn pacing_holds_reads_to_real_time() {
        let format = AudioFormat::s16_stereo(48000);
        let buffer = paced(format);
        let chunk = format.bytes_for_millis(100);
        buffer.start_clock();

        let started = Instant::now();
        let mut out = vec![0u8; chunk];
        for _ in 0..3 {
            assert_eq!(buffer.read(&mut out), chunk);
            assert!(buffer.lead() <= Duration::from_millis(5));
        }

        assert!(started.elapsed() >= Duration::from_millis(295));
        assert_eq!(buffer.played(), Duration::from_millis(300));
    }

    #[test]
    fn no_wait_when_behind_schedule() {
        let format = AudioFormat::s16_stereo(48000);
        let buffer = paced(format);
        buffer.start_clock();
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        let mut out = vec![0u8; format.bytes_for_millis(20)];
        buffer.read(&mut out);
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn no_wait_before_clock_is_anchored() {
        let format = AudioFormat::s16_stereo(48000);
        let buffer = paced(format);

        let started = Instant::now();
        let mut out = vec![0u8; format.bytes_for_millis(1000)];
        buffer.read(&mut out);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn reset_interrupts_pacing_wait() {
        let format = AudioFormat::s16_stereo(48000);
        let buffer = Arc::new(paced(format));
        buffer.start_clock();

        let reader = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut out = vec![0u8; format.bytes_for_millis(2000)];
                let started = Instant::now();
                let filled = buffer.read(&mut out);
                (filled, started.elapsed())
            })
        };

        // Wait for the reader to be inside its pacing wait.
        while buffer.played() == Duration::ZERO {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(20));
        buffer.reset();

        let (filled, elapsed) = reader.join().unwrap();
        assert_eq!(filled, format.bytes_for_millis(2000));
        assert!(elapsed < Duration::from_millis(1000));

        let mut out = [0u8; 64];
        assert_eq!(buffer.read(&mut out), 0);
    }

    #[test]
    fn concurrent_pushes_never_exceed_capacity() {
        let buffer = Arc::new(unpaced(1024));

        let producers: Vec<_> = (0..4)
            .map(|i| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for n in 0..200 {
                        buffer.push(&vec![i as u8; 1 + (n * 7) % 300]);
                        assert!(buffer.buffered_bytes() <= 1024);
                    }
                })
            })
            .collect();

        let mut out = vec![0u8; 256];
        for _ in 0..200 {
            buffer.read(&mut out);
            assert!(buffer.buffered_bytes() <= 1024);
        }

        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(buffer.diagnostics().frames_pushed, 800);
    }
}
