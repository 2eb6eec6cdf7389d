use std::time::{Duration, Instant};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Accumulated played media time, anchored to the wall clock at playback start.
#[derive(Debug, Clone, Default)]
pub struct MediaClock {
    /// Played time settled at earlier byte rates.
    settled_ns: u64,
    /// Bytes credited at `rate` since the last rate change.
    pending_bytes: u64,
    rate: u32,
    base: Option<Instant>,
}

impl MediaClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor the clock at `now` and restart played time from zero.
    pub fn anchor(&mut self, now: Instant) {
        self.base = Some(now);
        self.settled_ns = 0;
        self.pending_bytes = 0;
    }

    /// Credit `bytes` of media at `byte_rate` bytes per second.
    ///
    /// Returns the total played time. Time is derived from the byte total,
    /// so rounding never accumulates across calls.
    pub fn advance(&mut self, bytes: usize, byte_rate: u32) -> Duration {
        if byte_rate == 0 {
            return self.played();
        }
        if byte_rate != self.rate {
            self.settled_ns = self.played_ns();
            self.pending_bytes = 0;
            self.rate = byte_rate;
        }
        self.pending_bytes = self.pending_bytes.saturating_add(bytes as u64);
        self.played()
    }

    pub fn played(&self) -> Duration {
        Duration::from_nanos(self.played_ns())
    }

    fn played_ns(&self) -> u64 {
        if self.rate == 0 {
            return self.settled_ns;
        }
        let pending = NANOS_PER_SEC as u128 * self.pending_bytes as u128 / self.rate as u128;
        self.settled_ns
            .saturating_add(u64::try_from(pending).unwrap_or(u64::MAX))
    }

    /// Wall-clock instant at which played media time is due.
    ///
    /// `None` until the clock has been anchored.
    pub fn deadline(&self) -> Option<Instant> {
        self.base.map(|base| base + self.played())
    }

    /// How far played media time runs ahead of the wall clock at `now`.
    ///
    /// Zero when behind schedule or not anchored.
    pub fn lead(&self, now: Instant) -> Duration {
        match self.base {
            Some(base) => self.played().saturating_sub(now.saturating_duration_since(base)),
            None => Duration::ZERO,
        }
    }
}
