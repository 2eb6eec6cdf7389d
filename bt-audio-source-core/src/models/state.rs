use std::fmt;

/// Facade lifecycle, driven by the host pipeline.
///
/// State transitions:
/// ```text
/// closed → opened → prepared ⇄ playing
///    ↑        ↑         │
///    └─close──┴─unprepare
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLifecycle {
    Closed,
    Opened,
    Prepared,
    Playing,
}

impl SourceLifecycle {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Whether the pipeline may pull audio in this state.
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Prepared | Self::Playing)
    }
}

impl fmt::Display for SourceLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opened => "opened",
            Self::Prepared => "prepared",
            Self::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// Connection state reported by the Bluetooth audio source service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceState {
    Connected,
    /// A device connected but cannot be played from.
    ConnectedBad,
    Disconnected,
    Ready,
    Streaming,
}

/// Playback speed in percent, as sent by the transport.
///
/// Only stop and nominal speed are defined; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSpeed {
    Stopped,
    Nominal,
}

impl PlaybackSpeed {
    pub const STOPPED: i8 = 0;
    pub const NOMINAL: i8 = 100;

    pub fn from_raw(speed: i8) -> Option<Self> {
        match speed {
            Self::STOPPED => Some(Self::Stopped),
            Self::NOMINAL => Some(Self::Nominal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_allowed_only_when_prepared() {
        assert!(!SourceLifecycle::Closed.can_read());
        assert!(!SourceLifecycle::Opened.can_read());
        assert!(SourceLifecycle::Prepared.can_read());
        assert!(SourceLifecycle::Playing.can_read());
    }

    #[test]
    fn speed_mapping_is_total() {
        assert_eq!(PlaybackSpeed::from_raw(0), Some(PlaybackSpeed::Stopped));
        assert_eq!(PlaybackSpeed::from_raw(100), Some(PlaybackSpeed::Nominal));
        for raw in [i8::MIN, -100, -1, 1, 50, 99, 101, i8::MAX] {
            assert_eq!(PlaybackSpeed::from_raw(raw), None, "speed {raw}");
        }
    }
}
