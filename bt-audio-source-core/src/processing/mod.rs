pub mod media_clock;
pub mod pacing_buffer;
pub mod ring_buffer;
