use crate::models::error::SourceError;

/// Fixed-capacity receive buffer for PCM bytes.
///
/// Valid data always starts at offset 0 and spans `[0, write_offset)`.
/// Reads take from the front and compact the remainder back to the head.
/// Not thread-safe; [`PacingBuffer`](super::pacing_buffer::PacingBuffer)
/// owns it behind its own lock.
///
/// Overflow behavior: a write that does not fit before the physical end
/// wraps to the start of storage, and the write offset becomes the length
/// of the wrapped remainder. Unread data in front of it is lost.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<u8>,
    write_offset: usize,
}

/// Result of a single [`RingBuffer::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Whether the write wrapped around and discarded unread bytes.
    pub overflowed: bool,
    /// Unread bytes that are no longer readable after the write.
    pub dropped: usize,
}

impl RingBuffer {
    /// Allocate a buffer of `capacity` bytes.
    ///
    /// The allocation is fallible so that a failure surfaces at construction.
    pub fn new(capacity: usize) -> Result<Self, SourceError> {
        if capacity == 0 {
            return Err(SourceError::ConfigurationFailed(
                "ring buffer capacity must be non-zero".into(),
            ));
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| SourceError::AllocationFailed { capacity })?;
        buffer.resize(capacity, 0);

        Ok(Self {
            buffer,
            write_offset: 0,
        })
    }

    /// Append `bytes` after the unread data.
    ///
    /// Bytes that fit strictly before the physical end are copied in place.
    /// Otherwise the leading part fills the tail of storage, the rest lands
    /// at offset 0, and only that wrapped rest remains readable. When the
    /// wrapped rest is itself longer than the capacity, only its newest
    /// `capacity` bytes are kept.
    pub fn write(&mut self, bytes: &[u8]) -> WriteOutcome {
        let no_loss = WriteOutcome {
            overflowed: false,
            dropped: 0,
        };
        if bytes.is_empty() {
            return no_loss;
        }

        let capacity = self.buffer.len();
        let before = self.write_offset;

        if bytes.len() < capacity - self.write_offset {
            let end = self.write_offset + bytes.len();
            self.buffer[self.write_offset..end].copy_from_slice(bytes);
            self.write_offset = end;
            return no_loss;
        }

        // Wrap around
        let head = capacity - self.write_offset;
        self.buffer[self.write_offset..].copy_from_slice(&bytes[..head]);

        let wrapped = &bytes[head..];
        let wrapped = if wrapped.len() > capacity {
            &wrapped[wrapped.len() - capacity..]
        } else {
            wrapped
        };
        self.buffer[..wrapped.len()].copy_from_slice(wrapped);
        self.write_offset = wrapped.len();

        WriteOutcome {
            overflowed: true,
            dropped: (before + bytes.len()).saturating_sub(self.write_offset),
        }
    }

    /// Copy up to `dest.len()` bytes from the front into `dest`.
    ///
    /// Returns the number of bytes copied; 0 when empty.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let count = dest.len().min(self.write_offset);
        if count == 0 {
            return 0;
        }

        dest[..count].copy_from_slice(&self.buffer[..count]);
        self.buffer.copy_within(count..self.write_offset, 0);
        self.write_offset -= count;
        count
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.write_offset
    }

    pub fn is_empty(&self) -> bool {
        self.write_offset == 0
    }

    /// Discard all unread bytes. Storage is kept.
    pub fn clear(&mut self) {
        self.write_offset = 0;
    }

    /// The total capacity of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
