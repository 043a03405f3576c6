//! Byte accumulation and idle-time frame delimiting
//!
//! RTU frames have no length prefix and no end marker. The accumulator keeps
//! every byte since the last drain together with the arrival time of the most
//! recent one; once the line has been silent for 3.5 character times the
//! buffered bytes are handed out for decoding.

use crate::constants::{BITS_PER_CHAR, DEFAULT_MAX_BUFFER_LEN, IDLE_CHAR_TIMES};
use crate::error::DecodeError;
use crate::types::ByteChunk;
use bytes::{Buf, BytesMut};
use std::time::{Duration, Instant};

#[cfg(feature = "logging")]
use tracing::warn;

/// Silence that ends a frame at `baud_rate`: 3.5 * 11 bits / baud
pub fn idle_threshold(baud_rate: u32) -> Result<Duration, DecodeError> {
    if baud_rate == 0 {
        return Err(DecodeError::InvalidBaudRate(baud_rate));
    }
    Ok(Duration::from_secs_f64(
        IDLE_CHAR_TIMES * (BITS_PER_CHAR / baud_rate as f64),
    ))
}

/// Growing byte buffer plus the time of the last received byte
#[derive(Debug)]
pub struct FrameAccumulator {
    buffer: BytesMut,
    last_byte_time: Option<Instant>,
    baud_rate: u32,
    idle_threshold: Duration,
    max_len: usize,
}

impl FrameAccumulator {
    /// Create an accumulator for a bus running at `baud_rate`
    pub fn new(baud_rate: u32) -> Result<Self, DecodeError> {
        Self::with_capacity_limit(baud_rate, DEFAULT_MAX_BUFFER_LEN)
    }

    /// Create an accumulator that never buffers more than `max_len` bytes
    pub fn with_capacity_limit(baud_rate: u32, max_len: usize) -> Result<Self, DecodeError> {
        Ok(Self {
            buffer: BytesMut::with_capacity(256),
            last_byte_time: None,
            baud_rate,
            idle_threshold: idle_threshold(baud_rate)?,
            max_len,
        })
    }

    /// Extend the buffer with a chunk and restart the idle clock
    ///
    /// Returns how many of the oldest bytes were dropped to stay within the
    /// capacity limit (normally zero).
    pub fn append(&mut self, chunk: &ByteChunk) -> usize {
        self.buffer.extend_from_slice(&chunk.bytes);
        self.last_byte_time = Some(chunk.received_at);

        let overflow = self.buffer.len().saturating_sub(self.max_len);
        if overflow > 0 {
            #[cfg(feature = "logging")]
            warn!(
                "Buffer exceeded {} bytes without idle gap, dropping {} oldest bytes",
                self.max_len, overflow
            );
            self.buffer.advance(overflow);
        }
        overflow
    }

    /// True once the line has been silent for longer than the idle threshold
    ///
    /// With no byte ever received the line counts as idle.
    pub fn idle_elapsed(&self, now: Instant) -> bool {
        match self.last_byte_time {
            Some(last) => now.saturating_duration_since(last) > self.idle_threshold,
            None => true,
        }
    }

    /// Buffered bytes, but only if the bus is idle and there is something to decode
    pub fn drain_if_idle(&self, now: Instant) -> Option<&[u8]> {
        if self.buffer.is_empty() || !self.idle_elapsed(now) {
            return None;
        }
        Some(&self.buffer)
    }

    /// Current buffer contents
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Remove `n` bytes from the front of the buffer
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.buffer.len());
        self.buffer.advance(n);
    }

    /// Drop everything, returning the number of bytes discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        discarded
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Arrival time of the most recent byte
    pub fn last_byte_time(&self) -> Option<Instant> {
        self.last_byte_time
    }

    /// Configured bus speed
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Silence that ends a frame
    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }
}
