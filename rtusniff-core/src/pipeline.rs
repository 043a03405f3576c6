//! Decode pipeline: feed bytes in, get frames and error reports out
//!
//! The pipeline owns one [`FrameAccumulator`] per transport connection. Bytes
//! are pushed as they arrive; [`DecodePipeline::poll`] runs a drain pass only
//! once the bus has been idle for 3.5 character times:
//! 1. Find the first plausible slave address
//! 2. Decode one frame from there
//! 3. On success drop the consumed bytes and repeat
//! 4. On an incomplete frame or an error stop the pass
//!
//! A pass that decodes nothing from a non-empty buffer discards the buffer and
//! reports [`DecodeError::BufferDesyncCleared`], so one unrecoverable byte
//! sequence can never block decoding forever. Bytes a productive pass could
//! not decode stay buffered until the next pass; an error they already
//! produced is reported and counted once.

use crate::accumulator::FrameAccumulator;
use crate::config::{PipelineConfig, ResyncPolicy};
use crate::decoder::decode_frame_with_order;
use crate::error::DecodeError;
use crate::scanner::find_start;
use crate::types::{Boundary, ByteChunk, DecodeOutcome, DecodedFrame};
use std::time::{Duration, Instant};

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// A frame together with where and when it was seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFrame {
    /// Bytes skipped in the buffer before this frame started
    pub offset: usize,

    /// The decoded frame
    pub frame: DecodedFrame,

    /// Arrival time of the last byte of the burst it came from
    pub received_at: Instant,
}

/// Something a drain pass wants the caller to know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A decoded frame
    Frame(LocatedFrame),
    /// A frame that could not be decoded, or a buffer reset
    Error(DecodeError),
}

impl PipelineEvent {
    /// The located frame, if this event carries one
    pub fn as_frame(&self) -> Option<&LocatedFrame> {
        match self {
            PipelineEvent::Frame(located) => Some(located),
            PipelineEvent::Error(_) => None,
        }
    }

    /// The error, if this event carries one
    pub fn as_error(&self) -> Option<&DecodeError> {
        match self {
            PipelineEvent::Frame(_) => None,
            PipelineEvent::Error(err) => Some(err),
        }
    }
}

/// Running counters for a decoding session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Bytes pushed into the pipeline
    pub bytes_received: usize,

    /// Idle-triggered drain passes run
    pub passes: usize,

    /// Frames decoded
    pub frames_decoded: usize,

    /// Decoded frames whose CRC did not match
    pub crc_failures: usize,

    /// Length mismatches and unsupported function codes
    pub decode_errors: usize,

    /// Passes that ended by clearing the buffer
    pub desync_clears: usize,

    /// Bytes thrown away by clears, resync slides and overflow trimming
    pub bytes_discarded: usize,
}

impl PipelineStats {
    /// Share of decoded frames with a matching CRC, as a percentage
    pub fn crc_pass_rate(&self) -> f64 {
        if self.frames_decoded == 0 {
            0.0
        } else {
            ((self.frames_decoded - self.crc_failures) as f64 / self.frames_decoded as f64) * 100.0
        }
    }
}

/// Orchestrates accumulation, synchronization and decoding for one session
#[derive(Debug)]
pub struct DecodePipeline {
    accumulator: FrameAccumulator,
    config: PipelineConfig,
    stats: PipelineStats,
    // Error that stopped the last pass with its bytes still buffered
    stale_error: Option<DecodeError>,
}

impl DecodePipeline {
    /// Create a pipeline from a validated config
    pub fn new(config: PipelineConfig) -> Result<Self, DecodeError> {
        config.validate()?;
        let accumulator =
            FrameAccumulator::with_capacity_limit(config.baud_rate, config.max_buffer_len)?;
        Ok(Self {
            accumulator,
            config,
            stats: PipelineStats::default(),
            stale_error: None,
        })
    }

    /// Feed one chunk from the transport
    pub fn push(&mut self, chunk: ByteChunk) {
        self.stats.bytes_received += chunk.bytes.len();
        self.stale_error = None;
        let dropped = self.accumulator.append(&chunk);
        self.stats.bytes_discarded += dropped;
    }

    /// Run a drain pass if the bus has gone idle
    ///
    /// Returns no events while bytes may still be arriving.
    pub fn poll(&mut self, now: Instant) -> Vec<PipelineEvent> {
        if self.accumulator.drain_if_idle(now).is_none() {
            return Vec::new();
        }
        self.drain_pass()
    }

    /// Run a drain pass regardless of timing, e.g. at end of a capture
    pub fn flush(&mut self) -> Vec<PipelineEvent> {
        if self.accumulator.is_empty() {
            return Vec::new();
        }
        self.drain_pass()
    }

    /// Decode the buffered bytes without consuming them, as if more may follow
    ///
    /// [`DecodeOutcome::Incomplete`] means the buffer does not yet hold a
    /// complete frame.
    pub fn pending(&self) -> DecodeOutcome {
        let buffer = self.accumulator.buffer();
        match find_start(buffer) {
            Some(offset) => {
                decode_frame_with_order(&buffer[offset..], Boundary::Open, self.config.crc_order)
            }
            None => DecodeOutcome::Incomplete,
        }
    }

    fn drain_pass(&mut self) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        let mut decoded = 0usize;
        let mut unresolved = None;
        let received_at = self.accumulator.last_byte_time().unwrap_or_else(Instant::now);

        self.stats.passes += 1;

        loop {
            let (offset, outcome) = {
                let buffer = self.accumulator.buffer();
                let Some(offset) = find_start(buffer) else {
                    break;
                };
                let outcome = decode_frame_with_order(
                    &buffer[offset..],
                    Boundary::Idle,
                    self.config.crc_order,
                );
                (offset, outcome)
            };

            match outcome {
                DecodeOutcome::Frame(frame) => {
                    #[cfg(feature = "logging")]
                    debug!(
                        "Decoded {} from slave {} at offset {} ({} bytes, crc valid: {})",
                        frame.kind(),
                        frame.slave_addr(),
                        offset,
                        frame.len(),
                        frame.crc_valid()
                    );

                    if !frame.crc_valid() {
                        self.stats.crc_failures += 1;
                    }
                    self.stats.frames_decoded += 1;
                    self.stats.bytes_discarded += offset;
                    self.accumulator.consume(offset + frame.len());
                    decoded += 1;

                    events.push(PipelineEvent::Frame(LocatedFrame {
                        offset,
                        frame,
                        received_at,
                    }));
                }
                DecodeOutcome::Incomplete => break,
                DecodeOutcome::Error(err) => {
                    // Same bytes as the previous pass, already reported
                    if self.stale_error.as_ref() == Some(&err) {
                        #[cfg(feature = "logging")]
                        trace!("Tail at offset {} still fails: {}", offset, err);
                    } else {
                        #[cfg(feature = "logging")]
                        warn!("Failed to decode frame at offset {}: {}", offset, err);

                        self.stats.decode_errors += 1;
                        events.push(PipelineEvent::Error(err.clone()));
                    }

                    match self.config.resync {
                        ResyncPolicy::ClearBuffer => {
                            unresolved = Some(err);
                            break;
                        }
                        ResyncPolicy::SlideOneByte => {
                            self.stats.bytes_discarded += offset + 1;
                            self.accumulator.consume(offset + 1);
                        }
                    }
                }
            }
        }

        if decoded == 0 && !self.accumulator.is_empty() {
            let discarded = self.accumulator.clear();

            #[cfg(feature = "logging")]
            warn!("No frame decoded in idle pass, discarding {} bytes", discarded);

            self.stats.desync_clears += 1;
            self.stats.bytes_discarded += discarded;
            events.push(PipelineEvent::Error(DecodeError::BufferDesyncCleared {
                discarded,
            }));
            unresolved = None;
        }
        self.stale_error = unresolved;

        #[cfg(feature = "logging")]
        trace!(
            "Drain pass complete: {} frames, {} events, {} bytes left",
            decoded,
            events.len(),
            self.accumulator.len()
        );

        events
    }

    /// The underlying accumulator
    pub fn accumulator(&self) -> &FrameAccumulator {
        &self.accumulator
    }

    /// Session counters
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Session config
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Silence that ends a frame for this session
    pub fn idle_threshold(&self) -> Duration {
        self.accumulator.idle_threshold()
    }
}

/// Decode a sequence of idle-delimited bursts
///
/// Each burst is pushed as one chunk and followed by a silence longer than the
/// idle threshold on a synthetic monotonic timeline, so the result does not
/// depend on how fast this function runs. During each silence the pipeline is
/// polled until its buffer is empty, the way a live loop keeps polling a quiet
/// bus, so leftovers of one burst are never merged into the next.
pub fn decode_bursts<I, B>(
    bursts: I,
    config: PipelineConfig,
) -> Result<(Vec<PipelineEvent>, PipelineStats), DecodeError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut pipeline = DecodePipeline::new(config)?;
    let gap = pipeline.idle_threshold() * 2;
    let mut now = Instant::now();
    let mut events = Vec::new();

    for burst in bursts {
        let burst = burst.as_ref();
        if burst.is_empty() {
            continue;
        }
        pipeline.push(ByteChunk::new(burst.to_vec(), now));
        now += gap;
        while !pipeline.accumulator().is_empty() {
            let drained = pipeline.poll(now);
            if drained.is_empty() {
                break;
            }
            events.extend(drained);
        }
        now += gap;
    }

    events.extend(pipeline.flush());

    let stats = pipeline.stats().clone();
    Ok((events, stats))
}
