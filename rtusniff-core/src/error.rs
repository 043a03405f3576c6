//! Error types for Modbus RTU decoding

use alloc::string::String;

/// Errors reported while reconstructing frames from the byte stream
///
/// Decode-time variants are returned as data through
/// [`DecodeOutcome::Error`](crate::types::DecodeOutcome) and
/// [`PipelineEvent::Error`](crate::pipeline::PipelineEvent); only the
/// configuration variants surface through `Result`.
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Declared frame length contradicts the bytes available after the bus went idle
    #[cfg_attr(
        feature = "std",
        error("Length mismatch: expected {expected} bytes, got {actual}")
    )]
    LengthMismatch {
        /// Length implied by the frame's own fields
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// No frame shape is known for this function code
    #[cfg_attr(feature = "std", error("Unsupported function code: {code:#04x}"))]
    UnsupportedFunctionCode {
        /// The raw function byte
        code: u8,
    },

    /// An idle pass decoded nothing and the buffer was dropped
    #[cfg_attr(
        feature = "std",
        error("Buffer desynchronized: discarded {discarded} bytes")
    )]
    BufferDesyncCleared {
        /// Number of bytes thrown away
        discarded: usize,
    },

    /// Encoded frame would exceed the RTU size limit
    #[cfg_attr(feature = "std", error("Frame size {size} exceeds maximum {max}"))]
    FrameTooLarge {
        /// Size the frame would have
        size: usize,
        /// Protocol limit
        max: usize,
    },

    /// Baud rate cannot produce an idle threshold
    #[cfg_attr(feature = "std", error("Invalid baud rate: {0}"))]
    InvalidBaudRate(u32),

    /// Other configuration problem
    #[cfg_attr(feature = "std", error("Invalid configuration: {0}"))]
    InvalidConfig(String),
}
