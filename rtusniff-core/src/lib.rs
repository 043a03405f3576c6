//! # rtusniff Core
//!
//! Passive reconstruction of Modbus RTU frames from a raw serial byte stream.
//!
//! ## Modules
//!
//! - `constants`: Frame-size limits, function codes and timing constants
//! - `error`: Decode error taxonomy
//! - `crc`: CRC-16/MODBUS
//! - `types`: Decoded frames and decode outcomes
//! - `scanner`: Frame start synchronization
//! - `decoder`: PDU decoding for functions 3, 16 and exception responses
//! - `encoder`: Frame encoding for fixtures and captures
//! - `config`: Session configuration
//! - `accumulator`: Byte buffering and idle-time delimiting (std)
//! - `pipeline`: Drain loop tying everything together (std)

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod config;
pub mod constants;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod scanner;
pub mod types;

#[cfg(feature = "std")]
pub mod accumulator;
#[cfg(feature = "std")]
pub mod pipeline;

// Re-export commonly used types
pub use config::{PipelineConfig, ResyncPolicy};
pub use crc::{crc16_modbus, CrcByteOrder};
pub use error::DecodeError;
pub use types::{Boundary, DecodeOutcome, DecodedFrame, ExceptionCode};

#[cfg(feature = "std")]
pub use accumulator::FrameAccumulator;
#[cfg(feature = "std")]
pub use pipeline::{DecodePipeline, LocatedFrame, PipelineEvent, PipelineStats};
#[cfg(feature = "std")]
pub use types::ByteChunk;

/// Result type alias for rtusniff operations
pub type Result<T> = core::result::Result<T, DecodeError>;
