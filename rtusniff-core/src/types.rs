//! Core types for decoded Modbus RTU traffic

use crate::constants::{is_exception, FunctionCode, EXCEPTION_FLAG};
use crate::error::DecodeError;
use alloc::vec::Vec;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[cfg(feature = "std")]
use std::time::Instant;

/// Bytes handed over by the transport in one read, with their arrival time
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteChunk {
    /// Raw bytes as read from the port
    pub bytes: Bytes,

    /// Monotonic arrival time of the last byte in the chunk
    pub received_at: Instant,
}

#[cfg(feature = "std")]
impl ByteChunk {
    /// Create a chunk stamped with `received_at`
    pub fn new(bytes: impl Into<Bytes>, received_at: Instant) -> Self {
        Self {
            bytes: bytes.into(),
            received_at,
        }
    }

    /// Create a chunk stamped with the current instant
    pub fn now(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, Instant::now())
    }
}

/// Protocol-level error code carried by an exception response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionCode {
    /// 0x01
    IllegalFunction,
    /// 0x02
    IllegalDataAddress,
    /// 0x03
    IllegalDataValue,
    /// 0x04
    ServerDeviceFailure,
    /// 0x05
    Acknowledge,
    /// 0x06
    ServerDeviceBusy,
    /// Anything else
    Unknown(u8),
}

impl ExceptionCode {
    /// Classify a raw exception byte
    pub const fn from_u8(code: u8) -> Self {
        match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerDeviceBusy,
            other => Self::Unknown(other),
        }
    }

    /// Raw exception byte
    pub const fn as_u8(&self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerDeviceBusy => 0x06,
            Self::Unknown(code) => *code,
        }
    }

    /// Short description for reports
    pub const fn description(&self) -> &'static str {
        match self {
            Self::IllegalFunction => "unsupported function",
            Self::IllegalDataAddress => "unsupported data address",
            Self::IllegalDataValue => "unsupported data value",
            Self::ServerDeviceFailure => "device failure",
            Self::Acknowledge => "acknowledged, processing takes longer",
            Self::ServerDeviceBusy => "device busy",
            Self::Unknown(_) => "unknown error code",
        }
    }
}

/// A frame reconstructed from the bus
///
/// Every variant keeps the exact bytes it was decoded from and whether the
/// trailing CRC matched. A CRC mismatch never suppresses the decoded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// Function code with the exception bit set
    ExceptionResponse {
        /// Responding slave
        slave_addr: u8,
        /// Function code without the exception bit
        original_func_code: u8,
        /// Raw exception byte
        error_code: u8,
        /// Frame bytes including CRC
        raw: Bytes,
        /// Trailing CRC matched
        crc_valid: bool,
    },

    /// Function 3 response
    ReadHoldingRegistersResponse {
        /// Responding slave
        slave_addr: u8,
        /// Declared payload size
        byte_count: u8,
        /// Big-endian register values in order
        registers: Vec<u16>,
        /// Frame bytes including CRC
        raw: Bytes,
        /// Trailing CRC matched
        crc_valid: bool,
    },

    /// Function 16 request from the master
    WriteMultipleRegistersRequest {
        /// Addressed slave
        slave_addr: u8,
        /// First register written
        start_addr: u16,
        /// Declared register count
        reg_count: u16,
        /// Declared payload size
        byte_count: u8,
        /// Values to write, in order
        values: Vec<u16>,
        /// Frame bytes including CRC
        raw: Bytes,
        /// Trailing CRC matched
        crc_valid: bool,
    },

    /// Function 16 acknowledgement from the slave
    WriteMultipleRegistersResponse {
        /// Responding slave
        slave_addr: u8,
        /// First register written
        start_addr: u16,
        /// Registers written
        reg_count: u16,
        /// Frame bytes including CRC
        raw: Bytes,
        /// Trailing CRC matched
        crc_valid: bool,
    },
}

impl DecodedFrame {
    /// Slave address of the frame
    pub fn slave_addr(&self) -> u8 {
        match self {
            DecodedFrame::ExceptionResponse { slave_addr, .. }
            | DecodedFrame::ReadHoldingRegistersResponse { slave_addr, .. }
            | DecodedFrame::WriteMultipleRegistersRequest { slave_addr, .. }
            | DecodedFrame::WriteMultipleRegistersResponse { slave_addr, .. } => *slave_addr,
        }
    }

    /// Function byte as it appeared on the wire
    pub fn function_code(&self) -> u8 {
        match self {
            DecodedFrame::ExceptionResponse {
                original_func_code, ..
            } => original_func_code | EXCEPTION_FLAG,
            DecodedFrame::ReadHoldingRegistersResponse { .. } => {
                FunctionCode::READ_HOLDING_REGISTERS
            }
            DecodedFrame::WriteMultipleRegistersRequest { .. }
            | DecodedFrame::WriteMultipleRegistersResponse { .. } => {
                FunctionCode::WRITE_MULTIPLE_REGISTERS
            }
        }
    }

    /// Frame bytes including the CRC
    pub fn raw(&self) -> &Bytes {
        match self {
            DecodedFrame::ExceptionResponse { raw, .. }
            | DecodedFrame::ReadHoldingRegistersResponse { raw, .. }
            | DecodedFrame::WriteMultipleRegistersRequest { raw, .. }
            | DecodedFrame::WriteMultipleRegistersResponse { raw, .. } => raw,
        }
    }

    /// Whether the trailing CRC matched
    pub fn crc_valid(&self) -> bool {
        match self {
            DecodedFrame::ExceptionResponse { crc_valid, .. }
            | DecodedFrame::ReadHoldingRegistersResponse { crc_valid, .. }
            | DecodedFrame::WriteMultipleRegistersRequest { crc_valid, .. }
            | DecodedFrame::WriteMultipleRegistersResponse { crc_valid, .. } => *crc_valid,
        }
    }

    /// Number of stream bytes this frame consumed
    pub fn len(&self) -> usize {
        self.raw().len()
    }

    /// Always false for a decoded frame
    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    /// Exception code, for exception responses
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        match self {
            DecodedFrame::ExceptionResponse { error_code, .. } => {
                Some(ExceptionCode::from_u8(*error_code))
            }
            _ => None,
        }
    }

    /// Short label naming the variant
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedFrame::ExceptionResponse { .. } => "exception_response",
            DecodedFrame::ReadHoldingRegistersResponse { .. } => "read_holding_registers_response",
            DecodedFrame::WriteMultipleRegistersRequest { .. } => "write_multiple_registers_request",
            DecodedFrame::WriteMultipleRegistersResponse { .. } => {
                "write_multiple_registers_response"
            }
        }
    }

    /// True for exception responses
    pub fn is_exception(&self) -> bool {
        is_exception(self.function_code())
    }
}

/// Whether more bytes may still arrive for the candidate being decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The bus is still active; a short frame may complete later
    Open,
    /// The bus went idle; nothing else belongs to this frame
    Idle,
}

/// Result of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A complete, well-shaped frame
    Frame(DecodedFrame),
    /// Need more bytes; nothing consumed
    Incomplete,
    /// The candidate cannot be decoded
    Error(DecodeError),
}

impl DecodeOutcome {
    /// The decoded frame, if any
    pub fn frame(&self) -> Option<&DecodedFrame> {
        match self {
            DecodeOutcome::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// True when more bytes are needed
    pub fn is_incomplete(&self) -> bool {
        matches!(self, DecodeOutcome::Incomplete)
    }
}
