//! Constants and limits for Modbus RTU frames

use serde::{Deserialize, Serialize};

/// Smallest frame the decoder will look at: address + function + 1 byte + CRC (2 bytes)
pub const MIN_FRAME_SIZE: usize = 5;

/// Largest RTU application data unit defined by the protocol
pub const MAX_ADU_SIZE: usize = 256;

/// Size of the trailing CRC-16 in bytes
pub const CRC_SIZE: usize = 2;

/// Lowest unicast slave address
pub const MIN_SLAVE_ADDRESS: u8 = 1;

/// Highest unicast slave address
pub const MAX_SLAVE_ADDRESS: u8 = 247;

/// Bit set in the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Exception responses are always address + function + code + CRC
pub const EXCEPTION_FRAME_LEN: usize = 5;

/// Write multiple registers response: address + function + start (2) + count (2) + CRC
pub const WRITE_RESPONSE_LEN: usize = 8;

/// Read holding registers request: address + function + start (2) + count (2) + CRC
pub const READ_REQUEST_LEN: usize = 8;

/// Header bytes of a write multiple registers request before the values
/// (address + function + start (2) + count (2) + byte count)
pub const WRITE_REQUEST_HEADER_LEN: usize = 7;

/// Header bytes of a read holding registers response before the values
/// (address + function + byte count)
pub const READ_RESPONSE_HEADER_LEN: usize = 3;

/// Bits on the wire per character: 1 start + 8 data + 1 parity + 1 stop
pub const BITS_PER_CHAR: f64 = 11.0;

/// Inter-frame silence in character times
pub const IDLE_CHAR_TIMES: f64 = 3.5;

/// Default serial speed
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default upper bound on buffered, undecoded bytes
pub const DEFAULT_MAX_BUFFER_LEN: usize = 4096;

/// Modbus function codes understood by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionCode {
    /// 0x03 - read holding registers
    ReadHoldingRegisters,
    /// 0x10 - write multiple registers
    WriteMultipleRegisters,
}

impl FunctionCode {
    /// Raw value of read holding registers
    pub const READ_HOLDING_REGISTERS: u8 = 0x03;

    /// Raw value of write multiple registers
    pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

    /// Map a raw function byte to a known function code
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            Self::READ_HOLDING_REGISTERS => Some(Self::ReadHoldingRegisters),
            Self::WRITE_MULTIPLE_REGISTERS => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    /// Raw function byte
    pub const fn as_u8(&self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => Self::READ_HOLDING_REGISTERS,
            Self::WriteMultipleRegisters => Self::WRITE_MULTIPLE_REGISTERS,
        }
    }

    /// Human readable name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadHoldingRegisters => "read holding registers",
            Self::WriteMultipleRegisters => "write multiple registers",
        }
    }
}

/// Check whether a function byte carries the exception flag
pub const fn is_exception(code: u8) -> bool {
    code & EXCEPTION_FLAG != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_code_mapping() {
        assert_eq!(
            FunctionCode::from_u8(3),
            Some(FunctionCode::ReadHoldingRegisters)
        );
        assert_eq!(
            FunctionCode::from_u8(16),
            Some(FunctionCode::WriteMultipleRegisters)
        );
        assert_eq!(FunctionCode::from_u8(10), None);
        assert_eq!(FunctionCode::WriteMultipleRegisters.as_u8(), 0x10);
    }

    #[test]
    fn test_exception_flag() {
        assert!(is_exception(0x83));
        assert!(is_exception(0x90));
        assert!(!is_exception(0x03));
    }
}
