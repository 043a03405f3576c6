//! CRC-16/MODBUS checksum

use serde::{Deserialize, Serialize};

/// Reflected polynomial of CRC-16/MODBUS
pub const CRC16_MODBUS_POLY: u16 = 0xA001;

/// Initial register value
pub const CRC16_MODBUS_INIT: u16 = 0xFFFF;

/// Compute the CRC-16/MODBUS checksum of `data`
///
/// Init 0xFFFF, reflected polynomial 0xA001, no final XOR. The empty input
/// yields 0xFFFF.
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc = CRC16_MODBUS_INIT;

    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC16_MODBUS_POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Byte order of the two trailing CRC bytes
///
/// The decoder compares against `(frame[n-2] << 8) | frame[n-1]` by default.
/// Standard RTU transmits the low byte first, which is `LittleEndian` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrcByteOrder {
    /// High byte first
    #[default]
    BigEndian,
    /// Low byte first (RTU wire order)
    LittleEndian,
}

impl CrcByteOrder {
    /// Serialize a CRC value into its two trailing bytes
    pub const fn to_bytes(&self, crc: u16) -> [u8; 2] {
        match self {
            CrcByteOrder::BigEndian => crc.to_be_bytes(),
            CrcByteOrder::LittleEndian => crc.to_le_bytes(),
        }
    }

    /// Read a CRC value from two trailing bytes
    pub const fn from_bytes(&self, bytes: [u8; 2]) -> u16 {
        match self {
            CrcByteOrder::BigEndian => u16::from_be_bytes(bytes),
            CrcByteOrder::LittleEndian => u16::from_le_bytes(bytes),
        }
    }
}

/// Check the trailing CRC of a complete frame
///
/// Returns `false` for frames shorter than the CRC itself.
pub fn verify_trailer(frame: &[u8], order: CrcByteOrder) -> bool {
    if frame.len() < crate::constants::CRC_SIZE {
        return false;
    }
    let split = frame.len() - crate::constants::CRC_SIZE;
    let received = order.from_bytes([frame[split], frame[split + 1]]);
    crc16_modbus(&frame[..split]) == received
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(crc16_modbus(&[]), 0xFFFF);
    }

    #[test]
    fn test_check_value() {
        // Catalogued check value for CRC-16/MODBUS
        assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_read_request_vector() {
        // 01 03 00 00 00 02 is sent on the wire as ... C4 0B
        let crc = crc16_modbus(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x02]);
        assert_eq!(crc, 0x0BC4);
        assert_eq!(CrcByteOrder::LittleEndian.to_bytes(crc), [0xC4, 0x0B]);
        assert_eq!(CrcByteOrder::BigEndian.to_bytes(crc), [0x0B, 0xC4]);
    }

    #[test]
    fn test_verify_trailer_orders() {
        let wire = [0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B];
        assert!(verify_trailer(&wire, CrcByteOrder::LittleEndian));
        assert!(!verify_trailer(&wire, CrcByteOrder::BigEndian));
        assert!(!verify_trailer(&[0x01], CrcByteOrder::BigEndian));
    }
}
