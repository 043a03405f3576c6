//! Frame encoding
//!
//! Produces complete RTU frames (address, PDU, CRC) laid out exactly as the
//! decoder expects them. The CRC is appended in the configured
//! [`CrcByteOrder`], high byte first unless told otherwise.

use crate::constants::{
    FunctionCode, CRC_SIZE, EXCEPTION_FLAG, EXCEPTION_FRAME_LEN, MAX_ADU_SIZE, READ_REQUEST_LEN,
    WRITE_RESPONSE_LEN,
};
use crate::crc::{crc16_modbus, CrcByteOrder};
use crate::error::DecodeError;
use bytes::{BufMut, Bytes, BytesMut};

/// Append the CRC of `buf` to `buf`
pub fn append_crc(buf: &mut BytesMut, order: CrcByteOrder) {
    let crc = crc16_modbus(buf);
    buf.put_slice(&order.to_bytes(crc));
}

/// Encode a function 3 request (master side)
pub fn encode_read_request(slave: u8, start_addr: u16, count: u16) -> Result<Bytes, DecodeError> {
    FrameBuilder::read_request(slave, start_addr, count).build()
}

/// Encode a function 3 response
pub fn encode_read_response(slave: u8, registers: &[u16]) -> Result<Bytes, DecodeError> {
    FrameBuilder::read_response(slave, registers).build()
}

/// Encode a function 16 request
pub fn encode_write_request(
    slave: u8,
    start_addr: u16,
    values: &[u16],
) -> Result<Bytes, DecodeError> {
    FrameBuilder::write_request(slave, start_addr, values).build()
}

/// Encode a function 16 response
pub fn encode_write_response(
    slave: u8,
    start_addr: u16,
    reg_count: u16,
) -> Result<Bytes, DecodeError> {
    FrameBuilder::write_response(slave, start_addr, reg_count).build()
}

/// Encode an exception response for `function`
pub fn encode_exception(slave: u8, function: u8, error_code: u8) -> Result<Bytes, DecodeError> {
    FrameBuilder::exception(slave, function, error_code).build()
}

/// Builder for constructing frames with various options
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    body: BytesMut,
    crc_order: CrcByteOrder,
    corrupt_crc: bool,
}

impl FrameBuilder {
    /// Start a frame from a slave address and raw PDU bytes
    pub fn raw(slave: u8, pdu: &[u8]) -> Self {
        let mut body = BytesMut::with_capacity(1 + pdu.len() + CRC_SIZE);
        body.put_u8(slave);
        body.put_slice(pdu);
        Self::from_body(body)
    }

    /// Function 3 request: start address and register count
    pub fn read_request(slave: u8, start_addr: u16, count: u16) -> Self {
        let mut body = BytesMut::with_capacity(READ_REQUEST_LEN);
        body.put_u8(slave);
        body.put_u8(FunctionCode::READ_HOLDING_REGISTERS);
        body.put_u16(start_addr);
        body.put_u16(count);
        Self::from_body(body)
    }

    /// Function 3 response carrying `registers`
    pub fn read_response(slave: u8, registers: &[u16]) -> Self {
        let mut body = BytesMut::with_capacity(3 + registers.len() * 2 + CRC_SIZE);
        body.put_u8(slave);
        body.put_u8(FunctionCode::READ_HOLDING_REGISTERS);
        body.put_u8((registers.len() * 2) as u8);
        for &value in registers {
            body.put_u16(value);
        }
        Self::from_body(body)
    }

    /// Function 16 request writing `values` from `start_addr`
    pub fn write_request(slave: u8, start_addr: u16, values: &[u16]) -> Self {
        let mut body = BytesMut::with_capacity(7 + values.len() * 2 + CRC_SIZE);
        body.put_u8(slave);
        body.put_u8(FunctionCode::WRITE_MULTIPLE_REGISTERS);
        body.put_u16(start_addr);
        body.put_u16(values.len() as u16);
        body.put_u8((values.len() * 2) as u8);
        for &value in values {
            body.put_u16(value);
        }
        Self::from_body(body)
    }

    /// Function 16 response acknowledging `reg_count` registers
    pub fn write_response(slave: u8, start_addr: u16, reg_count: u16) -> Self {
        let mut body = BytesMut::with_capacity(WRITE_RESPONSE_LEN);
        body.put_u8(slave);
        body.put_u8(FunctionCode::WRITE_MULTIPLE_REGISTERS);
        body.put_u16(start_addr);
        body.put_u16(reg_count);
        Self::from_body(body)
    }

    /// Exception response to `function`
    pub fn exception(slave: u8, function: u8, error_code: u8) -> Self {
        let mut body = BytesMut::with_capacity(EXCEPTION_FRAME_LEN);
        body.put_u8(slave);
        body.put_u8(function | EXCEPTION_FLAG);
        body.put_u8(error_code);
        Self::from_body(body)
    }

    fn from_body(body: BytesMut) -> Self {
        Self {
            body,
            crc_order: CrcByteOrder::default(),
            corrupt_crc: false,
        }
    }

    /// Set the CRC byte order
    pub fn crc_order(mut self, order: CrcByteOrder) -> Self {
        self.crc_order = order;
        self
    }

    /// Flip the CRC so the frame decodes with `crc_valid == false`
    pub fn corrupt_crc(mut self) -> Self {
        self.corrupt_crc = true;
        self
    }

    /// Build and encode the frame
    pub fn build(self) -> Result<Bytes, DecodeError> {
        let size = self.body.len() + CRC_SIZE;
        if size > MAX_ADU_SIZE {
            return Err(DecodeError::FrameTooLarge {
                size,
                max: MAX_ADU_SIZE,
            });
        }

        let mut buf = self.body;
        let mut crc = crc16_modbus(&buf);
        if self.corrupt_crc {
            crc = !crc;
        }
        buf.put_slice(&self.crc_order.to_bytes(crc));

        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_matches_known_wire_bytes() {
        let encoded = FrameBuilder::read_request(1, 0, 2)
            .crc_order(CrcByteOrder::LittleEndian)
            .build()
            .unwrap();

        assert_eq!(
            encoded.as_ref(),
            &[0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B]
        );
    }

    #[test]
    fn test_write_request_layout() {
        let encoded = encode_write_request(6, 0x0001, &[0x000A, 0x0102]).unwrap();

        assert_eq!(encoded.len(), 13);
        assert_eq!(&encoded[..7], &[0x06, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04]);
        assert_eq!(&encoded[7..11], &[0x00, 0x0A, 0x01, 0x02]);
    }

    #[test]
    fn test_append_crc_big_endian() {
        let mut buf = BytesMut::from(&[0x01u8, 0x03, 0x00, 0x00, 0x00, 0x02][..]);
        append_crc(&mut buf, CrcByteOrder::BigEndian);
        assert_eq!(&buf[6..], &[0x0B, 0xC4]);
    }

    #[test]
    fn test_exception_sets_flag() {
        let encoded = encode_exception(1, 0x03, 0x02).unwrap();
        assert_eq!(&encoded[..3], &[0x01, 0x83, 0x02]);
        assert_eq!(encoded.len(), 5);
    }

    #[test]
    fn test_fixed_shapes_have_declared_lengths() {
        assert_eq!(encode_read_request(1, 0, 2).unwrap().len(), READ_REQUEST_LEN);
        assert_eq!(encode_write_response(6, 1, 2).unwrap().len(), WRITE_RESPONSE_LEN);
        assert_eq!(encode_exception(1, 3, 2).unwrap().len(), EXCEPTION_FRAME_LEN);
    }

    #[test]
    fn test_corrupt_crc_differs() {
        let good = FrameBuilder::write_response(6, 1, 2).build().unwrap();
        let bad = FrameBuilder::write_response(6, 1, 2)
            .corrupt_crc()
            .build()
            .unwrap();
        assert_eq!(&good[..6], &bad[..6]);
        assert_ne!(&good[6..], &bad[6..]);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let values = [0u16; 124];
        let result = encode_write_request(1, 0, &values);
        assert_eq!(
            result,
            Err(DecodeError::FrameTooLarge { size: 257, max: 256 })
        );

        assert!(encode_write_request(1, 0, &[0u16; 123]).is_ok());
        assert!(encode_read_response(1, &[0u16; 125]).is_ok());
    }
}
