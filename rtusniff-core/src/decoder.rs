//! PDU decoding for read holding registers, write multiple registers and
//! exception responses
//!
//! The decoder looks at a slice believed to start at a slave address and
//! decides, from the function code and the length fields, how many bytes the
//! frame occupies. It never consumes anything itself; the reported frame
//! length tells the caller how far to advance.

use crate::constants::{
    is_exception, FunctionCode, CRC_SIZE, EXCEPTION_FLAG, EXCEPTION_FRAME_LEN, MIN_FRAME_SIZE,
    READ_RESPONSE_HEADER_LEN, WRITE_REQUEST_HEADER_LEN, WRITE_RESPONSE_LEN,
};
use crate::crc::{verify_trailer, CrcByteOrder};
use crate::error::DecodeError;
use crate::types::{Boundary, DecodeOutcome, DecodedFrame};
use alloc::vec::Vec;
use bytes::Bytes;

/// Decode the frame at the start of `candidate`, comparing the CRC high byte first
///
/// See [`decode_frame_with_order`].
pub fn decode_frame(candidate: &[u8], boundary: Boundary) -> DecodeOutcome {
    decode_frame_with_order(candidate, boundary, CrcByteOrder::BigEndian)
}

/// Decode the frame at the start of `candidate`
///
/// Shapes:
/// - exception (function bit 0x80): always 5 bytes
/// - function 3 response: `3 + byte_count + 2` bytes; a longer candidate
///   decodes its leading frame
/// - function 16: exactly 8 bytes is a response, anything else must match the
///   request length `7 + byte_count + 2`
///
/// A candidate shorter than its declared length is [`DecodeOutcome::Incomplete`]
/// while the bus is [`Boundary::Open`] and a
/// [`DecodeError::LengthMismatch`] once it is [`Boundary::Idle`].
/// A CRC mismatch only clears `crc_valid`; the fields are still returned.
pub fn decode_frame_with_order(
    candidate: &[u8],
    boundary: Boundary,
    order: CrcByteOrder,
) -> DecodeOutcome {
    if candidate.len() < MIN_FRAME_SIZE {
        return DecodeOutcome::Incomplete;
    }

    let func_code = candidate[1];

    let frame_len = match frame_length(candidate, func_code, boundary) {
        Ok(Some(len)) => len,
        Ok(None) => return DecodeOutcome::Incomplete,
        Err(err) => return DecodeOutcome::Error(err),
    };

    let frame = &candidate[..frame_len];
    DecodeOutcome::Frame(build_frame(frame, func_code, order))
}

/// Work out how many bytes the frame at the front of `candidate` occupies
///
/// `Ok(None)` means more bytes are needed.
fn frame_length(
    candidate: &[u8],
    func_code: u8,
    boundary: Boundary,
) -> Result<Option<usize>, DecodeError> {
    let actual = candidate.len();

    if is_exception(func_code) {
        return Ok(Some(EXCEPTION_FRAME_LEN));
    }

    match FunctionCode::from_u8(func_code) {
        Some(FunctionCode::ReadHoldingRegisters) => {
            let byte_count = candidate[2] as usize;
            let expected = READ_RESPONSE_HEADER_LEN + byte_count + CRC_SIZE;
            if actual < expected {
                return short_frame(expected, actual, boundary);
            }
            Ok(Some(expected))
        }
        Some(FunctionCode::WriteMultipleRegisters) => {
            if actual == WRITE_RESPONSE_LEN {
                return Ok(Some(WRITE_RESPONSE_LEN));
            }
            if actual < WRITE_REQUEST_HEADER_LEN {
                return short_frame(WRITE_REQUEST_HEADER_LEN, actual, boundary);
            }
            let byte_count = candidate[WRITE_REQUEST_HEADER_LEN - 1] as usize;
            let expected = WRITE_REQUEST_HEADER_LEN + byte_count + CRC_SIZE;
            if actual < expected {
                return short_frame(expected, actual, boundary);
            }
            if actual > expected {
                return Err(DecodeError::LengthMismatch { expected, actual });
            }
            Ok(Some(expected))
        }
        None => Err(DecodeError::UnsupportedFunctionCode { code: func_code }),
    }
}

fn short_frame(
    expected: usize,
    actual: usize,
    boundary: Boundary,
) -> Result<Option<usize>, DecodeError> {
    match boundary {
        Boundary::Open => Ok(None),
        Boundary::Idle => Err(DecodeError::LengthMismatch { expected, actual }),
    }
}

/// Decode the fields of a frame whose length is already settled
fn build_frame(frame: &[u8], func_code: u8, order: CrcByteOrder) -> DecodedFrame {
    let slave_addr = frame[0];
    let crc_valid = verify_trailer(frame, order);
    let raw = Bytes::copy_from_slice(frame);

    if is_exception(func_code) {
        return DecodedFrame::ExceptionResponse {
            slave_addr,
            original_func_code: func_code & !EXCEPTION_FLAG,
            error_code: frame[2],
            raw,
            crc_valid,
        };
    }

    if func_code == FunctionCode::READ_HOLDING_REGISTERS {
        let byte_count = frame[2];
        let registers = read_words(&frame[READ_RESPONSE_HEADER_LEN..], byte_count as usize / 2);
        return DecodedFrame::ReadHoldingRegistersResponse {
            slave_addr,
            byte_count,
            registers,
            raw,
            crc_valid,
        };
    }

    let start_addr = u16::from_be_bytes([frame[2], frame[3]]);
    let reg_count = u16::from_be_bytes([frame[4], frame[5]]);

    if frame.len() == WRITE_RESPONSE_LEN {
        return DecodedFrame::WriteMultipleRegistersResponse {
            slave_addr,
            start_addr,
            reg_count,
            raw,
            crc_valid,
        };
    }

    let byte_count = frame[WRITE_REQUEST_HEADER_LEN - 1];
    let values = read_words(&frame[WRITE_REQUEST_HEADER_LEN..], byte_count as usize / 2);
    DecodedFrame::WriteMultipleRegistersRequest {
        slave_addr,
        start_addr,
        reg_count,
        byte_count,
        values,
        raw,
        crc_valid,
    }
}

/// Read `count` big-endian 16-bit words from the front of `data`
fn read_words(data: &[u8], count: usize) -> Vec<u16> {
    data.chunks_exact(2)
        .take(count)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FrameBuilder;
    use alloc::vec;

    #[test]
    fn test_decode_read_response() {
        let encoded = FrameBuilder::read_response(1, &[100, 101, 102]).build().unwrap();
        let outcome = decode_frame(&encoded, Boundary::Idle);

        match outcome {
            DecodeOutcome::Frame(DecodedFrame::ReadHoldingRegistersResponse {
                slave_addr,
                byte_count,
                registers,
                crc_valid,
                ..
            }) => {
                assert_eq!(slave_addr, 1);
                assert_eq!(byte_count, 6);
                assert_eq!(registers, vec![100, 101, 102]);
                assert!(crc_valid);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_decode_write_response() {
        let encoded = FrameBuilder::write_response(6, 1, 2).build().unwrap();
        let outcome = decode_frame(&encoded, Boundary::Idle);

        assert!(matches!(
            outcome,
            DecodeOutcome::Frame(DecodedFrame::WriteMultipleRegistersResponse {
                slave_addr: 6,
                start_addr: 1,
                reg_count: 2,
                crc_valid: true,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_write_request() {
        let encoded = FrameBuilder::write_request(2, 0x0010, &[0xAAAA, 0x5555]).build().unwrap();
        let outcome = decode_frame(&encoded, Boundary::Idle);

        match outcome {
            DecodeOutcome::Frame(DecodedFrame::WriteMultipleRegistersRequest {
                start_addr,
                reg_count,
                byte_count,
                values,
                crc_valid,
                ..
            }) => {
                assert_eq!(start_addr, 0x0010);
                assert_eq!(reg_count, 2);
                assert_eq!(byte_count, 4);
                assert_eq!(values, vec![0xAAAA, 0x5555]);
                assert!(crc_valid);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_exception_ignores_crc_for_shape() {
        let outcome = decode_frame(&[0x01, 0x81, 0x02, 0x00, 0x00], Boundary::Idle);
        match outcome {
            DecodeOutcome::Frame(frame) => {
                assert_eq!(frame.exception_code().map(|c| c.as_u8()), Some(2));
                assert!(!frame.crc_valid());
                assert_eq!(frame.len(), 5);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_short_read_response_depends_on_boundary() {
        let encoded = FrameBuilder::read_response(1, &[1, 2, 3, 4]).build().unwrap();
        let partial = &encoded[..encoded.len() - 3];

        assert_eq!(decode_frame(partial, Boundary::Open), DecodeOutcome::Incomplete);
        assert_eq!(
            decode_frame(partial, Boundary::Idle),
            DecodeOutcome::Error(DecodeError::LengthMismatch {
                expected: encoded.len(),
                actual: partial.len(),
            })
        );
    }

    #[test]
    fn test_read_response_with_trailing_bytes() {
        let mut stream = FrameBuilder::read_response(3, &[7]).build().unwrap().to_vec();
        stream.extend_from_slice(&[0x09, 0x09, 0x09]);

        let frame = decode_frame(&stream, Boundary::Idle);
        assert_eq!(frame.frame().map(|f| f.len()), Some(7));
    }

    #[test]
    fn test_write_request_too_long() {
        let mut stream = FrameBuilder::write_request(2, 0, &[1]).build().unwrap().to_vec();
        stream.push(0x00);

        assert_eq!(
            decode_frame(&stream, Boundary::Open),
            DecodeOutcome::Error(DecodeError::LengthMismatch {
                expected: 11,
                actual: 12,
            })
        );
    }

    #[test]
    fn test_short_function_16_candidate() {
        let data = [0x02, 0x10, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(decode_frame(&data, Boundary::Open), DecodeOutcome::Incomplete);
        assert_eq!(
            decode_frame(&data, Boundary::Idle),
            DecodeOutcome::Error(DecodeError::LengthMismatch {
                expected: 7,
                actual: 6,
            })
        );
    }

    #[test]
    fn test_unsupported_function() {
        let outcome = decode_frame(&[0x01, 0x05, 0x00, 0x01, 0xFF, 0x00], Boundary::Idle);
        assert_eq!(
            outcome,
            DecodeOutcome::Error(DecodeError::UnsupportedFunctionCode { code: 0x05 })
        );
    }

    #[test]
    fn test_too_short_is_incomplete() {
        assert_eq!(
            decode_frame(&[0x01, 0x03, 0x00, 0x00], Boundary::Idle),
            DecodeOutcome::Incomplete
        );
    }

    #[test]
    fn test_little_endian_crc_order() {
        let encoded = FrameBuilder::write_response(6, 1, 2)
            .crc_order(CrcByteOrder::LittleEndian)
            .build()
            .unwrap();

        let le = decode_frame_with_order(&encoded, Boundary::Idle, CrcByteOrder::LittleEndian);
        let be = decode_frame_with_order(&encoded, Boundary::Idle, CrcByteOrder::BigEndian);

        assert_eq!(le.frame().map(|f| f.crc_valid()), Some(true));
        assert_eq!(be.frame().map(|f| f.crc_valid()), Some(false));
    }
}
