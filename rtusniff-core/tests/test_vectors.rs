//! Fixed byte-level scenarios for the decoder and the pipeline

use rtusniff_core::{
    crc16_modbus,
    decoder::decode_frame,
    pipeline::{DecodePipeline, PipelineEvent},
    Boundary, ByteChunk, DecodeError, DecodeOutcome, DecodedFrame, PipelineConfig,
};
use std::time::Instant;

/// 01 03 18 followed by twelve registers 0x0064..=0x006F
fn twelve_register_body() -> Vec<u8> {
    let mut body = vec![0x01, 0x03, 0x18];
    for value in 0x0064u16..0x0070 {
        body.extend_from_slice(&value.to_be_bytes());
    }
    body
}

fn drain_once(bytes: &[u8]) -> (Vec<PipelineEvent>, DecodePipeline) {
    let mut pipeline = DecodePipeline::new(PipelineConfig::default()).unwrap();
    let t0 = Instant::now();
    pipeline.push(ByteChunk::new(bytes.to_vec(), t0));
    let events = pipeline.poll(t0 + pipeline.idle_threshold() * 3);
    (events, pipeline)
}

#[test]
fn vector_crc_known_values() {
    assert_eq!(crc16_modbus(&[]), 0xFFFF);
    assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
    assert_eq!(crc16_modbus(&hex::decode("010300000002").unwrap()), 0x0BC4);

    let reference = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);
    assert_eq!(reference.checksum(b"123456789"), crc16_modbus(b"123456789"));
}

#[test]
fn vector_twelve_register_response_valid_crc() {
    let mut frame = twelve_register_body();
    assert_eq!(frame.len(), 27);
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());

    match decode_frame(&frame, Boundary::Idle) {
        DecodeOutcome::Frame(DecodedFrame::ReadHoldingRegistersResponse {
            slave_addr,
            byte_count,
            registers,
            crc_valid,
            raw,
        }) => {
            assert_eq!(slave_addr, 1);
            assert_eq!(byte_count, 0x18);
            assert_eq!(registers, (0x0064u16..0x0070).collect::<Vec<_>>());
            assert!(crc_valid);
            assert_eq!(raw.len(), 29);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn vector_twelve_register_response_wire_order_crc() {
    // Low byte first, as a real RTU device would send it
    let mut frame = twelve_register_body();
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());

    let outcome = decode_frame(&frame, Boundary::Idle);
    let decoded = outcome.frame().unwrap();
    assert_eq!(decoded.crc_valid(), crc.to_le_bytes() == crc.to_be_bytes());
    assert!(matches!(
        decoded,
        DecodedFrame::ReadHoldingRegistersResponse { registers, .. } if registers.len() == 12
    ));
}

#[test]
fn vector_write_response_six_one_two() {
    let mut frame = vec![0x06, 0x10, 0x00, 0x01, 0x00, 0x02];
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());

    assert_eq!(
        decode_frame(&frame, Boundary::Idle)
            .frame()
            .map(|f| (f.kind(), f.slave_addr(), f.crc_valid())),
        Some(("write_multiple_registers_response", 6, true))
    );
    assert!(matches!(
        decode_frame(&frame, Boundary::Idle),
        DecodeOutcome::Frame(DecodedFrame::WriteMultipleRegistersResponse {
            slave_addr: 6,
            start_addr: 1,
            reg_count: 2,
            ..
        })
    ));
}

#[test]
fn vector_exception_regardless_of_crc() {
    for trailer in [[0x00, 0x00], [0xC1, 0x91], [0xFF, 0xFF]] {
        let frame = [0x01, 0x81, 0x02, trailer[0], trailer[1]];
        match decode_frame(&frame, Boundary::Idle) {
            DecodeOutcome::Frame(DecodedFrame::ExceptionResponse {
                slave_addr,
                original_func_code,
                error_code,
                ..
            }) => {
                assert_eq!(slave_addr, 1);
                assert_eq!(original_func_code, 0x01);
                assert_eq!(error_code, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

#[test]
fn vector_leading_invalid_address_skipped() {
    let mut frame = twelve_register_body();
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());

    let (clean, _) = drain_once(&frame);

    for prefix in [0x00u8, 248] {
        let mut prefixed = vec![prefix];
        prefixed.extend_from_slice(&frame);
        let (events, _) = drain_once(&prefixed);

        assert_eq!(events.len(), 1);
        let (a, b) = (events[0].as_frame().unwrap(), clean[0].as_frame().unwrap());
        assert_eq!(a.frame, b.frame);
        assert_eq!(a.offset, 1);
    }
}

#[test]
fn vector_split_feed_matches_whole_feed() {
    let mut frame = twelve_register_body();
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());

    let (whole, _) = drain_once(&frame);

    let mut pipeline = DecodePipeline::new(PipelineConfig::default()).unwrap();
    let idle = pipeline.idle_threshold();
    let t0 = Instant::now();

    pipeline.push(ByteChunk::new(frame[..13].to_vec(), t0));
    assert_eq!(pipeline.pending(), DecodeOutcome::Incomplete);
    assert!(pipeline.poll(t0 + idle / 4).is_empty());

    let t1 = t0 + idle / 2;
    pipeline.push(ByteChunk::new(frame[13..].to_vec(), t1));
    assert!(pipeline.pending().frame().is_some());
    let split = pipeline.poll(t1 + idle * 2);

    assert_eq!(split.len(), 1);
    assert_eq!(
        split[0].as_frame().unwrap().frame,
        whole[0].as_frame().unwrap().frame
    );
}

#[test]
fn vector_garbage_pass_single_clear() {
    let garbage = [0xF9, 0x00, 0xFF, 0x01, 0x2A, 0x00, 0x00, 0x00];
    let (events, pipeline) = drain_once(&garbage);

    let clears = events
        .iter()
        .filter(|e| matches!(e.as_error(), Some(DecodeError::BufferDesyncCleared { .. })))
        .count();
    assert_eq!(clears, 1);
    assert!(pipeline.accumulator().is_empty());
    assert_eq!(
        events.last(),
        Some(&PipelineEvent::Error(DecodeError::BufferDesyncCleared {
            discarded: garbage.len()
        }))
    );
}

#[test]
fn vector_truncated_response_after_idle() {
    let mut frame = twelve_register_body();
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    let truncated = &frame[..20];

    let (events, pipeline) = drain_once(truncated);
    assert_eq!(
        events,
        vec![
            PipelineEvent::Error(DecodeError::LengthMismatch {
                expected: 29,
                actual: 20
            }),
            PipelineEvent::Error(DecodeError::BufferDesyncCleared { discarded: 20 }),
        ]
    );
    assert!(pipeline.accumulator().is_empty());
}
