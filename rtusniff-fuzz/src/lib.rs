//! Fuzzing entry points for rtusniff-core
//!
//! Each function takes arbitrary input and must never panic, so any
//! libFuzzer or AFL harness can call them directly.

use rtusniff_core::{Boundary, PipelineConfig, ResyncPolicy};

pub fn fuzz_decode(data: &[u8]) {
    use rtusniff_core::decoder::decode_frame;

    // Should never panic under either boundary
    let _ = decode_frame(data, Boundary::Open);
    let _ = decode_frame(data, Boundary::Idle);
}

pub fn fuzz_pipeline(data: &[u8]) {
    use rtusniff_core::pipeline::decode_bursts;

    // First byte picks the resync policy, the rest is split into bursts at 0xFE
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let config = PipelineConfig {
        resync: if selector & 1 == 0 {
            ResyncPolicy::ClearBuffer
        } else {
            ResyncPolicy::SlideOneByte
        },
        ..PipelineConfig::default()
    };

    let _ = decode_bursts(rest.split(|&b| b == 0xFE), config);
}
