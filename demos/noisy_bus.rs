//! Example showing resynchronization on a noisy bus

use rtusniff_core::{
    encoder::FrameBuilder,
    pipeline::decode_bursts,
    PipelineConfig, ResyncPolicy,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("rtusniff Noisy Bus Example\n");

    // Step 1: Build a clean session of ten sensor polls
    println!("Step 1: Building 10 responses...");
    let mut bursts = Vec::new();
    for slave in 1..=10u8 {
        let registers = [u16::from(slave) * 100, u16::from(slave) * 100 + 1];
        bursts.push(FrameBuilder::read_response(slave, &registers).build()?.to_vec());
    }

    // Step 2: Damage it the way a long RS-485 run does
    println!("Step 2: Simulating line noise...");
    bursts[2].insert(0, 0xFF);
    println!("  Burst 3: stray byte before the address");
    bursts[4] = FrameBuilder::read_response(5, &[500, 501])
        .corrupt_crc()
        .build()?
        .to_vec();
    println!("  Burst 5: CRC corrupted");
    bursts[6].truncate(5);
    println!("  Burst 7: truncated mid-frame");
    bursts.insert(8, vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    println!("  Extra burst of zeros\n");

    // Step 3: Decode with both resync policies
    for (name, resync) in [
        ("clear buffer", ResyncPolicy::ClearBuffer),
        ("slide one byte", ResyncPolicy::SlideOneByte),
    ] {
        let config = PipelineConfig {
            resync,
            ..PipelineConfig::default()
        };
        let (events, stats) = decode_bursts(&bursts, config)?;

        println!("Policy: {}", name);
        for event in events.iter().filter_map(|e| e.as_error()) {
            println!("  Error: {}", event);
        }
        println!("  Frames decoded:  {}", stats.frames_decoded);
        println!("  CRC failures:    {}", stats.crc_failures);
        println!("  Buffer clears:   {}", stats.desync_clears);
        println!("  Bytes discarded: {}", stats.bytes_discarded);
        println!("  CRC pass rate:   {:.1}%\n", stats.crc_pass_rate());
    }

    Ok(())
}
