//! Cooperative read → push → poll loop over any byte source
//!
//! The serial port is just a `Read` here, so the loop runs the same against a
//! port, a pipe or an in-memory buffer in tests.

use anyhow::{Context, Result};
use rtusniff_core::{pipeline::PipelineEvent, ByteChunk, DecodePipeline};
use std::io::{ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const READ_BUFFER_LEN: usize = 1024;

/// What the loop hands to its caller
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// Bytes exactly as read from the source
    Chunk(&'a ByteChunk),
    /// Output of a drain pass
    Decoded(PipelineEvent),
}

/// Run until `should_stop` returns true or the source reports end of input
///
/// Reads that time out count as "no data yet". Before new bytes are pushed the
/// pipeline is polled at their arrival time, so a frame that went idle while
/// the read was blocked is drained on its own instead of being merged with the
/// next one. Anything still buffered is flushed on exit.
pub fn run<R, S, F>(
    source: &mut R,
    pipeline: &mut DecodePipeline,
    poll_interval: Duration,
    mut should_stop: S,
    mut on_event: F,
) -> Result<()>
where
    R: Read + ?Sized,
    S: FnMut() -> bool,
    F: FnMut(SessionEvent<'_>) -> Result<()>,
{
    let mut buf = [0u8; READ_BUFFER_LEN];

    while !should_stop() {
        match source.read(&mut buf) {
            Ok(0) => {
                info!("End of input");
                break;
            }
            Ok(n) => {
                let now = Instant::now();
                for event in pipeline.poll(now) {
                    on_event(SessionEvent::Decoded(event))?;
                }

                let chunk = ByteChunk::new(buf[..n].to_vec(), now);
                debug!("Read {} bytes", n);
                on_event(SessionEvent::Chunk(&chunk))?;
                pipeline.push(chunk);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e).context("Failed to read from byte source"),
        }

        for event in pipeline.poll(Instant::now()) {
            on_event(SessionEvent::Decoded(event))?;
        }

        if !poll_interval.is_zero() {
            thread::sleep(poll_interval);
        }
    }

    for event in pipeline.flush() {
        on_event(SessionEvent::Decoded(event))?;
    }

    Ok(())
}
