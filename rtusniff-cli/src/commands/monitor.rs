use crate::report::{
    format_frame, format_raw_chunk, format_stats, EventRecord, FrameRecord, SessionClock,
};
use crate::session::{self, SessionEvent};
use crate::settings::MonitorSettings;
use anyhow::{Context, Result};
use colored::*;
use rtusniff_core::{pipeline::PipelineEvent, DecodePipeline};
use serialport::{DataBits, Parity, StopBits};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub fn execute(settings: &MonitorSettings, raw: bool, output: Option<&str>) -> Result<()> {
    settings.validate()?;

    let mut pipeline = DecodePipeline::new(settings.pipeline.clone())
        .context("Invalid decoder settings")?;

    let mut jsonl = match output {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open output file: {}", path))?,
        ),
        None => None,
    };

    // Dropped on every return path below, which closes the port
    let mut port = serialport::new(&settings.port, settings.pipeline.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .timeout(settings.read_timeout())
        .open()
        .with_context(|| format!("Failed to open serial port: {}", settings.port))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    info!(
        "Connected to {} at {} baud, idle threshold {:?}",
        settings.port,
        settings.pipeline.baud_rate,
        pipeline.idle_threshold()
    );
    println!("Listening for Modbus RTU frames (press Ctrl+C to stop)");
    println!("{:-<70}", "");

    let clock = SessionClock::start();

    session::run(
        &mut *port,
        &mut pipeline,
        settings.poll_interval(),
        || !running.load(Ordering::SeqCst),
        |event| handle_event(event, &clock, raw, jsonl.as_mut()),
    )?;
    drop(port);

    println!("\n{}", format_stats(pipeline.stats()));
    info!("Monitor stopped, port {} closed", settings.port);

    Ok(())
}

fn handle_event(
    event: SessionEvent<'_>,
    clock: &SessionClock,
    raw: bool,
    jsonl: Option<&mut File>,
) -> Result<()> {
    match event {
        SessionEvent::Chunk(chunk) => {
            if raw {
                println!(
                    "{}",
                    format_raw_chunk(&chunk.bytes, &clock.wall_time(chunk.received_at))
                );
            }
            Ok(())
        }
        SessionEvent::Decoded(PipelineEvent::Frame(located)) => {
            let at = clock.wall_time(located.received_at);
            println!("{}", format_frame(&located.frame, Some(&at), true));

            if let Some(file) = jsonl {
                write_record(file, &EventRecord::Frame(FrameRecord::new(&located, Some(at))))?;
            }
            Ok(())
        }
        SessionEvent::Decoded(PipelineEvent::Error(err)) => {
            warn!("{}", err);
            println!("{} {}", "✗".red(), err);

            if let Some(file) = jsonl {
                write_record(file, &EventRecord::error(&err, Some(chrono::Local::now())))?;
            }
            Ok(())
        }
    }
}

fn write_record(file: &mut File, record: &EventRecord) -> Result<()> {
    let mut line = serde_json::to_vec(record).context("Failed to serialize record")?;
    line.push(b'\n');
    file.write_all(&line).context("Failed to write output file")
}
