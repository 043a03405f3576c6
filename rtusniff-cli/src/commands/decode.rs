use crate::capture::read_capture;
use crate::report::{format_frame, format_stats, EventRecord, FrameRecord};
use anyhow::{Context, Result};
use colored::*;
use rtusniff_core::{
    pipeline::{decode_bursts, PipelineEvent},
    PipelineConfig, PipelineStats,
};
use std::fs;
use std::io::Write;
use tracing::info;

/// Where and how decoded frames are written
#[derive(Debug, Clone, Default)]
pub struct DecodeOutput<'a> {
    /// JSON (or JSON Lines with `jsonl`) destination
    pub path: Option<&'a str>,
    /// One record per line instead of a pretty array
    pub jsonl: bool,
    /// Print the statistics block and nothing per frame
    pub stats_only: bool,
}

pub fn execute(
    input: &str,
    binary: bool,
    config: PipelineConfig,
    output: &DecodeOutput<'_>,
) -> Result<PipelineStats> {
    info!("Decoding capture: {}", input);

    let bursts = read_capture(input, binary)?;
    info!("Capture holds {} bursts", bursts.len());

    let (events, stats) = decode_bursts(&bursts, config).context("Invalid decoder settings")?;

    println!("\n{}", format_stats(&stats));
    println!();

    if output.stats_only {
        return Ok(stats);
    }

    let records: Vec<EventRecord> = events
        .iter()
        .map(|event| match event {
            PipelineEvent::Frame(located) => EventRecord::Frame(FrameRecord::new(located, None)),
            PipelineEvent::Error(err) => EventRecord::error(err, None),
        })
        .collect();

    if let Some(output_path) = output.path {
        let text = if output.jsonl {
            let mut lines = Vec::new();
            for record in &records {
                serde_json::to_writer(&mut lines, record)
                    .context("Failed to serialize decoded frames")?;
                lines.write_all(b"\n")?;
            }
            String::from_utf8(lines).context("Failed to serialize decoded frames")?
        } else {
            serde_json::to_string_pretty(&records)
                .context("Failed to serialize decoded frames")?
        };

        fs::write(output_path, text)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Decoded frames written to: {}", output_path);
    } else {
        println!("=== Decoded Frames ===");
        for event in &events {
            match event {
                PipelineEvent::Frame(located) => {
                    println!("{}", format_frame(&located.frame, None, true));
                }
                PipelineEvent::Error(err) => {
                    println!("{} {}", "✗".red(), err);
                }
            }
        }
    }

    Ok(stats)
}
