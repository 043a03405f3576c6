//! Human-readable and JSON renderings of decoded frames

use chrono::{DateTime, Local};
use colored::*;
use rtusniff_core::{
    constants::FunctionCode, pipeline::LocatedFrame, DecodeError, DecodedFrame, PipelineStats,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Instant;

const RULE_WIDTH: usize = 70;

/// Maps monotonic arrival times onto the wall clock
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
    started_wall: DateTime<Local>,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_wall: Local::now(),
        }
    }

    pub fn wall_time(&self, at: Instant) -> DateTime<Local> {
        let elapsed = chrono::Duration::from_std(at.saturating_duration_since(self.started))
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.started_wall + elapsed
    }
}

/// One decoded frame as written to JSON output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub offset: usize,
    pub kind: String,
    pub slave_addr: u8,
    pub function_code: u8,
    pub crc_valid: bool,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_addr: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_count: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registers: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl FrameRecord {
    pub fn new(located: &LocatedFrame, at: Option<DateTime<Local>>) -> Self {
        let frame = &located.frame;
        let mut record = Self {
            timestamp: at.map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, false)),
            offset: located.offset,
            kind: frame.kind().to_string(),
            slave_addr: frame.slave_addr(),
            function_code: frame.function_code(),
            crc_valid: frame.crc_valid(),
            raw: hex::encode_upper(frame.raw()),
            start_addr: None,
            reg_count: None,
            registers: None,
            exception_code: None,
            exception: None,
        };

        match frame {
            DecodedFrame::ReadHoldingRegistersResponse { registers, .. } => {
                record.registers = Some(registers.clone());
            }
            DecodedFrame::WriteMultipleRegistersRequest {
                start_addr,
                reg_count,
                values,
                ..
            } => {
                record.start_addr = Some(*start_addr);
                record.reg_count = Some(*reg_count);
                record.registers = Some(values.clone());
            }
            DecodedFrame::WriteMultipleRegistersResponse {
                start_addr,
                reg_count,
                ..
            } => {
                record.start_addr = Some(*start_addr);
                record.reg_count = Some(*reg_count);
            }
            DecodedFrame::ExceptionResponse { error_code, .. } => {
                record.exception_code = Some(*error_code);
                record.exception = frame.exception_code().map(|c| c.description().to_string());
            }
        }
        record
    }
}

/// A line of JSON Lines output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventRecord {
    Frame(FrameRecord),
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
        message: String,
    },
}

impl EventRecord {
    pub fn error(err: &DecodeError, at: Option<DateTime<Local>>) -> Self {
        EventRecord::Error {
            timestamp: at.map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, false)),
            message: err.to_string(),
        }
    }
}

/// Holding register reference number for a zero-based address
pub fn holding_reference(addr: u16) -> String {
    format!("4{:04}", u32::from(addr) + 1)
}

/// `[HH:MM:SS.mmm]`
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    format!("[{}]", at.format("%H:%M:%S%.3f"))
}

/// Uppercase hex with a space between bytes
pub fn spaced_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

/// Printable ASCII with everything else shown as `.`
pub fn ascii_preview(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn function_label(frame: &DecodedFrame) -> String {
    let code = frame.function_code();
    let base = code & 0x7F;
    let name = FunctionCode::from_u8(base)
        .map(|f| f.name().to_string())
        .unwrap_or_else(|| format!("function {}", base));
    if frame.is_exception() {
        format!("0x{:02X} (exception, {})", code, name)
    } else {
        format!("0x{:02X} ({})", code, name)
    }
}

/// Multi-line report of one frame
pub fn format_frame(frame: &DecodedFrame, at: Option<&DateTime<Local>>, color: bool) -> String {
    let mut out = String::new();
    let stamp = at.map(format_timestamp).unwrap_or_default();
    let heading = if stamp.is_empty() {
        "Modbus frame:".to_string()
    } else {
        format!("{} Modbus frame:", stamp)
    };

    let _ = writeln!(out, "{} {}", heading, spaced_hex(frame.raw()));
    let _ = writeln!(out, "    Slave address: {}", frame.slave_addr());
    let _ = writeln!(out, "    Function:      {}", function_label(frame));

    match frame {
        DecodedFrame::ReadHoldingRegistersResponse {
            byte_count,
            registers,
            ..
        } => {
            let _ = writeln!(
                out,
                "    Holding registers ({}, {} bytes):",
                registers.len(),
                byte_count
            );
            // A response does not carry its start address, so number from 40001
            for (i, value) in registers.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "      {}: {} (0x{:04X})",
                    holding_reference(i as u16),
                    value,
                    value
                );
            }
        }
        DecodedFrame::WriteMultipleRegistersRequest {
            start_addr,
            reg_count,
            values,
            ..
        } => {
            let _ = writeln!(
                out,
                "    Start address: {} ({})",
                start_addr,
                holding_reference(*start_addr)
            );
            let _ = writeln!(out, "    Register count: {}", reg_count);
            for (i, value) in values.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "      {}: {} (0x{:04X})",
                    holding_reference(start_addr.wrapping_add(i as u16)),
                    value,
                    value
                );
            }
        }
        DecodedFrame::WriteMultipleRegistersResponse {
            start_addr,
            reg_count,
            ..
        } => {
            let _ = writeln!(
                out,
                "    Start address: {} ({})",
                start_addr,
                holding_reference(*start_addr)
            );
            let _ = writeln!(out, "    Register count: {}", reg_count);
        }
        DecodedFrame::ExceptionResponse { error_code, .. } => {
            let description = frame
                .exception_code()
                .map(|c| c.description())
                .unwrap_or("unknown error code");
            let _ = writeln!(
                out,
                "    Exception:     0x{:02X} ({})",
                error_code, description
            );
        }
    }

    let crc = match (frame.crc_valid(), color) {
        (true, true) => "valid".green().to_string(),
        (false, true) => "invalid".red().to_string(),
        (true, false) => "valid".to_string(),
        (false, false) => "invalid".to_string(),
    };
    let _ = writeln!(out, "    CRC:           {}", crc);
    let _ = write!(out, "{:-<width$}", "", width = RULE_WIDTH);
    out
}

/// One received chunk as hex plus ASCII
pub fn format_raw_chunk(bytes: &[u8], at: &DateTime<Local>) -> String {
    format!(
        "{} Received {} bytes: {} | {}",
        format_timestamp(at),
        bytes.len(),
        spaced_hex(bytes),
        ascii_preview(bytes)
    )
}

/// Statistics block printed at the end of a session or decode
pub fn format_stats(stats: &PipelineStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Decode Statistics ===");
    let _ = writeln!(out, "Bytes received:    {} bytes", stats.bytes_received);
    let _ = writeln!(out, "Idle passes:       {}", stats.passes);
    let _ = writeln!(out, "Frames decoded:    {}", stats.frames_decoded);
    let _ = writeln!(out, "CRC failures:      {}", stats.crc_failures);
    let _ = writeln!(out, "Decode errors:     {}", stats.decode_errors);
    let _ = writeln!(out, "Buffer clears:     {}", stats.desync_clears);
    let _ = writeln!(out, "Bytes discarded:   {} bytes", stats.bytes_discarded);
    let _ = write!(out, "CRC pass rate:     {:.2}%", stats.crc_pass_rate());
    out
}
