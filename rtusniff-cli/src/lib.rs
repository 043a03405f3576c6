//! Library entry for rtusniff-cli used by integration tests and embedding.

pub mod capture;
pub mod commands;
pub mod report;
pub mod session;
pub mod settings;

// Re-export commands for convenience
pub use commands::*;

use rtusniff_core::{CrcByteOrder, ResyncPolicy};

/// CRC byte order as accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CrcOrderArg {
    /// High byte first
    Big,
    /// Low byte first, the standard RTU wire order
    Little,
}

impl From<CrcOrderArg> for CrcByteOrder {
    fn from(arg: CrcOrderArg) -> Self {
        match arg {
            CrcOrderArg::Big => CrcByteOrder::BigEndian,
            CrcOrderArg::Little => CrcByteOrder::LittleEndian,
        }
    }
}

/// Resynchronization policy as accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ResyncArg {
    /// Drop the buffer when a pass decodes nothing
    Clear,
    /// Skip one byte after a failed candidate and keep scanning
    Slide,
}

impl From<ResyncArg> for ResyncPolicy {
    fn from(arg: ResyncArg) -> Self {
        match arg {
            ResyncArg::Clear => ResyncPolicy::ClearBuffer,
            ResyncArg::Slide => ResyncPolicy::SlideOneByte,
        }
    }
}

/// Frame shapes the encoder can produce
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FrameKind {
    /// Function 3 request
    ReadRequest,
    /// Function 3 response
    ReadResponse,
    /// Function 16 request
    WriteRequest,
    /// Function 16 response
    WriteResponse,
    /// Exception response
    Exception,
}

/// Parse a 16-bit word given in decimal or with a `0x` prefix
pub fn parse_word(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid 16-bit value '{}': {}", s, e))
}

/// Parse a byte given in decimal or with a `0x` prefix
pub fn parse_byte(s: &str) -> Result<u8, String> {
    let word = parse_word(s)?;
    u8::try_from(word).map_err(|_| format!("value '{}' does not fit in a byte", s))
}
