//! Capture file loading
//!
//! Text captures hold one idle-delimited burst per line as hex bytes.
//! Bytes may be separated by spaces, commas or colons and may carry a `0x`
//! prefix. Everything after `#` is a comment; blank lines are skipped.
//! Binary captures are read whole as a single burst.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{self, Read};

/// Parse a text capture into bursts
pub fn parse_hex_capture(text: &str) -> Result<Vec<Vec<u8>>> {
    let mut bursts = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default();
        let digits: String = content
            .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .strip_prefix("0x")
                    .or_else(|| token.strip_prefix("0X"))
                    .unwrap_or(token)
            })
            .collect();

        if digits.is_empty() {
            continue;
        }
        if digits.len() % 2 != 0 {
            bail!("Line {}: odd number of hex digits", index + 1);
        }

        let burst = hex::decode(&digits)
            .with_context(|| format!("Line {}: invalid hex", index + 1))?;
        bursts.push(burst);
    }

    Ok(bursts)
}

/// Read a capture from `input`, or stdin when `input` is `-`
pub fn read_capture(input: &str, binary: bool) -> Result<Vec<Vec<u8>>> {
    let data = if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read capture from stdin")?;
        buf
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?
    };

    if binary {
        return Ok(if data.is_empty() { Vec::new() } else { vec![data] });
    }

    let text = String::from_utf8(data).context("Text capture is not valid UTF-8")?;
    parse_hex_capture(&text)
}
