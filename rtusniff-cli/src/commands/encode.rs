use crate::{report::spaced_hex, FrameKind};
use anyhow::{Context, Result};
use bytes::Bytes;
use rtusniff_core::{encoder::FrameBuilder, CrcByteOrder};
use std::fs::OpenOptions;
use std::io::Write;
use tracing::info;

/// Fields for one frame; each kind reads only the ones it needs
#[derive(Debug, Clone)]
pub struct FrameSpec {
    pub kind: FrameKind,
    pub slave: u8,
    pub start_addr: u16,
    pub count: u16,
    pub values: Vec<u16>,
    pub function: u8,
    pub error_code: u8,
    pub corrupt_crc: bool,
}

impl FrameSpec {
    pub fn build(&self, order: CrcByteOrder) -> Result<Bytes> {
        let builder = match self.kind {
            FrameKind::ReadRequest => FrameBuilder::read_request(self.slave, self.start_addr, self.count),
            FrameKind::ReadResponse => FrameBuilder::read_response(self.slave, &self.values),
            FrameKind::WriteRequest => {
                FrameBuilder::write_request(self.slave, self.start_addr, &self.values)
            }
            FrameKind::WriteResponse => {
                FrameBuilder::write_response(self.slave, self.start_addr, self.count)
            }
            FrameKind::Exception => {
                FrameBuilder::exception(self.slave, self.function, self.error_code)
            }
        };

        let builder = builder.crc_order(order);
        let builder = if self.corrupt_crc {
            builder.corrupt_crc()
        } else {
            builder
        };

        builder
            .build()
            .with_context(|| format!("Failed to encode {:?} frame", self.kind))
    }
}

/// Print one frame as a capture line, optionally appending it to `output`
pub fn execute(spec: &FrameSpec, order: CrcByteOrder, output: Option<&str>) -> Result<String> {
    let frame = spec.build(order)?;
    let line = spaced_hex(&frame);

    println!("{}", line);

    if let Some(output_path) = output {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)
            .with_context(|| format!("Failed to open output file: {}", output_path))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Appended {} byte frame to {}", frame.len(), output_path);
    }

    Ok(line)
}
