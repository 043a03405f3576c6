use anyhow::Result;
use clap::{Parser, Subcommand};
use rtusniff_cli::{
    commands,
    commands::{decode::DecodeOutput, encode::FrameSpec},
    parse_byte, parse_word,
    settings::{MonitorSettings, SettingsOverrides},
    CrcOrderArg, FrameKind, ResyncArg,
};
use rtusniff_core::{CrcByteOrder, PipelineConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rtusniff")]
#[command(about = "rtusniff - Passive Modbus RTU bus monitor and decoder", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen on a serial port and decode frames as they go by
    Monitor {
        /// JSON settings file
        #[arg(short, long)]
        config: Option<String>,

        /// Serial device
        #[arg(short, long)]
        port: Option<String>,

        /// Bus speed
        #[arg(short, long)]
        baud: Option<u32>,

        /// CRC byte order to check against
        #[arg(long, value_enum)]
        crc_order: Option<CrcOrderArg>,

        /// What to do after a frame fails to decode
        #[arg(long, value_enum)]
        resync: Option<ResyncArg>,

        /// Port read timeout in milliseconds
        #[arg(long)]
        read_timeout_ms: Option<u64>,

        /// Sleep between loop iterations in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Also print every received chunk as hex and ASCII
        #[arg(long)]
        raw: bool,

        /// Append JSON Lines records to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Decode a capture file offline
    Decode {
        /// Capture file, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Treat the input as raw bytes forming one burst
        #[arg(long)]
        binary: bool,

        /// Bus speed the capture was taken at
        #[arg(short, long, default_value = "9600")]
        baud: u32,

        /// CRC byte order to check against
        #[arg(long, value_enum, default_value = "big")]
        crc_order: CrcOrderArg,

        /// What to do after a frame fails to decode
        #[arg(long, value_enum, default_value = "clear")]
        resync: ResyncArg,

        /// Output file for decoded frames
        #[arg(short, long)]
        output: Option<String>,

        /// Write JSON Lines instead of a JSON array
        #[arg(long)]
        jsonl: bool,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },

    /// Encode one frame as a capture line
    Encode {
        /// Frame shape
        #[arg(value_enum)]
        kind: FrameKind,

        /// Slave address
        #[arg(short, long, value_parser = parse_byte)]
        slave: u8,

        /// Start register address
        #[arg(long, default_value = "0", value_parser = parse_word)]
        start: u16,

        /// Register count for read requests and write responses
        #[arg(long, default_value = "1", value_parser = parse_word)]
        count: u16,

        /// Register values, comma separated
        #[arg(long, value_delimiter = ',', value_parser = parse_word)]
        values: Vec<u16>,

        /// Function the exception answers
        #[arg(long, default_value = "3", value_parser = parse_byte)]
        function: u8,

        /// Exception code
        #[arg(long, default_value = "2", value_parser = parse_byte)]
        error_code: u8,

        /// CRC byte order to write
        #[arg(long, value_enum, default_value = "big")]
        crc_order: CrcOrderArg,

        /// Write a deliberately wrong CRC
        #[arg(long)]
        corrupt_crc: bool,

        /// Append the line to this capture file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List serial ports
    Ports {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout carries the reports
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Monitor {
            config,
            port,
            baud,
            crc_order,
            resync,
            read_timeout_ms,
            poll_interval_ms,
            raw,
            output,
        } => {
            let settings = MonitorSettings::load(config.as_deref())?.with_overrides(
                SettingsOverrides {
                    port,
                    baud_rate: baud,
                    crc_order: crc_order.map(Into::into),
                    resync: resync.map(Into::into),
                    read_timeout_ms,
                    poll_interval_ms,
                },
            );
            commands::monitor::execute(&settings, raw, output.as_deref())
        }

        Commands::Decode {
            input,
            binary,
            baud,
            crc_order,
            resync,
            output,
            jsonl,
            stats_only,
        } => {
            let config = PipelineConfig {
                baud_rate: baud,
                crc_order: crc_order.into(),
                resync: resync.into(),
                ..PipelineConfig::default()
            };
            let output = DecodeOutput {
                path: output.as_deref(),
                jsonl,
                stats_only,
            };
            commands::decode::execute(&input, binary, config, &output).map(|_| ())
        }

        Commands::Encode {
            kind,
            slave,
            start,
            count,
            values,
            function,
            error_code,
            crc_order,
            corrupt_crc,
            output,
        } => {
            let spec = FrameSpec {
                kind,
                slave,
                start_addr: start,
                count,
                values,
                function,
                error_code,
                corrupt_crc,
            };
            let order: CrcByteOrder = crc_order.into();
            commands::encode::execute(&spec, order, output.as_deref()).map(|_| ())
        }

        Commands::Ports { json } => commands::ports::execute(json),
    }
}
