//! Monitor settings: JSON file plus command-line overrides

use anyhow::{Context, Result};
use rtusniff_core::{CrcByteOrder, PipelineConfig, ResyncPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Everything `monitor` needs to open a port and decode from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Serial device path
    pub port: String,

    /// Decoder settings, stored flat next to the transport ones
    #[serde(flatten)]
    pub pipeline: PipelineConfig,

    /// How long one port read may block
    pub read_timeout_ms: u64,

    /// Sleep between loop iterations
    pub poll_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            pipeline: PipelineConfig::default(),
            read_timeout_ms: 1000,
            poll_interval_ms: 10,
        }
    }
}

/// Values given on the command line; `None` keeps the file or default value
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub crc_order: Option<CrcByteOrder>,
    pub resync: Option<ResyncPolicy>,
    pub read_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl MonitorSettings {
    /// Load from a JSON file, or start from defaults when no path is given
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.pipeline.baud_rate = baud_rate;
        }
        if let Some(crc_order) = overrides.crc_order {
            self.pipeline.crc_order = crc_order;
        }
        if let Some(resync) = overrides.resync {
            self.pipeline.resync = resync;
        }
        if let Some(ms) = overrides.read_timeout_ms {
            self.read_timeout_ms = ms;
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        self
    }

    /// Check the settings before anything is opened
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            anyhow::bail!("No serial port given");
        }
        self.pipeline
            .validate()
            .context("Invalid decoder settings")?;
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
