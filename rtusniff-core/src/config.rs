//! Decoding session configuration

use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_MAX_BUFFER_LEN, MAX_ADU_SIZE};
use crate::crc::CrcByteOrder;
use crate::error::DecodeError;
use alloc::format;
use serde::{Deserialize, Serialize};

/// What a drain pass does after a candidate fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Stop the pass; drop the whole buffer if nothing decoded in it
    #[default]
    ClearBuffer,
    /// Drop up to and including the failed start byte and keep scanning
    SlideOneByte,
}

/// Settings for one decoding session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bus speed, used only for the idle threshold
    pub baud_rate: u32,

    /// Byte order of the trailing CRC
    pub crc_order: CrcByteOrder,

    /// Recovery strategy after a failed candidate
    pub resync: ResyncPolicy,

    /// Upper bound on buffered, undecoded bytes
    pub max_buffer_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            crc_order: CrcByteOrder::default(),
            resync: ResyncPolicy::default(),
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
        }
    }
}

impl PipelineConfig {
    /// Config for `baud_rate` with everything else default
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.baud_rate == 0 {
            return Err(DecodeError::InvalidBaudRate(self.baud_rate));
        }

        if self.max_buffer_len < MAX_ADU_SIZE {
            return Err(DecodeError::InvalidConfig(format!(
                "max_buffer_len {} is smaller than one frame ({} bytes)",
                self.max_buffer_len, MAX_ADU_SIZE
            )));
        }

        Ok(())
    }
}
