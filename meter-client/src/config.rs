//! Readout configuration
//!
//! Loaded once at startup from an optional YAML file. Every field has a
//! default matching the supported meter, so a minimal file only carries the
//! key:
//!
//! ```yaml
//! key: "00112233445566778899AABBCCDDEEFF"
//! serial:
//!   port: /dev/ttyUSB0
//! log:
//!   file: /var/log/meter-readout.log
//! ```

use meter_core::{MeterError, MeterResult};
use meter_security::{BlockCipherKey, TAG_LENGTH};
use meter_session::FrameLayout;
use meter_session::mbus::{DEFAULT_FRAME_LENGTH, FRAME_END, FRAME_START};
use meter_transport::{DataBits, Parity, SerialSettings, StopBits};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest frame pair able to hold both link headers and the GCM tag
pub const MIN_FRAME_LENGTH: usize = 40 + TAG_LENGTH;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadoutConfig {
    pub serial: SerialConfig,
    /// Interval at which the meter pushes a readout
    pub emission_interval_ms: u64,
    pub frame: FrameConfig,
    /// Block cipher key issued by the grid operator, 32 hex digits
    pub key: Option<String>,
    pub log: LogConfig,
    /// Exit on the first signal instead of finishing the current cycle
    pub shutdown_immediately: bool,
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            emission_interval_ms: 5000,
            frame: FrameConfig::default(),
            key: None,
            log: LogConfig::default(),
            shutdown_immediately: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub parity: ParityConfig,
    pub stop_bits: u8,
    pub data_bits: u8,
    /// Read timeout; must stay below the emission interval
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 2400,
            parity: ParityConfig::None,
            stop_bits: 1,
            data_bits: 8,
            timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameConfig {
    pub length: usize,
    pub start_byte: u8,
    pub end_byte: u8,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_FRAME_LENGTH,
            start_byte: FRAME_START,
            end_byte: FRAME_END,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Append log lines to this file
    pub file: Option<PathBuf>,
    pub to_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            to_stderr: true,
        }
    }
}

impl ReadoutConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> MeterResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> MeterResult<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| MeterError::Config(e.to_string()))
    }

    /// Check the configuration for values the readout cannot work with
    pub fn validate(&self) -> MeterResult<()> {
        self.cipher_key()?;
        self.serial_settings()?;

        if self.serial.timeout_ms == 0 {
            return Err(MeterError::Config("serial.timeout_ms must be positive".to_string()));
        }
        if self.serial.timeout_ms >= self.emission_interval_ms {
            return Err(MeterError::Config(format!(
                "serial.timeout_ms ({}) must be shorter than emission_interval_ms ({})",
                self.serial.timeout_ms, self.emission_interval_ms
            )));
        }
        if self.frame.length < MIN_FRAME_LENGTH {
            return Err(MeterError::Config(format!(
                "frame.length {} is below the minimum of {}",
                self.frame.length, MIN_FRAME_LENGTH
            )));
        }
        Ok(())
    }

    pub fn cipher_key(&self) -> MeterResult<BlockCipherKey> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| MeterError::Config("no block cipher key configured".to_string()))?;
        BlockCipherKey::from_hex(key)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.serial.timeout_ms)
    }

    pub fn frame_layout(&self) -> FrameLayout {
        FrameLayout {
            length: self.frame.length,
            start: self.frame.start_byte,
            end: self.frame.end_byte,
        }
    }

    pub fn serial_settings(&self) -> MeterResult<SerialSettings> {
        let mut settings = SerialSettings::with_timeout(
            self.serial.port.clone(),
            self.serial.baud_rate,
            self.read_timeout(),
        );
        settings.parity = match self.serial.parity {
            ParityConfig::None => Parity::None,
            ParityConfig::Even => Parity::Even,
            ParityConfig::Odd => Parity::Odd,
        };
        settings.stop_bits = match self.serial.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => {
                return Err(MeterError::Config(format!("unsupported stop bits: {}", other)));
            }
        };
        settings.data_bits = match self.serial.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => {
                return Err(MeterError::Config(format!("unsupported data bits: {}", other)));
            }
        };
        Ok(settings)
    }
}
