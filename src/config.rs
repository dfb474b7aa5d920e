//! Decoder configuration using Figment.
//!
//! Configuration is layered:
//! 1. built-in defaults,
//! 2. a TOML file (`config/set_decoder.toml` unless another path is given),
//! 3. environment variables prefixed with `SET_DECODER_`, with `__` separating
//!    sections from keys.
//!
//! # Example
//! ```no_run
//! use set_decoder::config::DecoderConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // SET_DECODER_LAYOUT__RECORD_CAPACITY=640 overrides the file
//! let config = DecoderConfig::load()?;
//! config.validate()?;
//! println!("record capacity: {}", config.layout.record_capacity);
//! # Ok(())
//! # }
//! ```

use crate::error::{DecodeError, DecodeResult};
use crate::layout::RECORD_CAPACITY;
use crate::logging::OutputFormat;
use crate::validation::{is_in_range, is_not_empty};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/set_decoder.toml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "SET_DECODER_";

/// Top-level decoder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Layout interpretation
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Output document settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How layout files map onto records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Words per module record
    #[serde(default = "default_record_capacity")]
    pub record_capacity: u32,
    /// Layout address units per 32-bit word
    #[serde(default = "default_address_stride")]
    pub address_stride: u32,
}

/// Output document settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Extension replacing the settings file's extension
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Indent the JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log line format
    #[serde(default)]
    pub format: OutputFormat,
}

// Default value functions
fn default_record_capacity() -> u32 {
    RECORD_CAPACITY
}

fn default_address_stride() -> u32 {
    1
}

fn default_extension() -> String {
    "json".to_string()
}

fn default_pretty() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            record_capacity: default_record_capacity(),
            address_stride: default_address_stride(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            pretty: default_pretty(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: OutputFormat::default(),
        }
    }
}

impl DecoderConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> DecodeResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path. A missing file leaves the
    /// defaults in place.
    pub fn load_from<P: AsRef<Path>>(path: P) -> DecodeResult<Self> {
        let config = Figment::from(Serialized::defaults(DecoderConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> DecodeResult<()> {
        is_in_range(self.layout.record_capacity, 1..=u32::MAX).map_err(|_| {
            DecodeError::Settings("layout.record_capacity must be at least 1".to_string())
        })?;

        is_in_range(self.layout.address_stride, 1..=u32::MAX).map_err(|_| {
            DecodeError::Settings("layout.address_stride must be at least 1".to_string())
        })?;

        is_not_empty(&self.output.extension).map_err(|_| {
            DecodeError::Settings("output.extension cannot be empty".to_string())
        })?;

        crate::logging::parse_log_level(&self.logging.level)?;

        Ok(())
    }
}
