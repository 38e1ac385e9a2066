//! # Configuration Management
//!
//! Centralized configuration for the codec.
//!
//! This module provides structured configuration for the protocol version a
//! connection speaks, frame size limits, compression behavior and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Limits
//! - Frames are capped at 2 097 151 bytes, the largest length a 3-byte VarInt can carry
//! - Decompressed payloads are capped at 8 MiB

use crate::core::frame::FrameSettings;
use crate::error::{ProtocolError, Result};
use crate::protocol::version::{Fallback, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Largest frame length accepted on read or produced on write.
pub const MAX_FRAME_LENGTH: usize = 2_097_151;

/// Largest declared uncompressed size of a compressed frame.
pub const MAX_DATA_LENGTH: usize = 8_388_608;

/// Default zlib level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Threshold servers conventionally announce in `SetCompression`.
pub const DEFAULT_COMPRESSION_THRESHOLD: i32 = 256;

/// Top-level codec configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodecConfig {
    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults.
    ///
    /// Unlike a TOML file, a malformed variable is an error rather than being
    /// silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(version) = env_parse::<i32>("MC_PROTOCOL_VERSION")? {
            config.protocol.version = ProtocolVersion(version);
        }

        if let Some(threshold) = env_parse::<i32>("MC_PROTOCOL_COMPRESSION_THRESHOLD")? {
            config.compression.threshold = threshold;
        }

        if let Some(level) = env_parse::<u32>("MC_PROTOCOL_COMPRESSION_LEVEL")? {
            config.compression.level = level;
        }

        if let Some(level) = env_parse::<Level>("MC_PROTOCOL_LOG_LEVEL")? {
            config.logging.log_level = level;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Frame settings derived from the compression and protocol sections.
    pub fn frame_settings(&self) -> FrameSettings {
        FrameSettings {
            threshold: self.compression.threshold,
            level: self.compression.level,
            max_frame_length: self.protocol.max_frame_length,
            max_data_length: self.compression.max_data_length,
        }
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.protocol.validate());
        errors.extend(self.compression.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ProtocolError::ConfigError(format!("Invalid value for {key}: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

/// Protocol version and framing limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Protocol version number spoken on the connection
    pub version: ProtocolVersion,

    /// Largest accepted frame length in bytes
    pub max_frame_length: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::LATEST,
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.version.resolve() {
            Err(e) => errors.push(e.to_string()),
            Ok(resolution) if resolution.fallback == Fallback::Nearest => errors.push(format!(
                "WARNING: protocol {} is not supported, packets will use the {} layouts",
                self.version, resolution.effective
            )),
            Ok(_) => {}
        }

        if self.max_frame_length == 0 {
            errors.push("Max frame length cannot be 0".to_string());
        } else if self.max_frame_length > MAX_FRAME_LENGTH {
            errors.push(format!(
                "Max frame length too large: {} bytes (maximum: {MAX_FRAME_LENGTH})",
                self.max_frame_length
            ));
        }

        errors
    }
}

/// Compression configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompressionConfig {
    /// Packets whose id+body exceed this many bytes are compressed.
    /// Negative values disable compression entirely.
    pub threshold: i32,

    /// zlib compression level (0-9)
    pub level: u32,

    /// Largest accepted uncompressed payload
    pub max_data_length: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold: -1,
            level: DEFAULT_COMPRESSION_LEVEL,
            max_data_length: MAX_DATA_LENGTH,
        }
    }
}

impl CompressionConfig {
    pub fn enabled(&self) -> bool {
        self.threshold >= 0
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.level > 9 {
            errors.push(format!(
                "Invalid compression level: {} (valid range: 0-9)",
                self.level
            ));
        }

        if self.max_data_length == 0 {
            errors.push("Max data length cannot be 0".to_string());
        } else if self.max_data_length > MAX_DATA_LENGTH {
            errors.push(format!(
                "Max data length too large: {} bytes (maximum: {MAX_DATA_LENGTH})",
                self.max_data_length
            ));
        }

        if self.enabled() && self.threshold as usize > self.max_data_length {
            errors.push("Compression threshold cannot be larger than max data length".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("mc-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
