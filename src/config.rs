// Configuration management
//
// Pipeline settings loaded from and saved to a TOML file. Missing fields
// fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::display::{PaletteKind, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::pipeline::PipelineError;

/// Default configuration file path
pub const CONFIG_FILE: &str = "pipeline_config.toml";

/// Errors that can occur while loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error
    Io(io::Error),

    /// TOML parse error
    Parse(toml::de::Error),

    /// TOML serialization error
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Display resolution and LCD palette
    pub display: DisplayConfig,

    /// Consumer thread settings
    pub consumer: ConsumerConfig,

    /// Screenshot settings
    pub screenshot: ScreenshotConfig,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width in pixels
    pub width: usize,

    /// Height in pixels
    pub height: usize,

    /// LCD palette for indexed pixels
    pub palette: PaletteKind,
}

/// Consumer thread configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Longest wait on an empty queue before re-checking state (ms)
    pub idle_wait_ms: u64,

    /// Converted frames between progress log lines (0 disables)
    pub progress_log_interval: u64,
}

/// Screenshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Screenshot directory
    pub directory: PathBuf,

    /// Include timestamp in filename
    pub include_timestamp: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            palette: PaletteKind::Standard,
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            idle_wait_ms: 5,
            progress_log_interval: 60,
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        ScreenshotConfig {
            directory: PathBuf::from("screenshots"),
            include_timestamp: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from file or fall back to defaults
    ///
    /// If the file doesn't exist or can't be parsed, the default
    /// configuration is returned and written to `path`.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(&path).unwrap_or_else(|_| {
            let config = Self::default();
            // Try to save the default config, but don't fail if we can't
            let _ = config.save(&path);
            config
        })
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check values that would make a pipeline unusable
    pub fn validate(&self) -> Result<(), PipelineError> {
        let DisplayConfig { width, height, .. } = self.display;
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidResolution { width, height });
        }
        if width.checked_mul(height).is_none() {
            return Err(PipelineError::InvalidResolution { width, height });
        }
        if self.consumer.idle_wait_ms == 0 {
            return Err(PipelineError::InvalidConfig(
                "consumer.idle_wait_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
