//! Configuration file support for physio.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/physio/config.toml`.
//! Every section is optional; missing keys take their defaults.

use crate::sampler::DEFAULT_MAX_POINTS;
use crate::sweep::{SweepLimits, DEFAULT_MAX_AXIS_LEN, DEFAULT_SENTINEL};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Trajectory sampler limits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SamplerConfig {
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
        }
    }
}

/// Sweep grid limits
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SweepConfig {
    #[serde(default = "default_max_axis_len")]
    pub max_axis_len: usize,

    /// Value written into cells the model cannot evaluate
    #[serde(default = "default_sentinel")]
    pub sentinel: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_axis_len: default_max_axis_len(),
            sentinel: default_sentinel(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::UnknownOption {
                kind: "output format",
                value: other.to_string(),
                expected: "table, json, csv",
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// Output preferences
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

// Default value functions
fn default_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

fn default_max_axis_len() -> usize {
    DEFAULT_MAX_AXIS_LEN
}

fn default_sentinel() -> f64 {
    DEFAULT_SENTINEL
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"));
        base.join("physio").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject limits the sampler or sweep could never satisfy
    pub fn validate(&self) -> Result<()> {
        if self.sampler.max_points == 0 {
            return Err(Error::Config("sampler.max_points must be at least 1".into()));
        }
        if self.sweep.max_axis_len == 0 {
            return Err(Error::Config("sweep.max_axis_len must be at least 1".into()));
        }
        if !self.sweep.sentinel.is_finite() {
            return Err(Error::Config("sweep.sentinel must be finite".into()));
        }
        Ok(())
    }

    pub fn sweep_limits(&self) -> SweepLimits {
        SweepLimits {
            max_axis_len: self.sweep.max_axis_len,
            sentinel: self.sweep.sentinel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sampler.max_points, 5000);
        assert_eq!(config.sweep.max_axis_len, 64);
        assert_eq!(config.sweep.sentinel, 480.0);
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[sweep]
sentinel = -1.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sweep.sentinel, -1.0);
        assert_eq!(config.sweep.max_axis_len, 64); // default
        assert_eq!(config.sampler.max_points, 5000); // default
    }

    #[test]
    fn test_output_format_from_toml() {
        let config: Config = toml::from_str("[output]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(toml::from_str::<Config>("[output]\nformat = \"xml\"\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.sampler.max_points = 250;
        config.output.format = OutputFormat::Csv;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.sweep_limits().max_axis_len, 64);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sampler]\nmax_points = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sampler\nmax_points = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
