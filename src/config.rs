//! Configuration management for batty
//!
//! Settings are read from a platform-specific config file when present;
//! command line flags override them.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/batty/config.toml` |
//! | macOS | `~/Library/Application Support/batty/config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use batty::Config;
//!
//! // Load existing config or use defaults
//! let mut config = Config::load().unwrap_or_default();
//!
//! // Modify settings
//! config.typo.rate = 0.25;
//!
//! // Save to disk
//! config.save().expect("Failed to save config");
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A setting is out of range
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Returns the path to the config file.
///
/// # Platform-specific paths
///
/// - Linux: `~/.config/batty/config.toml`
/// - macOS: `~/Library/Application Support/batty/config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("batty").join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Typo generation settings
    #[serde(default)]
    pub typo: TypoConfig,
    /// Capture and injection settings
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Typo generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TypoConfig {
    /// Probability that an alphabetic character gets a typo
    pub rate: f64,
    /// Keyboard layout name, or `auto`
    pub layout: String,
}

impl Default for TypoConfig {
    fn default() -> Self {
        Self {
            rate: 0.1,
            layout: "qwerty".to_string(),
        }
    }
}

/// Capture and injection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker threads running the typo decision
    pub workers: usize,
    /// Captured characters held between capture and the workers
    pub queue_capacity: usize,
    /// Pause before a correction is written, in milliseconds.
    /// 26ms sits just under the default 31ms key repeat interval.
    pub injection_delay_ms: u64,
    /// Injections allowed to run at the same time
    pub max_in_flight: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 100,
            injection_delay_ms: 26,
            max_in_flight: 16,
        }
    }
}

impl EngineConfig {
    /// Get the injection delay as Duration
    pub fn injection_delay(&self) -> Duration {
        Duration::from_millis(self.injection_delay_ms)
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.typo.rate) {
            return Err(ConfigError::Invalid(format!(
                "rate must be between 0.0 and 1.0, got {}",
                self.typo.rate
            )));
        }
        if self.engine.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.engine.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.engine.max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "max_in_flight must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path() -> PathBuf {
        env::temp_dir().join(format!("batty-test-{}.toml", std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.typo.rate, 0.1);
        assert_eq!(config.typo.layout, "qwerty");
        assert_eq!(config.engine.workers, 5);
        assert_eq!(config.engine.queue_capacity, 100);
        assert_eq!(config.engine.injection_delay_ms, 26);
        assert_eq!(config.engine.max_in_flight, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_injection_delay() {
        let config = EngineConfig::default();
        assert_eq!(config.injection_delay(), Duration::from_millis(26));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path();

        let mut config = Config::default();
        config.typo.rate = 0.5;
        config.typo.layout = "dvorak".to_string();
        config.engine.workers = 8;

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn config_partial_file_uses_defaults() {
        let toml_str = r#"
[typo]
rate = 0.3
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.typo.rate, 0.3);
        assert_eq!(config.typo.layout, "qwerty");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml_str = r#"
[typo]
rate = 0.05
layout = "azerty"

[engine]
workers = 10
queue_capacity = 50
injection_delay_ms = 40
max_in_flight = 4
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.typo.rate, 0.05);
        assert_eq!(config.typo.layout, "azerty");
        assert_eq!(config.engine.workers, 10);
        assert_eq!(config.engine.queue_capacity, 50);
        assert_eq!(config.engine.injection_delay_ms, 40);
        assert_eq!(config.engine.max_in_flight, 4);
    }

    #[test]
    fn config_serializes_to_toml() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");
        assert!(toml_str.contains("[typo]"));
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("workers = 5"));
    }

    #[test]
    fn validate_rejects_bad_rate() {
        let mut config = Config::default();
        config.typo.rate = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rate"));

        config.typo.rate = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let mut config = Config::default();
        config.engine.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.engine.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.engine.max_in_flight = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }
}
