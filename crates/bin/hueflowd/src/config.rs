//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hueflow.toml` in the working directory, or the file named by
//! `HUEFLOW_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use hueflow_adapter_ble::HueBleConfig;

const DEFAULT_CONFIG_PATH: &str = "hueflow.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which light to drive and how to reach it.
    pub light: LightConfig,
    /// Where the saved plan lives.
    pub schedule: ScheduleConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Light backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A Hue bulb over Bluetooth LE.
    #[default]
    Ble,
    /// The in-memory light, for dry runs.
    Virtual,
}

/// Light configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub backend: Backend,
    /// MAC address of the bulb. Required for the `ble` backend.
    pub address: String,
    /// How long to scan for the bulb, in seconds.
    pub scan_timeout_secs: u16,
    /// Upper bound for connecting and for each direct command, in seconds.
    pub connect_timeout_secs: u16,
}

/// Saved plan location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub path: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hueflow.toml` (or `$HUEFLOW_CONFIG`) if
    /// present, then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is
    /// malformed, or if the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("HUEFLOW_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("HUE_MAC_ADDRESS") {
            self.light.address = val;
        }
        if let Some(val) = var("HUEFLOW_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.light.backend == Backend::Ble && self.light.address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "the ble backend needs a light address (set HUE_MAC_ADDRESS)".to_string(),
            ));
        }
        if self.light.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl LightConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }

    /// Settings for the BLE adapter.
    #[must_use]
    pub fn ble(&self) -> HueBleConfig {
        HueBleConfig {
            address: self.address.trim().to_string(),
            scan_timeout_secs: self.scan_timeout_secs,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            address: String::new(),
            scan_timeout_secs: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        Self {
            path: home.join(".config/hue-ble/schedule.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hueflowd=info,hueflow=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, val)| ((*key).to_string(), (*val).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.light.backend, Backend::Ble);
        assert!(config.light.address.is_empty());
        assert_eq!(config.light.scan_timeout_secs, 10);
        assert_eq!(config.light.connect_timeout(), Duration::from_secs(30));
        assert!(
            config
                .schedule
                .path
                .ends_with(".config/hue-ble/schedule.json")
        );
        assert_eq!(config.logging.filter, "hueflowd=info,hueflow=info");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.light.connect_timeout_secs, 30);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [light]
            backend = 'virtual'
            address = 'C4:29:96:AA:BB:CC'
            scan_timeout_secs = 4
            connect_timeout_secs = 12

            [schedule]
            path = '/tmp/plan.json'

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.light.backend, Backend::Virtual);
        assert_eq!(config.light.address, "C4:29:96:AA:BB:CC");
        assert_eq!(config.light.scan_timeout_secs, 4);
        assert_eq!(config.light.connect_timeout(), Duration::from_secs(12));
        assert_eq!(config.schedule.path, PathBuf::from("/tmp/plan.json"));
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [light]
            address = 'C4:29:96:AA:BB:CC'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.light.backend, Backend::Ble);
        assert_eq!(config.light.scan_timeout_secs, 10);
        assert_eq!(config.logging.filter, "hueflowd=info,hueflow=info");
    }

    #[test]
    fn should_reject_unknown_backend() {
        let result: Result<Config, _> = toml::from_str("[light]\nbackend = 'zigbee'");
        assert!(result.is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file(Path::new("nonexistent.toml")).unwrap();
        assert_eq!(config.light.scan_timeout_secs, 10);
    }

    #[test]
    fn should_override_address_from_env() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("HUE_MAC_ADDRESS", "C4:29:96:AA:BB:CC")]));
        assert_eq!(config.light.address, "C4:29:96:AA:BB:CC");
    }

    #[test]
    fn should_prefer_rust_log_over_hueflow_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("HUEFLOW_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");

        let mut config = Config::default();
        config.apply_overrides(env(&[("HUEFLOW_LOG", "warn")]));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_require_address_for_ble_backend() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_accept_virtual_backend_without_address() {
        let mut config = Config::default();
        config.light.backend = Backend::Virtual;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_connect_timeout() {
        let mut config = Config::default();
        config.light.backend = Backend::Virtual;
        config.light.connect_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_trim_address_for_ble_adapter() {
        let mut config = Config::default();
        config.light.address = " C4:29:96:AA:BB:CC ".to_string();
        config.light.scan_timeout_secs = 3;

        let ble = config.light.ble();

        assert_eq!(ble.address, "C4:29:96:AA:BB:CC");
        assert_eq!(ble.scan_timeout_secs, 3);
    }
}
