//! Hue BLE light configuration.

use std::time::Duration;

use serde::Deserialize;

/// Where to find the light and how long to look for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HueBleConfig {
    /// MAC address of the light (e.g. `"C4:29:96:AA:BB:CC"`).
    pub address: String,
    /// How long to scan for the light before giving up, in seconds.
    pub scan_timeout_secs: u16,
}

impl Default for HueBleConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            scan_timeout_secs: 10,
        }
    }
}

impl HueBleConfig {
    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_timeout_secs))
    }
}
