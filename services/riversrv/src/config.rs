//! riversrv configuration
//!
//! Built-in defaults, then the YAML file, then `RIVERSRV_` environment variables
//! (`RIVERSRV_SERIAL__PORT=/dev/ttyUSB0`). Command-line flags are applied on top
//! by [`crate::bootstrap::Args::apply_overrides`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serial_link::ChannelConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/riversrv.yaml";
pub const ENV_PREFIX: &str = "RIVERSRV_";

#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM3";
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    /// Minimum seconds between two open attempts
    pub retry_interval_secs: u64,
    /// How long a started line may take to complete
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: 9600,
            retry_interval_secs: 5,
            read_timeout_ms: 1000,
        }
    }
}

impl SerialSettings {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// LED blinking; disabled when no interval is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub blink_interval_secs: Option<u64>,
}

impl LightSettings {
    pub fn blink_interval(&self) -> Option<Duration> {
        self.blink_interval_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Daily log files go here; console only when unset
    pub dir: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json: false,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    pub serial: SerialSettings,
    /// Ticks per second
    pub frame_rate: u32,
    pub light: LightSettings,
    pub logging: LoggingSettings,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            frame_rate: 60,
            light: LightSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl RiverConfig {
    /// Layered sources, lowest priority first. A missing file is skipped.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(RiverConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load without validating, so command-line overrides can still fix things up
    pub fn load(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            bail!("serial.port cannot be empty");
        }
        if self.serial.baud_rate == 0 {
            bail!("serial.baud_rate must be greater than 0");
        }
        if self.serial.read_timeout_ms == 0 {
            bail!("serial.read_timeout_ms must be greater than 0");
        }
        if self.frame_rate == 0 {
            bail!("frame_rate must be greater than 0");
        }
        if self.light.blink_interval_secs == Some(0) {
            bail!("light.blink_interval_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn channel_config(&self) -> serial_link::Result<ChannelConfig> {
        ChannelConfig::new(self.serial.port.clone(), self.serial.baud_rate)
    }

    /// Time between two ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}
