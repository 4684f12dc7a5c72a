//! Configuration file structures for Vigil.
//!
//! The configuration is read from a YAML file and can be overridden with
//! environment variables prefixed with `VIGIL_`, nested keys being separated
//! by `__`. Every value has a default, the file may be missing or partial.
//!
//! # Configuration File Format
//!
//! ```yaml
//! alerts:
//!   # Snoozes allowed per item, the one reaching it dismisses the alert
//!   max_snooze_attempts: 3
//!   # Snooze duration used when none is given
//!   default_snooze_secs: 300
//!   # all_monitors, primary_only, external_only or mouse_location
//!   monitor_preference: all_monitors
//!   # Delay between the wake signal and alerts being allowed again
//!   recovery_grace_secs: 5
//!   # Countdown refresh period, 0 disables it
//!   clock_refresh_secs: 1
//!
//! displays:
//!   - id: 1
//!     bounds: { x: 0, y: 0, width: 1920, height: 1080 }
//!     is_primary: true
//!   - id: 2
//!     name: "external"
//!     bounds: { x: 1920, y: 0, width: 2560, height: 1440 }
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export VIGIL_ALERTS__MAX_SNOOZE_ATTEMPTS=5
//! export VIGIL_ALERTS__MONITOR_PREFERENCE=primary_only
//! ```

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{
    alerts::{DEFAULT_RECOVERY_GRACE, EngineConfig},
    displays::{Display, MonitorPreference, Rect},
};

/// Root configuration structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Alert engine settings
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// Display topology used by the console binary
    #[serde(default = "default_displays")]
    pub displays: Vec<Display>,
}

/// Alert engine settings.
///
/// # YAML Section
///
/// ```yaml
/// alerts:
///   max_snooze_attempts: 3
///   default_snooze_secs: 300
///   monitor_preference: all_monitors
///   recovery_grace_secs: 5
///   clock_refresh_secs: 1
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub max_snooze_attempts: u32,
    pub default_snooze_secs: u64,
    pub monitor_preference: MonitorPreference,
    pub recovery_grace_secs: u64,
    pub clock_refresh_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        AlertsConfig {
            max_snooze_attempts: engine.max_snooze_attempts,
            default_snooze_secs: engine.default_snooze.as_secs(),
            monitor_preference: engine.monitor_preference,
            recovery_grace_secs: DEFAULT_RECOVERY_GRACE.as_secs(),
            clock_refresh_secs: engine.clock_refresh.as_secs(),
        }
    }
}

impl AlertsConfig {
    /// Builds the engine settings from this section.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_snooze_attempts: self.max_snooze_attempts,
            default_snooze: Duration::from_secs(self.default_snooze_secs),
            monitor_preference: self.monitor_preference,
            clock_refresh: Duration::from_secs(self.clock_refresh_secs),
        }
    }

    /// Grace period handed to the host monitor.
    pub fn recovery_grace(&self) -> Duration {
        Duration::from_secs(self.recovery_grace_secs)
    }
}

fn default_displays() -> Vec<Display> {
    vec![Display::new(1, Rect::new(0.0, 0.0, 1920.0, 1080.0), true)]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            alerts: AlertsConfig::default(),
            displays: default_displays(),
        }
    }
}

impl Config {
    /// Loads the configuration from defaults, a YAML file and the environment.
    ///
    /// Later sources override earlier ones. Displays without a name are named
    /// after their id.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not valid YAML or a value has the
    /// wrong type.
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("VIGIL_").split("__"))
            .extract()?;

        for display in config.displays.iter_mut() {
            if display.name.is_empty() {
                display.name = format!("display-{}", display.id);
            }
        }

        Ok(config)
    }
}
