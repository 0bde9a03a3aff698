//! Application configuration.
//!
//! The configuration is loaded from an optional JSON file at
//! `$XDG_CONFIG_HOME/hyprscale/config.json`.  Every section is optional and
//! falls back to compiled-in defaults, so a missing file behaves exactly
//! like `{}`.
//!
//! # Example
//!
//! ```json
//! {
//!   "monitors_conf": "~/.config/hypr/edit_here/source/monitors.conf",
//!   "scale": {
//!     "min_logical_width": 640,
//!     "min_logical_height": 360,
//!     "integral_tolerance": 0.01
//!   },
//!   "verify": { "poll_interval_ms": 100, "poll_attempts": 25 },
//!   "notify": { "timeout_ms": 2000 }
//! }
//! ```
//!
//! Two environment variables complement the file: [`MONITOR_ENV`] picks a
//! monitor by name and [`DEBUG_ENV`] turns on debug logging.

use crate::notify::NotifyConfig;
use crate::scale::ScaleConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Selects a monitor by name instead of the focused one.
pub const MONITOR_ENV: &str = "HYPRSCALE_MONITOR";

/// Enables debug logging when set to anything but an "off" value.
pub const DEBUG_ENV: &str = "HYPRSCALE_DEBUG";

/// Location of `monitors.conf` relative to `$HOME`.
const DEFAULT_MONITORS_CONF: &str = ".config/hypr/edit_here/source/monitors.conf";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path of the Hyprland file holding the monitor rules.  A leading
    /// `~/` is expanded to `$HOME`.
    #[serde(default)]
    pub monitors_conf: Option<String>,

    /// Scale step filtering.
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Post-reload polling.
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Desktop notifications.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// How long to wait for Hyprland to apply a reload, and how strictly to
/// compare the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Delay before each poll (ms).
    pub poll_interval_ms: u64,
    /// Maximum number of polls.
    pub poll_attempts: u32,
    /// Observed and requested scales closer than this are equal.  Hyprland
    /// stores scales as `f32`, so exact comparison is too strict.
    pub match_tolerance: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            poll_attempts: 25,
            match_tolerance: 0.001,
        }
    }
}

impl VerifyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// The `monitors.conf` to edit, with `~/` expanded against `home`.
    pub fn monitors_conf_path(&self, home: &Path) -> PathBuf {
        match self.monitors_conf.as_deref() {
            Some(p) => match p.strip_prefix("~/") {
                Some(rest) => home.join(rest),
                None => PathBuf::from(p),
            },
            None => home.join(DEFAULT_MONITORS_CONF),
        }
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

/// Interpret a flag-style environment value.
///
/// Unset, empty, `0`, `false`, `no` and `off` are false; anything else is
/// true.
pub fn flag_enabled(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => false,
        Some(v) => !matches!(v.as_str(), "" | "0" | "false" | "no" | "off"),
    }
}
