//! Desktop notifications via `notify-send`.
//!
//! Every notification carries the same
//! `x-canonical-private-synchronous` hint so that pressing the scale key
//! repeatedly replaces the previous bubble instead of stacking new ones.

use crate::traits::Notifier;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::{Command, Stdio};

/// Notification urgency as understood by `notify-send -u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Normal => write!(f, "normal"),
        }
    }
}

/// A single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, urgency: Urgency) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            urgency,
        }
    }
}

/// Notification settings.
///
/// ```json
/// { "enabled": true, "tag": "hypr_scale_adjust", "timeout_ms": 2000 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Set to `false` to silence all notifications.
    pub enabled: bool,
    /// Synchronous tag shared by all notifications from this tool.
    pub tag: String,
    /// Expiry passed to `notify-send -t`.
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tag: "hypr_scale_adjust".into(),
            timeout_ms: 2000,
        }
    }
}

/// Errors from spawning `notify-send`.
#[derive(Debug, thiserror::Error)]
#[error("notify-send error: {0}")]
pub struct NotifyError(String);

/// [`Notifier`] that shells out to `notify-send`.
pub struct NotifySend {
    config: NotifyConfig,
}

impl NotifySend {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }

    /// The argument list passed to `notify-send`.
    fn args(&self, notification: &Notification) -> Vec<String> {
        vec![
            "-h".into(),
            format!("string:x-canonical-private-synchronous:{}", self.config.tag),
            "-u".into(),
            notification.urgency.to_string(),
            "-t".into(),
            self.config.timeout_ms.to_string(),
            notification.title.clone(),
            notification.body.clone(),
        ]
    }
}

impl Notifier for NotifySend {
    type Error = NotifyError;

    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if !self.config.enabled {
            debug!("notifications disabled, skipping {:?}", notification.title);
            return Ok(());
        }
        let status = Command::new("notify-send")
            .args(self.args(notification))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| NotifyError(format!("spawn: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError(format!("exited with {}", status)))
        }
    }
}
