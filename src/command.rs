//! Commands and types used throughout hyprscale.
//!
//! This module defines the vocabulary that all components share:
//! [`Direction`] describes what the user asked for on the command line,
//! and [`MonitorInfo`] is the snapshot of one monitor as reported by the
//! window manager.
//!
//! The binary accepts exactly one positional argument, `+` or `-`; see
//! [`parse_args`].

use std::fmt;
use std::str::FromStr;

/// Which way to step the scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Increase,
    Decrease,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => write!(f, "+"),
            Direction::Decrease => write!(f, "-"),
        }
    }
}

impl FromStr for Direction {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Direction::Increase),
            "-" => Ok(Direction::Decrease),
            _ => Err(UsageError(format!("unknown direction {:?}", s))),
        }
    }
}

/// The command line did not match `<prog> [+|-]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("usage error: {0}")]
pub struct UsageError(String);

/// Parse the process arguments (including `argv[0]`) into a [`Direction`].
///
/// Exactly one argument is accepted.
pub fn parse_args<I>(args: I) -> Result<Direction, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().skip(1);
    let first = args
        .next()
        .ok_or_else(|| UsageError("missing direction".into()))?;
    if args.next().is_some() {
        return Err(UsageError("too many arguments".into()));
    }
    first.parse()
}

/// Snapshot of a monitor known to the window manager.
///
/// Never cached: every query produces fresh values.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    /// Unique name the window manager uses for this monitor (e.g. `"eDP-1"`).
    pub name: String,
    /// Physical horizontal resolution in pixels.
    pub width: u32,
    /// Physical vertical resolution in pixels.
    pub height: u32,
    /// Currently active scale factor.
    pub scale: f64,
    /// Whether this monitor currently has focus.
    pub focused: bool,
}

/// Why no monitor could be selected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorSelectError {
    #[error("no active monitors found")]
    NoMonitors,
    #[error("monitor not found: {0}")]
    NotFound(String),
}

/// Pick the monitor to operate on.
///
/// With an explicit `target` the monitor with exactly that name is returned.
/// Otherwise the focused monitor wins, falling back to the first one in the
/// list.
pub fn select_monitor<'a>(
    monitors: &'a [MonitorInfo],
    target: Option<&str>,
) -> Result<&'a MonitorInfo, MonitorSelectError> {
    if monitors.is_empty() {
        return Err(MonitorSelectError::NoMonitors);
    }
    match target {
        Some(name) => monitors
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| MonitorSelectError::NotFound(name.to_string())),
        None => Ok(monitors
            .iter()
            .find(|m| m.focused)
            .unwrap_or(&monitors[0])),
    }
}
