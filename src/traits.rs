//! Core traits that decouple hyprscale from any specific window manager or
//! notification daemon.
//!
//! The [`ScaleAdjuster`](crate::adjuster::ScaleAdjuster) only depends on
//! these abstractions; Hyprland and `notify-send` are plugged in by the
//! binary, mocks by the tests.

use crate::command::MonitorInfo;
use crate::notify::Notification;

/// Abstraction over a window manager that can report its monitors and
/// reload its configuration.
///
/// An implementation might talk to Hyprland via IPC, or it might be a
/// scripted stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Return the list of monitors the window manager knows about, with
    /// their current physical size and scale.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// Ask the window manager to re-read its configuration files.
    ///
    /// The reload is asynchronous: a successful return does not mean the
    /// new settings are already in effect.
    fn reload(&self) -> Result<(), Self::Error>;
}

/// Sink for user-facing notifications.
///
/// Delivery is best effort.  Callers log errors and carry on.
pub trait Notifier {
    /// The error type produced by this notifier.
    type Error: std::error::Error + Send + 'static;

    /// Show `notification` to the user.
    fn notify(&self, notification: &Notification) -> Result<(), Self::Error>;
}
