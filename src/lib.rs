//! **hyprscale** — step a Hyprland monitor's scale factor up or down.
//!
//! One invocation picks the next "clean" scale (one that divides the
//! panel's physical resolution into whole logical pixels), writes it to
//! `monitors.conf`, reloads Hyprland, and checks that Hyprland actually
//! applied it.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowManager`] — abstracts monitor queries and config
//!   reloads so the adjustment logic is not coupled to any specific
//!   compositor.
//! * [`traits::Notifier`] — abstracts user feedback so the adjustment logic
//!   does not depend on a notification daemon being present.
//!
//! [`adjuster::ScaleAdjuster`] drives a run.  The pure step search lives in
//! [`scale`], the config file model and atomic writer in [`conf`].
//! Concrete implementations live in [`hyprland`] (Hyprland IPC) and
//! [`notify`] (`notify-send`).

pub mod adjuster;
pub mod command;
pub mod conf;
pub mod config;
pub mod hyprland;
pub mod notify;
pub mod scale;
pub mod traits;
