//! [`WindowManager`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`,
//! the same socket `hyprctl` uses, without spawning `hyprctl` itself.

use crate::command::MonitorInfo;
use crate::traits::WindowManager;
use log::debug;
use serde::Deserialize;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed window manager.
///
/// All communication happens over Hyprland's IPC socket
/// (`$XDG_RUNTIME_DIR/hypr/<instance>/.socket.sock`).  No child processes
/// are spawned.
pub struct HyprlandWm;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandWmError(String);

impl Default for HyprlandWm {
    fn default() -> Self {
        Self
    }
}

impl HyprlandWm {
    /// Create a new handle.
    ///
    /// No connection is opened eagerly; each method call opens a short-lived
    /// IPC request.
    pub fn new() -> Self {
        Self
    }
}

//  Direct Hyprland IPC helpers

/// Resolve the Hyprland command socket path.
///
/// Hyprland ≥ 0.40 stores its sockets at
/// `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
fn socket_path() -> Result<PathBuf, HyprlandWmError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandWmError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandWmError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!(
        "{}/hypr/{}/.socket.sock",
        runtime_dir, his
    )))
}

/// Send a raw command to the Hyprland command socket and return the
/// response as a string.
fn ipc_request(command: &str) -> Result<String, HyprlandWmError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandWmError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandWmError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandWmError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandWmError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and return the raw JSON string.
fn ipc_json(data_command: &str) -> Result<String, HyprlandWmError> {
    ipc_request(&format!("j/{}", data_command))
}

/// Send a plain keyword command (`/<command>`) and check for `"ok"`.
fn ipc_command(command: &str) -> Result<(), HyprlandWmError> {
    let response = ipc_request(&format!("/{}", command))?;
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandWmError(format!("{} error: {}", command, response.trim())))
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of the JSON object returned by `j/monitors`.
///
/// `width`/`height` are the physical pixels of the current mode.
#[derive(Deserialize)]
struct MonitorJson {
    name: String,
    width: u32,
    height: u32,
    scale: f64,
    #[serde(default)]
    focused: bool,
}

/// Parse the response of `j/monitors`.
fn parse_monitors(json: &str) -> Result<Vec<MonitorInfo>, HyprlandWmError> {
    let monitors: Vec<MonitorJson> =
        serde_json::from_str(json).map_err(|e| HyprlandWmError(format!("parse: {}", e)))?;
    monitors
        .into_iter()
        .map(|m| {
            if !(m.scale.is_finite() && m.scale > 0.0) {
                return Err(HyprlandWmError(format!(
                    "monitor {} reports invalid scale {}",
                    m.name, m.scale
                )));
            }
            Ok(MonitorInfo {
                name: m.name,
                width: m.width,
                height: m.height,
                scale: m.scale,
                focused: m.focused,
            })
        })
        .collect()
}

//  WindowManager implementation

impl WindowManager for HyprlandWm {
    type Error = HyprlandWmError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error> {
        let json = ipc_json("monitors")?;
        let monitors = parse_monitors(&json)?;
        debug!("hyprland reports {} monitor(s)", monitors.len());
        Ok(monitors)
    }

    fn reload(&self) -> Result<(), Self::Error> {
        ipc_command("reload")
    }
}
