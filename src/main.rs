//! Entry point for the **hyprscale** command.
//!
//! ```text
//! hyprscale +    # next larger scale on the focused monitor
//! hyprscale -    # next smaller scale
//! HYPRSCALE_MONITOR=DP-1 hyprscale +
//! ```
//!
//! Exits 0 on success (including "limit reached"), 2 on bad usage and 1 on
//! any other failure.

use hyprscale::adjuster::{Outcome, ScaleAdjuster};
use hyprscale::command::parse_args;
use hyprscale::conf::ConfPatcher;
use hyprscale::config::{flag_enabled, Config, DEBUG_ENV, MONITOR_ENV};
use hyprscale::hyprland::wm::HyprlandWm;
use hyprscale::notify::NotifySend;
use log::{debug, info};
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/hyprscale`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("hyprscale")
}

/// Try to load the config from `$XDG_CONFIG_HOME/hyprscale/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// `RUST_LOG` as usual (default `warn`); `HYPRSCALE_DEBUG` forces `debug`.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if flag_enabled(std::env::var(DEBUG_ENV).ok().as_deref()) {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "hyprscale".into());
    let direction = match parse_args(args) {
        Ok(d) => d,
        Err(e) => {
            debug!("{}", e);
            eprintln!("Usage: {} [+|-]", program);
            std::process::exit(2);
        }
    };

    let config = load_config();
    let target = std::env::var(MONITOR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let patcher = ConfPatcher::new(config.monitors_conf_path(&home_dir()));
    debug!("editing {}", patcher.path().display());

    let adjuster = ScaleAdjuster::new(HyprlandWm::new(), NotifySend::new(config.notify), patcher)
        .with_scale_config(config.scale)
        .with_verify_config(config.verify)
        .with_target(target);

    match adjuster.run(direction) {
        Ok(Outcome::LimitReached { monitor, scale }) => {
            info!("{} is already at the limit ({})", monitor, scale);
        }
        Ok(Outcome::Applied { monitor, scale }) => {
            info!("{} now at scale {}", monitor, scale);
        }
        Ok(Outcome::Adjusted {
            monitor,
            requested,
            actual,
        }) => {
            info!("{}: requested {}, applied {}", monitor, requested, actual);
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}
