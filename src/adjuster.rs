//! The orchestrator that ties monitor query, step resolution, config
//! patching and reload verification together.
//!
//! Hyprland has no transactional interface for scale changes, so
//! [`ScaleAdjuster::run`] works optimistically:
//!
//! 1. **propose**: pick the next admissible scale for the selected monitor;
//! 2. **commit**: write it to `monitors.conf` and ask Hyprland to reload;
//! 3. **observe**: poll the monitor until its scale changes or the polling
//!    budget runs out;
//! 4. **reconcile**: if Hyprland applied something else (it clamps scales
//!    it does not like), write what it actually applied.

use crate::command::{select_monitor, Direction, MonitorInfo, MonitorSelectError};
use crate::conf::{ConfPatcher, PatchError};
use crate::config::VerifyConfig;
use crate::notify::{Notification, Urgency};
use crate::scale::{format_scale, logical_size, next_scale, ScaleConfig, STEP_EPSILON};
use crate::traits::{Notifier, WindowManager};
use log::{debug, info, warn};

/// Possible errors from an adjustment run.  All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum AdjustError {
    /// The window manager could not be queried.
    #[error("window manager error: {0}")]
    WindowManager(String),
    #[error(transparent)]
    Select(#[from] MonitorSelectError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Already at the end of the admissible range; nothing was written.
    LimitReached { monitor: String, scale: f64 },
    /// The requested scale is in effect.
    Applied { monitor: String, scale: f64 },
    /// Hyprland applied a different scale; the file was rewritten to match.
    Adjusted {
        monitor: String,
        requested: f64,
        actual: f64,
    },
}

/// Steps one monitor's scale.
///
/// Generic over any [`WindowManager`] and [`Notifier`], making it
/// independent of Hyprland and the notification daemon.
///
/// ```ignore
/// let adjuster = ScaleAdjuster::new(HyprlandWm::new(), NotifySend::new(cfg), ConfPatcher::new(path));
/// adjuster.run(Direction::Increase)?;
/// ```
pub struct ScaleAdjuster<W: WindowManager, N: Notifier> {
    wm: W,
    notifier: N,
    patcher: ConfPatcher,
    scale_config: ScaleConfig,
    verify: VerifyConfig,
    target: Option<String>,
}

impl<W: WindowManager, N: Notifier> ScaleAdjuster<W, N> {
    /// Create an adjuster with default scale and verification settings,
    /// operating on the focused monitor.
    pub fn new(wm: W, notifier: N, patcher: ConfPatcher) -> Self {
        Self {
            wm,
            notifier,
            patcher,
            scale_config: ScaleConfig::default(),
            verify: VerifyConfig::default(),
            target: None,
        }
    }

    pub fn with_scale_config(mut self, config: ScaleConfig) -> Self {
        self.scale_config = config;
        self
    }

    pub fn with_verify_config(mut self, config: VerifyConfig) -> Self {
        self.verify = config;
        self
    }

    /// Operate on the monitor called `name` instead of the focused one.
    pub fn with_target(mut self, name: Option<String>) -> Self {
        self.target = name;
        self
    }

    /// Perform one adjustment in `direction`.
    pub fn run(&self, direction: Direction) -> Result<Outcome, AdjustError> {
        //  propose
        let monitors = self.query()?;
        let monitor = select_monitor(&monitors, self.target.as_deref())?;
        let name = monitor.name.clone();
        let before = monitor.scale;
        debug!(
            "selected {} ({}x{} @ {})",
            name, monitor.width, monitor.height, before
        );

        let requested = match next_scale(
            before,
            direction,
            monitor.width,
            monitor.height,
            &self.scale_config,
        ) {
            Some(s) => s,
            None => {
                info!("{}: no further step {} from {}", name, direction, before);
                self.send(Notification::new(
                    "Monitor Scale",
                    format!("Limit Reached: {}", format_scale(before)),
                    Urgency::Normal,
                ));
                return Ok(Outcome::LimitReached {
                    monitor: name,
                    scale: before,
                });
            }
        };
        info!("{}: {} -> {}", name, before, requested);

        //  commit
        self.patcher.apply_scale(&name, requested)?;
        if let Err(e) = self.wm.reload() {
            warn!("reload failed (config already saved): {}", e);
        }

        //  observe
        let actual = self.observe(&name, before).unwrap_or(requested);

        //  reconcile
        let (w, h) = (monitor.width, monitor.height);
        if (actual - requested).abs() > self.verify.match_tolerance {
            warn!(
                "{}: requested {} but window manager applied {}",
                name, requested, actual
            );
            self.patcher.apply_scale(&name, actual)?;
            let (lw, lh) = logical_size(w, h, actual);
            self.send(Notification::new(
                format!("Display Scale Adjusted: {}", format_scale(actual)),
                format!(
                    "Monitor: {}\nRequested {}, Hyprland applied {}\nLogical: {}x{}",
                    name,
                    format_scale(requested),
                    format_scale(actual),
                    lw,
                    lh
                ),
                Urgency::Normal,
            ));
            return Ok(Outcome::Adjusted {
                monitor: name,
                requested,
                actual,
            });
        }

        let (lw, lh) = logical_size(w, h, requested);
        self.send(Notification::new(
            format!("Display Scale: {}", format_scale(requested)),
            format!("Monitor: {}\nLogical: {}x{}", name, lw, lh),
            Urgency::Low,
        ));
        Ok(Outcome::Applied {
            monitor: name,
            scale: requested,
        })
    }

    fn query(&self) -> Result<Vec<MonitorInfo>, AdjustError> {
        self.wm
            .monitors()
            .map_err(|e| AdjustError::WindowManager(e.to_string()))
    }

    /// Poll `name` until its scale moves away from `before`.
    ///
    /// Returns the last scale seen, or `None` if every poll failed.
    fn observe(&self, name: &str, before: f64) -> Option<f64> {
        let mut last = None;
        for attempt in 1..=self.verify.poll_attempts {
            std::thread::sleep(self.verify.poll_interval());
            let monitors = match self.wm.monitors() {
                Ok(m) => m,
                Err(e) => {
                    debug!("poll {}: {}", attempt, e);
                    continue;
                }
            };
            let Some(current) = monitors.iter().find(|m| m.name == name) else {
                debug!("poll {}: {} not reported", attempt, name);
                continue;
            };
            last = Some(current.scale);
            if (current.scale - before).abs() > STEP_EPSILON {
                debug!("poll {}: scale is now {}", attempt, current.scale);
                return last;
            }
        }
        debug!("scale of {} did not change after {} polls", name, self.verify.poll_attempts);
        last
    }

    fn send(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification) {
            warn!("notification failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Scripted window manager.
    ///
    /// Reports `monitors`.  After a `reload` the target monitor switches to
    /// `after_reload` (if set) once `settle_polls` polls have gone by,
    /// modelling Hyprland applying or clamping the new config.
    #[derive(Debug, Default)]
    struct ScriptedWm {
        monitors: RefCell<Vec<MonitorInfo>>,
        after_reload: Option<(String, f64)>,
        settle_polls: u32,
        reloads: Cell<u32>,
        queries: Cell<u32>,
        fail_reload: bool,
        fail_queries: bool,
        /// Only the first query succeeds.
        fail_polls: bool,
        /// Monitor left out of every answer after a reload.
        vanish_on_reload: Option<String>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("scripted error")]
    struct ScriptedErr;

    impl WindowManager for ScriptedWm {
        type Error = ScriptedErr;

        fn monitors(&self) -> Result<Vec<MonitorInfo>, ScriptedErr> {
            let n = self.queries.get() + 1;
            self.queries.set(n);
            if self.fail_queries || (self.fail_polls && n > 1) {
                return Err(ScriptedErr);
            }
            let mut monitors = self.monitors.borrow().clone();
            if self.reloads.get() > 0 {
                let poll = n - 1;
                if let Some((name, scale)) = &self.after_reload {
                    if poll > self.settle_polls {
                        for m in monitors.iter_mut().filter(|m| &m.name == name) {
                            m.scale = *scale;
                        }
                    }
                }
                if let Some(name) = &self.vanish_on_reload {
                    monitors.retain(|m| &m.name != name);
                }
            }
            Ok(monitors)
        }

        fn reload(&self) -> Result<(), ScriptedErr> {
            self.reloads.set(self.reloads.get() + 1);
            if self.fail_reload {
                Err(ScriptedErr)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Debug, Default)]
    struct RecorderNotifier {
        sent: RefCell<Vec<Notification>>,
    }

    impl Notifier for RecorderNotifier {
        type Error = ScriptedErr;

        fn notify(&self, notification: &Notification) -> Result<(), ScriptedErr> {
            self.sent.borrow_mut().push(notification.clone());
            Ok(())
        }
    }

    /// Notifier whose daemon is never there.
    struct AbsentNotifier;

    impl Notifier for AbsentNotifier {
        type Error = ScriptedErr;

        fn notify(&self, _: &Notification) -> Result<(), ScriptedErr> {
            Err(ScriptedErr)
        }
    }

    fn monitor(name: &str, w: u32, h: u32, scale: f64, focused: bool) -> MonitorInfo {
        MonitorInfo {
            name: name.into(),
            width: w,
            height: h,
            scale,
            focused,
        }
    }

    fn fast_verify() -> VerifyConfig {
        VerifyConfig {
            poll_interval_ms: 0,
            poll_attempts: 3,
            ..VerifyConfig::default()
        }
    }

    fn laptop_wm(after_reload: Option<f64>) -> ScriptedWm {
        ScriptedWm {
            monitors: RefCell::new(vec![
                monitor("DP-1", 2560, 1440, 1.0, false),
                monitor("eDP-1", 1920, 1080, 1.25, true),
            ]),
            after_reload: after_reload.map(|s| ("eDP-1".to_string(), s)),
            ..ScriptedWm::default()
        }
    }

    fn conf_with(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitors.conf");
        fs::write(&path, text).unwrap();
        (dir, path)
    }

    fn adjuster<W: WindowManager, N: Notifier>(
        wm: W,
        notifier: N,
        path: &Path,
    ) -> ScaleAdjuster<W, N> {
        ScaleAdjuster::new(wm, notifier, ConfPatcher::new(path)).with_verify_config(fast_verify())
    }

    const LAPTOP_CONF: &str = "monitor = DP-1, 2560x1440, 1920x0, 1\nmonitor = eDP-1, 1920x1080, 0x0, 1.25\n";

    #[test]
    fn increase_applies_next_integral_scale() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(Some(1.5)), RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert_eq!(
            outcome,
            Outcome::Applied {
                monitor: "eDP-1".into(),
                scale: 1.5
            }
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "monitor = DP-1, 2560x1440, 1920x0, 1\nmonitor = eDP-1, 1920x1080, 0x0, 1.5\n"
        );
        assert_eq!(adj.wm.reloads.get(), 1);
        let sent = adj.notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Display Scale: 1.5");
        assert_eq!(sent[0].body, "Monitor: eDP-1\nLogical: 1280x720");
        assert_eq!(sent[0].urgency, Urgency::Low);
    }

    #[test]
    fn decrease_applies_previous_scale() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(Some(1.2)), RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Decrease).unwrap();

        assert!(matches!(outcome, Outcome::Applied { scale, .. } if scale == 1.2));
        assert!(fs::read_to_string(&path)
            .unwrap()
            .ends_with("monitor = eDP-1, 1920x1080, 0x0, 1.2\n"));
    }

    #[test]
    fn clamped_scale_is_written_back_and_reported() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(Some(1.0)), RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert_eq!(
            outcome,
            Outcome::Adjusted {
                monitor: "eDP-1".into(),
                requested: 1.5,
                actual: 1.0
            }
        );
        assert!(fs::read_to_string(&path)
            .unwrap()
            .ends_with("monitor = eDP-1, 1920x1080, 0x0, 1\n"));
        let sent = adj.notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Display Scale Adjusted: 1");
        assert!(sent[0].body.contains("Requested 1.5, Hyprland applied 1"));
        assert!(sent[0].body.ends_with("Logical: 1920x1080"));
    }

    #[test]
    fn unchanged_scale_after_budget_is_authoritative() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(None), RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert_eq!(
            outcome,
            Outcome::Adjusted {
                monitor: "eDP-1".into(),
                requested: 1.5,
                actual: 1.25
            }
        );
        // 1 selection query + every poll.
        assert_eq!(adj.wm.queries.get(), 1 + fast_verify().poll_attempts);
        assert_eq!(fs::read_to_string(&path).unwrap(), LAPTOP_CONF);
    }

    #[test]
    fn failed_polls_assume_requested_scale() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let mut wm = laptop_wm(None);
        wm.fail_polls = true;
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert_eq!(
            outcome,
            Outcome::Applied {
                monitor: "eDP-1".into(),
                scale: 1.5
            }
        );
        assert_eq!(adj.wm.queries.get(), 1 + fast_verify().poll_attempts);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "monitor = DP-1, 2560x1440, 1920x0, 1\nmonitor = eDP-1, 1920x1080, 0x0, 1.5\n"
        );
        let sent = adj.notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Display Scale: 1.5");
    }

    #[test]
    fn monitor_missing_from_polls_is_skipped() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let mut wm = laptop_wm(None);
        wm.vanish_on_reload = Some("eDP-1".into());
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert!(matches!(outcome, Outcome::Applied { scale, .. } if scale == 1.5));
        assert_eq!(adj.wm.queries.get(), 1 + fast_verify().poll_attempts);
        assert!(fs::read_to_string(&path)
            .unwrap()
            .ends_with("monitor = eDP-1, 1920x1080, 0x0, 1.5\n"));
    }

    #[test]
    fn polling_stops_once_scale_changes() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let mut wm = laptop_wm(Some(1.5));
        wm.settle_polls = 1;
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert!(matches!(outcome, Outcome::Applied { scale, .. } if scale == 1.5));
        // Selection query, one stale poll, one fresh poll.
        assert_eq!(adj.wm.queries.get(), 3);
    }

    #[test]
    fn float_noise_from_window_manager_is_not_a_clamp() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(
            laptop_wm(Some(1.600000023841858)),
            RecorderNotifier::default(),
            &path,
        );
        // 1.5 -> 1.6 on 1080p.
        adj.wm.monitors.borrow_mut()[1].scale = 1.5;

        let outcome = adj.run(Direction::Increase).unwrap();

        assert!(matches!(outcome, Outcome::Applied { scale, .. } if scale == 1.6));
    }

    #[test]
    fn limit_reached_is_a_notified_no_op() {
        let (_dir, path) = conf_with("monitor = eDP-1, 1920x1080, 0x0, 3\n");
        let wm = ScriptedWm {
            monitors: RefCell::new(vec![monitor("eDP-1", 1920, 1080, 3.0, true)]),
            ..ScriptedWm::default()
        };
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert_eq!(
            outcome,
            Outcome::LimitReached {
                monitor: "eDP-1".into(),
                scale: 3.0
            }
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "monitor = eDP-1, 1920x1080, 0x0, 3\n"
        );
        assert_eq!(adj.wm.reloads.get(), 0);
        let sent = adj.notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Monitor Scale");
        assert_eq!(sent[0].body, "Limit Reached: 3");
        assert_eq!(sent[0].urgency, Urgency::Normal);
    }

    #[test]
    fn limit_reached_does_not_create_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitors.conf");
        let wm = ScriptedWm {
            monitors: RefCell::new(vec![monitor("eDP-1", 1920, 1080, 0.5, true)]),
            ..ScriptedWm::default()
        };
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        adj.run(Direction::Decrease).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn target_override_selects_unfocused_monitor() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let mut wm = laptop_wm(None);
        wm.after_reload = Some(("DP-1".into(), 1.25));
        let adj = adjuster(wm, RecorderNotifier::default(), &path).with_target(Some("DP-1".into()));

        let outcome = adj.run(Direction::Increase).unwrap();

        // 2560x1440: 1.0 -> 1.25 (2048x1152).
        assert_eq!(
            outcome,
            Outcome::Applied {
                monitor: "DP-1".into(),
                scale: 1.25
            }
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "monitor = DP-1, 2560x1440, 1920x0, 1.25\nmonitor = eDP-1, 1920x1080, 0x0, 1.25\n"
        );
    }

    #[test]
    fn unknown_target_is_fatal_and_names_the_monitor() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(None), RecorderNotifier::default(), &path)
            .with_target(Some("HDMI-A-9".into()));

        let err = adj.run(Direction::Increase).unwrap_err();

        assert!(matches!(
            err,
            AdjustError::Select(MonitorSelectError::NotFound(ref n)) if n == "HDMI-A-9"
        ));
        assert!(err.to_string().contains("HDMI-A-9"));
        assert_eq!(fs::read_to_string(&path).unwrap(), LAPTOP_CONF);
    }

    #[test]
    fn no_monitors_is_fatal() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(ScriptedWm::default(), RecorderNotifier::default(), &path);

        let err = adj.run(Direction::Increase).unwrap_err();

        assert!(matches!(err, AdjustError::Select(MonitorSelectError::NoMonitors)));
    }

    #[test]
    fn unreachable_window_manager_is_fatal() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let wm = ScriptedWm {
            fail_queries: true,
            ..ScriptedWm::default()
        };
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        assert!(matches!(
            adj.run(Direction::Increase),
            Err(AdjustError::WindowManager(_))
        ));
        assert!(adj.notifier.sent.borrow().is_empty());
    }

    #[test]
    fn failed_reload_still_verifies() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let mut wm = laptop_wm(Some(1.5));
        wm.fail_reload = true;
        let adj = adjuster(wm, RecorderNotifier::default(), &path);

        let outcome = adj.run(Direction::Increase).unwrap();

        assert!(matches!(outcome, Outcome::Applied { .. }));
        assert!(adj.wm.queries.get() >= 2);
    }

    #[test]
    fn missing_notification_daemon_is_not_fatal() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(Some(1.5)), AbsentNotifier, &path);

        assert!(adj.run(Direction::Increase).is_ok());
    }

    #[test]
    fn new_monitor_gets_appended_entry() {
        let (_dir, path) = conf_with("# nothing here yet\n");
        let adj = adjuster(laptop_wm(Some(1.5)), RecorderNotifier::default(), &path);

        adj.run(Direction::Increase).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# nothing here yet\nmonitor = eDP-1, preferred, auto, 1.5\n"
        );
    }

    #[test]
    fn custom_scale_config_is_honoured() {
        let (_dir, path) = conf_with(LAPTOP_CONF);
        let adj = adjuster(laptop_wm(Some(2.0)), RecorderNotifier::default(), &path)
            .with_scale_config(ScaleConfig {
                steps: vec![1.0, 2.0],
                ..ScaleConfig::default()
            });

        let outcome = adj.run(Direction::Increase).unwrap();

        assert!(matches!(outcome, Outcome::Applied { scale, .. } if scale == 2.0));
    }
}
