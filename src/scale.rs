//! Scale step resolution.
//!
//! Hyprland accepts arbitrary fractional scales, but a scale that does not
//! divide the panel's physical resolution cleanly leaves fractional logical
//! pixels (blurry edges, off-by-one layouts).  [`next_scale`] therefore walks
//! a fixed list of common Wayland scale steps and skips every step that would
//! produce a fractional or too-small logical resolution.
//!
//! Everything in this module is pure.

use crate::command::Direction;
use serde::{Deserialize, Serialize};

/// Common fractional and integer scaling steps, strictly increasing.
pub const SCALE_STEPS: &[f64] = &[
    0.5, 0.6, 0.75, 0.8, 0.9, 1.0, 1.0625, 1.1, 1.125, 1.15, 1.2, 1.25, 1.33, 1.4, 1.5, 1.6,
    1.67, 1.75, 1.8, 1.88, 2.0, 2.25, 2.4, 2.5, 2.67, 2.8, 3.0,
];

/// Two scales closer than this are considered the same step.
pub const STEP_EPSILON: f64 = 1e-6;

/// Used when no step survives filtering.
pub const FALLBACK_SCALE: f64 = 1.0;

/// Tunables for the admissibility filter.
///
/// # Example
///
/// ```json
/// {
///   "min_logical_width": 640,
///   "min_logical_height": 360,
///   "integral_tolerance": 0.01
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Smallest acceptable logical width in pixels.
    pub min_logical_width: u32,
    /// Smallest acceptable logical height in pixels.
    pub min_logical_height: u32,
    /// How far a logical dimension may be from an integer and still count
    /// as integral.
    pub integral_tolerance: f64,
    /// Candidate scales.  Sorted and deduplicated before use.
    pub steps: Vec<f64>,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            min_logical_width: 640,
            min_logical_height: 360,
            integral_tolerance: 0.01,
            steps: SCALE_STEPS.to_vec(),
        }
    }
}

/// Whether `scale` yields a large enough, integral logical resolution for a
/// `width × height` panel.
pub fn is_admissible(scale: f64, width: u32, height: u32, config: &ScaleConfig) -> bool {
    if !(scale.is_finite() && scale > 0.0) {
        return false;
    }
    let lw = width as f64 / scale;
    let lh = height as f64 / scale;

    if lw < config.min_logical_width as f64 || lh < config.min_logical_height as f64 {
        return false;
    }

    (lw - lw.round()).abs() <= config.integral_tolerance
        && (lh - lh.round()).abs() <= config.integral_tolerance
}

/// All admissible steps for a `width × height` panel, in increasing order.
///
/// Never empty: falls back to `[1.0]`.
pub fn admissible_scales(width: u32, height: u32, config: &ScaleConfig) -> Vec<f64> {
    let mut steps: Vec<f64> = config
        .steps
        .iter()
        .copied()
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    steps.sort_by(|a, b| a.total_cmp(b));
    steps.dedup_by(|a, b| (*a - *b).abs() < STEP_EPSILON);

    let valid: Vec<f64> = steps
        .into_iter()
        .filter(|&s| is_admissible(s, width, height, config))
        .collect();

    if valid.is_empty() {
        vec![FALLBACK_SCALE]
    } else {
        valid
    }
}

/// The next admissible scale from `current` in `direction`.
///
/// Returns `None` when `current` is already at (or beyond) the end of the
/// admissible range.  That is a limit, not an error.
pub fn next_scale(
    current: f64,
    direction: Direction,
    width: u32,
    height: u32,
    config: &ScaleConfig,
) -> Option<f64> {
    let valid = admissible_scales(width, height, config);
    match direction {
        Direction::Increase => valid.into_iter().find(|&s| s > current + STEP_EPSILON),
        Direction::Decrease => valid.into_iter().rev().find(|&s| s < current - STEP_EPSILON),
    }
}

/// Logical resolution at `scale`, truncated to whole pixels.
pub fn logical_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    (
        (width as f64 / scale) as u32,
        (height as f64 / scale) as u32,
    )
}

/// Render a scale the way it is written to `monitors.conf`.
///
/// At most five fractional digits, no trailing zeros: `1.0` → `"1"`,
/// `1.25` → `"1.25"`, `1.3333333730697632` → `"1.33333"`.
pub fn format_scale(scale: f64) -> String {
    let rounded = (scale * 100_000.0).round() / 100_000.0;
    format!("{}", rounded)
}
