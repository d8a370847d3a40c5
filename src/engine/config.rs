use std::path::Path;

use anyhow::Context;

use crate::{
    calibration::align::DEFAULT_CALIBRATION_MARGIN,
    estimate::pose::{BLEND_SMOOTHING, POSE_SMOOTHING},
    foundation::error::{SpromojiError, SpromojiResult},
    foundation::math::is_unit_interval,
    render::warp::{DepthPass, RenderSettings},
};

/// Environment override for the depth pass: `0` disables it, `1` enables it with defaults.
pub const DEPTH_PASS_ENV: &str = "SPROMOJI_DEPTH_PASS";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Engine tuning; every field has a default.
pub struct EngineConfig {
    /// Weight of a new blendshape sample.
    pub blend_smoothing: f64,
    /// Weight of a new yaw/pitch sample.
    pub pose_smoothing: f64,
    /// Weight of a new vertex target.
    pub position_smoothing: f64,
    /// Pixels per unit yaw/pitch added to every vertex.
    pub orientation_gain: f64,
    /// Texture-space determinant below which a triangle is skipped.
    pub degenerate_epsilon: f64,
    /// Parallax pass; off when absent.
    pub depth_pass: Option<DepthPass>,
    /// Straight-alpha background painted before each frame.
    pub clear_rgba: [u8; 4],
    /// Fall back to the fixed generic region layout when detection finds nothing.
    pub allow_generic_rig: bool,
    /// Calibration taps may lie this fraction of the target size outside it.
    pub calibration_margin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let render = RenderSettings::default();
        Self {
            blend_smoothing: BLEND_SMOOTHING,
            pose_smoothing: POSE_SMOOTHING,
            position_smoothing: render.position_smoothing,
            orientation_gain: render.orientation_gain,
            degenerate_epsilon: render.degenerate_epsilon,
            depth_pass: None,
            clear_rgba: [0, 0, 0, 0],
            allow_generic_rig: false,
            calibration_margin: DEFAULT_CALIBRATION_MARGIN,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file and validate it.
    pub fn from_path(path: &Path) -> SpromojiResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| SpromojiError::serde(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SpromojiResult<()> {
        for (name, v) in [
            ("blend_smoothing", self.blend_smoothing),
            ("pose_smoothing", self.pose_smoothing),
            ("position_smoothing", self.position_smoothing),
        ] {
            if !is_unit_interval(v) {
                return Err(SpromojiError::invalid_input(format!(
                    "{name} must be finite and in [0, 1]"
                )));
            }
        }
        if !self.orientation_gain.is_finite() {
            return Err(SpromojiError::invalid_input(
                "orientation_gain must be finite",
            ));
        }
        if !self.degenerate_epsilon.is_finite() || self.degenerate_epsilon <= 0.0 {
            return Err(SpromojiError::invalid_input(
                "degenerate_epsilon must be finite and > 0",
            ));
        }
        if !self.calibration_margin.is_finite() || self.calibration_margin < 0.0 {
            return Err(SpromojiError::invalid_input(
                "calibration_margin must be finite and >= 0",
            ));
        }
        if let Some(depth) = &self.depth_pass {
            if !depth.offset.is_finite() {
                return Err(SpromojiError::invalid_input(
                    "depth_pass offset must be finite",
                ));
            }
            if !depth.opacity.is_finite() || !(0.0..=1.0).contains(&depth.opacity) {
                return Err(SpromojiError::invalid_input(
                    "depth_pass opacity must be in [0, 1]",
                ));
            }
        }
        Ok(())
    }

    /// Apply [`DEPTH_PASS_ENV`] if it is set to `0` or `1`; other values are ignored.
    pub fn with_env_overrides(self) -> Self {
        let raw = std::env::var(DEPTH_PASS_ENV).ok();
        self.with_depth_toggle(raw.as_deref())
    }

    pub(crate) fn with_depth_toggle(mut self, raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("1") if self.depth_pass.is_none() => self.depth_pass = Some(DepthPass::default()),
            Some("0") => self.depth_pass = None,
            _ => {}
        }
        self
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            position_smoothing: self.position_smoothing,
            orientation_gain: self.orientation_gain,
            degenerate_epsilon: self.degenerate_epsilon,
            depth_pass: self.depth_pass,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/config.rs"]
mod tests;
