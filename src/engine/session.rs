use crate::{
    assets::decode::AvatarImage,
    calibration::align::CalibrationTransform,
    engine::acquire::{RigAcquisition, RigOrigin, acquire_rig},
    engine::config::EngineConfig,
    estimate::pose::{OrientState, PoseBlendEstimator, TrackingFrame},
    foundation::error::SpromojiResult,
    render::surface::RenderSurface,
    render::warp::{MeshWarpRenderer, RenderStats},
    rig::blendshape::BlendState,
    rig::model::Rig,
};

/// One animated avatar: its rig, smoothing state, and renderer.
///
/// A single caller drives an engine: `update` once per tracking sample, `render` once per
/// frame. Nothing here is shared; hosts with several threads must serialize access.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    avatar: AvatarImage,
    rig: Rig,
    origin: RigOrigin,
    calibration: Option<CalibrationTransform>,
    estimator: PoseBlendEstimator,
    renderer: MeshWarpRenderer,
    frames_rendered: u64,
}

impl Engine {
    /// Validate `config` and acquire a rig for `avatar`.
    ///
    /// Fails with an initialization error when no acquisition path yields a rig; no
    /// per-frame call is possible until this succeeds.
    #[tracing::instrument(skip_all)]
    pub fn init(
        config: EngineConfig,
        avatar: AvatarImage,
        acquisition: RigAcquisition<'_>,
    ) -> SpromojiResult<Self> {
        config.validate()?;
        let acquired = acquire_rig(acquisition, &avatar, &config)?;
        Ok(Self {
            estimator: PoseBlendEstimator::new(config.blend_smoothing, config.pose_smoothing),
            renderer: MeshWarpRenderer::new(config.render_settings()),
            config,
            avatar,
            rig: acquired.rig,
            origin: acquired.origin,
            calibration: acquired.calibration,
            frames_rendered: 0,
        })
    }

    /// Fold one tracking sample into the smoothed blend and pose state.
    pub fn update(&mut self, frame: &TrackingFrame) {
        self.estimator.update(frame);
    }

    /// Move the mesh toward the current state and draw one frame.
    pub fn render(&mut self, surface: &mut dyn RenderSurface) -> SpromojiResult<RenderStats> {
        let stats = self.renderer.render_frame(
            &mut self.rig,
            self.estimator.blend(),
            self.estimator.orient(),
            &self.avatar,
            surface,
            self.config.clear_rgba,
        )?;
        self.frames_rendered += 1;
        if stats.triangles_skipped > 0 {
            tracing::debug!(
                frame = self.frames_rendered,
                skipped = stats.triangles_skipped,
                "degenerate triangles skipped"
            );
        }
        Ok(stats)
    }

    /// `update` then `render`.
    pub fn tick(
        &mut self,
        frame: &TrackingFrame,
        surface: &mut dyn RenderSurface,
    ) -> SpromojiResult<RenderStats> {
        self.update(frame);
        self.render(surface)
    }

    /// Drop smoothing history and snap the mesh back to rest.
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.rig.reset_positions();
        self.frames_rendered = 0;
    }

    /// Swap in a new avatar with a freshly acquired rig, then reset.
    ///
    /// On failure the engine keeps its current avatar and state.
    pub fn replace_avatar(
        &mut self,
        avatar: AvatarImage,
        acquisition: RigAcquisition<'_>,
    ) -> SpromojiResult<()> {
        let acquired = acquire_rig(acquisition, &avatar, &self.config)?;
        self.avatar = avatar;
        self.rig = acquired.rig;
        self.origin = acquired.origin;
        self.calibration = acquired.calibration;
        self.reset();
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn avatar(&self) -> &AvatarImage {
        &self.avatar
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn origin(&self) -> RigOrigin {
        self.origin
    }

    /// Fit of the calibration that built the rig, if it was calibrated.
    pub fn calibration(&self) -> Option<&CalibrationTransform> {
        self.calibration.as_ref()
    }

    pub fn blend(&self) -> &BlendState {
        self.estimator.blend()
    }

    pub fn orient(&self) -> OrientState {
        self.estimator.orient()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/session.rs"]
mod tests;
