//! Per-frame vertex update and per-triangle affine rasterization.

use crate::{
    assets::decode::AvatarImage,
    estimate::pose::OrientState,
    foundation::core::{Affine, BezPath, Point, Vec2},
    foundation::error::SpromojiResult,
    foundation::math::lerp_point,
    render::surface::RenderSurface,
    rig::blendshape::BlendState,
    rig::model::Rig,
};

/// Default parallax offset of the depth pass, in pixels per unit yaw/pitch.
pub const DEPTH_OFFSET: f64 = 6.0;

/// Offset, semi-transparent second pass that fakes head depth.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepthPass {
    pub offset: f64,
    pub opacity: f32,
}

impl Default for DepthPass {
    fn default() -> Self {
        Self {
            offset: DEPTH_OFFSET,
            opacity: 0.35,
        }
    }
}

/// Renderer tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Weight given to the new target position each frame.
    pub position_smoothing: f64,
    /// Pixels added to every vertex per unit of yaw (x) and pitch (y).
    pub orientation_gain: f64,
    /// Texture-space determinant below which a triangle is skipped.
    pub degenerate_epsilon: f64,
    pub depth_pass: Option<DepthPass>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            position_smoothing: 0.75,
            orientation_gain: 4.0,
            degenerate_epsilon: 1e-6,
            depth_pass: None,
        }
    }
}

/// Triangle counts of one rasterized frame (main pass only).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    pub triangles_drawn: usize,
    /// Zero-area in texture space; never an error.
    pub triangles_skipped: usize,
}

/// Affine map taking each `src` point exactly onto the matching `dst` point.
///
/// `None` when the source triangle's determinant is within `eps` of zero.
pub fn solve_affine(src: [Point; 3], dst: [Point; 3], eps: f64) -> Option<Affine> {
    let [s0, s1, s2] = src;
    let [d0, d1, d2] = dst;
    let (du1, dv1) = (s1.x - s0.x, s1.y - s0.y);
    let (du2, dv2) = (s2.x - s0.x, s2.y - s0.y);
    let den = du1 * dv2 - du2 * dv1;
    if !den.is_finite() || den.abs() <= eps {
        return None;
    }
    let (dx1, dy1) = (d1.x - d0.x, d1.y - d0.y);
    let (dx2, dy2) = (d2.x - d0.x, d2.y - d0.y);

    let a = (dx1 * dv2 - dx2 * dv1) / den;
    let c = (dx2 * du1 - dx1 * du2) / den;
    let b = (dy1 * dv2 - dy2 * dv1) / den;
    let d = (dy2 * du1 - dy1 * du2) / den;
    let e = d0.x - a * s0.x - c * s0.y;
    let f = d0.y - b * s0.x - d * s0.y;

    let m = Affine::new([a, b, c, d, e, f]);
    m.is_finite().then_some(m)
}

fn triangle_path([a, b, c]: [Point; 3]) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(a);
    path.line_to(b);
    path.line_to(c);
    path.close_path();
    path
}

/// Drives rig vertices from smoothed state and warps the avatar through the mesh.
#[derive(Clone, Debug, Default)]
pub struct MeshWarpRenderer {
    settings: RenderSettings,
}

impl MeshWarpRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Ease every vertex toward its blendshape- and pose-displaced target.
    pub fn update_vertices(&self, rig: &mut Rig, blend: &BlendState, orient: OrientState) {
        let gain = self.settings.orientation_gain;
        let pose = Vec2::new(orient.yaw * gain, orient.pitch * gain);
        for v in rig.vertices_mut() {
            let mut target = v.base() + pose;
            for (shape, w) in v.weights() {
                let value = blend.value(*shape);
                target.x += w.x * value;
                target.y += w.y * value;
            }
            v.pos = lerp_point(v.pos, target, self.settings.position_smoothing);
        }
    }

    /// Warp `avatar` onto `surface` through every rig triangle.
    pub fn rasterize(
        &self,
        rig: &Rig,
        avatar: &AvatarImage,
        orient: OrientState,
        surface: &mut dyn RenderSurface,
    ) -> SpromojiResult<RenderStats> {
        let verts = rig.vertices();
        let mut stats = RenderStats::default();
        let mut warps = Vec::with_capacity(rig.triangles().len());

        for (ti, tri) in rig.triangles().iter().enumerate() {
            let src = tri.map(|i| verts[i].base());
            let dst = tri.map(|i| verts[i].position());
            match solve_affine(src, dst, self.settings.degenerate_epsilon) {
                Some(m) => {
                    draw_warped(surface, avatar, dst, m, 1.0)?;
                    stats.triangles_drawn += 1;
                    warps.push((dst, m));
                }
                None => {
                    tracing::debug!(triangle = ti, "skipping degenerate triangle");
                    stats.triangles_skipped += 1;
                }
            }
        }

        if let Some(depth) = self.settings.depth_pass {
            let shift = Vec2::new(-orient.yaw * depth.offset, -orient.pitch * depth.offset);
            let t = Affine::translate(shift);
            for (dst, m) in warps {
                draw_warped(surface, avatar, dst.map(|p| p + shift), t * m, depth.opacity)?;
            }
        }

        Ok(stats)
    }

    /// One full frame: move vertices, clear, rasterize.
    #[tracing::instrument(skip_all, fields(triangles = rig.triangles().len()))]
    pub fn render_frame(
        &self,
        rig: &mut Rig,
        blend: &BlendState,
        orient: OrientState,
        avatar: &AvatarImage,
        surface: &mut dyn RenderSurface,
        clear_rgba: [u8; 4],
    ) -> SpromojiResult<RenderStats> {
        self.update_vertices(rig, blend, orient);
        surface.clear(clear_rgba);
        self.rasterize(rig, avatar, orient, surface)
    }
}

fn draw_warped(
    surface: &mut dyn RenderSurface,
    avatar: &AvatarImage,
    clip: [Point; 3],
    m: Affine,
    opacity: f32,
) -> SpromojiResult<()> {
    surface.save();
    surface.set_transform(Affine::IDENTITY);
    surface.clip_path(&triangle_path(clip));
    surface.set_transform(m);
    let drawn = surface.draw_image(avatar, opacity);
    surface.restore();
    drawn
}

#[cfg(test)]
#[path = "../../tests/unit/render/warp.rs"]
mod tests;
