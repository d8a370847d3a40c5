//! The drawing-target abstraction the mesh-warp renderer talks to.

use crate::{
    assets::decode::AvatarImage,
    foundation::core::{Affine, BezPath},
    foundation::error::SpromojiResult,
};

/// Canvas-like 2D target: clear, state stack, path clip, affine transform, image blit.
pub trait RenderSurface {
    /// Target dimensions in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill the whole target, discarding previous content. Straight-alpha RGBA8.
    fn clear(&mut self, rgba: [u8; 4]);

    /// Push the current transform and clip.
    fn save(&mut self);

    /// Pop back to the last saved transform and clip; no-op on an empty stack.
    fn restore(&mut self);

    /// Restrict subsequent draws to `path`, interpreted under the current transform.
    fn clip_path(&mut self, path: &BezPath);

    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Draw `image` at its natural size under the current transform and clip.
    fn draw_image(&mut self, image: &AvatarImage, opacity: f32) -> SpromojiResult<()>;
}

/// Transform and device-space clip shared by the surface implementations.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DrawState {
    pub(crate) transform: Affine,
    pub(crate) clip: Option<BezPath>,
}

impl DrawState {
    /// A later clip replaces an earlier one; the renderer only ever nests one level.
    pub(crate) fn clip_to(&mut self, path: &BezPath) {
        self.clip = Some(self.transform * path.clone());
    }
}

/// One operation captured by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear([u8; 4]),
    DrawImage {
        /// Image-to-device transform at draw time.
        transform: Affine,
        /// Device-space clip at draw time.
        clip: Option<BezPath>,
        opacity: f32,
    },
}

/// Surface that records draw calls instead of producing pixels.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    state: DrawState,
    stack: Vec<DrawState>,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: DrawState::default(),
            stack: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Just the image draws, in order.
    pub fn draws(&self) -> impl Iterator<Item = (&Affine, Option<&BezPath>, f32)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            SurfaceOp::DrawImage {
                transform,
                clip,
                opacity,
            } => Some((transform, clip.as_ref(), *opacity)),
            SurfaceOp::Clear(_) => None,
        })
    }

    /// Depth of the save stack; zero after balanced save/restore pairs.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        self.ops.push(SurfaceOp::Clear(rgba));
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.state.clip_to(path);
    }

    fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    fn draw_image(&mut self, _image: &AvatarImage, opacity: f32) -> SpromojiResult<()> {
        self.ops.push(SurfaceOp::DrawImage {
            transform: self.state.transform,
            clip: self.state.clip.clone(),
            opacity,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
