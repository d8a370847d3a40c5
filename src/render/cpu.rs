use crate::{
    assets::decode::AvatarImage,
    foundation::core::{Affine, BezPath, Point},
    foundation::error::{SpromojiError, SpromojiResult},
    render::frame::FrameRGBA,
    render::surface::{DrawState, RenderSurface},
};

/// [`RenderSurface`] rasterized on the CPU with `vello_cpu`.
///
/// Draw calls accumulate in a render context; [`CpuSurface::finish`] rasterizes them and reads
/// the frame back.
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> SpromojiResult<Self> {
        if width == 0 || height == 0 {
            return Err(SpromojiError::invalid_input(
                "surface width/height must be > 0",
            ));
        }
        let width: u16 = width
            .try_into()
            .map_err(|_| SpromojiError::invalid_input("surface width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| SpromojiError::invalid_input("surface height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            state: DrawState::default(),
            stack: Vec::new(),
        })
    }

    /// Rasterize pending draws and read back premultiplied RGBA8.
    pub fn finish(&mut self) -> FrameRGBA {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RenderSurface for CpuSurface {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn clear(&mut self, rgba: [u8; 4]) {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
        if rgba[3] != 0 {
            let [r, g, b, a] = rgba;
            self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            self.ctx
                .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }
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

    fn draw_image(&mut self, image: &AvatarImage, opacity: f32) -> SpromojiResult<()> {
        if !opacity.is_finite() {
            return Err(SpromojiError::invalid_input("draw opacity must be finite"));
        }
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity == 0.0 {
            return Ok(());
        }
        let size = image.size();
        let ctx = &mut self.ctx;
        ctx.set_paint(image.paint().clone());

        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        match &self.state.clip {
            // Fill the device-space clip and carry the image mapping on the paint.
            Some(clip) => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint_transform(affine_to_cpu(self.state.transform));
                ctx.fill_path(&bezpath_to_cpu(clip));
            }
            None => {
                ctx.set_transform(affine_to_cpu(self.state.transform));
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    size.width_f64(),
                    size.height_f64(),
                ));
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(())
    }
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
