use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use image::RgbaImage;

use crate::{
    foundation::core::ImageSize,
    foundation::error::{SpromojiError, SpromojiResult},
};

/// Decoded avatar: straight-alpha pixels for detection plus a premultiplied paint for drawing.
#[derive(Clone)]
pub struct AvatarImage {
    size: ImageSize,
    pixels: Arc<RgbaImage>,
    paint: vello_cpu::Image,
}

impl std::fmt::Debug for AvatarImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarImage")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl AvatarImage {
    pub fn from_rgba(image: RgbaImage) -> SpromojiResult<Self> {
        let (width, height) = image.dimensions();
        let size = ImageSize::new(width, height)?;
        let w: u16 = width
            .try_into()
            .map_err(|_| SpromojiError::invalid_input("avatar width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| SpromojiError::invalid_input("avatar height exceeds u16"))?;

        let mut may_have_opacities = false;
        let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = premultiply_rgba8(p.0);
                may_have_opacities |= a != 255;
                vello_cpu::peniko::color::PremulRgba8 { r, g, b, a }
            })
            .collect();
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);

        Ok(Self {
            size,
            pixels: Arc::new(image),
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
        })
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn paint(&self) -> &vello_cpu::Image {
        &self.paint
    }
}

pub fn decode_avatar(bytes: &[u8]) -> SpromojiResult<AvatarImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode avatar image from memory")?;
    AvatarImage::from_rgba(dyn_img.to_rgba8())
}

pub fn load_avatar(path: &Path) -> SpromojiResult<AvatarImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read avatar '{}'", path.display()))?;
    decode_avatar(&bytes)
}

pub(crate) fn premultiply_rgba8([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a16 = u16::from(a);
    let premul = |c: u8| ((u16::from(c) * a16 + 127) / 255) as u8;
    [premul(r), premul(g), premul(b), a]
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
