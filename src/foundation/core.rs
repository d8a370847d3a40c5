use crate::foundation::error::{SpromojiError, SpromojiResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Pixel dimensions of an avatar image or drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> SpromojiResult<Self> {
        if width == 0 || height == 0 {
            return Err(SpromojiError::invalid_input(
                "image width/height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// Map normalized texture coordinates to image pixels.
    pub fn to_pixels(self, u: f64, v: f64) -> Point {
        Point::new(u * self.width_f64(), v * self.height_f64())
    }

    /// Map an image-pixel point to normalized `[0, 1]` coordinates (unclamped).
    pub fn to_normalized(self, p: Point) -> Point {
        Point::new(p.x / self.width_f64(), p.y / self.height_f64())
    }
}

/// One tracked landmark in image-pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64, // depth; only carried through
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
