//! Edge-density fallback: strongest textured blocks become eyes and mouth.

use image::RgbaImage;

use crate::detect::{
    color::{block_size, brightness},
    region::{DetectionMethod, Region, RegionSet},
};

/// Mean normalized edge magnitude above which a block qualifies.
pub(crate) const EDGE_DENSITY_THRESHOLD: f64 = 0.3;

/// Central-difference Sobel magnitude, normalized to `[0, 1]`; border pixels are 0.
pub(crate) fn gradient_magnitude(image: &RgbaImage) -> Vec<f32> {
    let (w, h) = image.dimensions();
    let mut out = vec![0.0f32; (w as usize) * (h as usize)];
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = brightness(image, x + 1, y) - brightness(image, x - 1, y);
            let gy = brightness(image, x, y + 1) - brightness(image, x, y - 1);
            let mag = (gx.hypot(gy) / 255.0).min(1.0);
            out[(y as usize) * (w as usize) + (x as usize)] = mag as f32;
        }
    }
    out
}

/// Qualifying half-overlapping blocks, best first; ties keep scan order.
pub(crate) fn edge_blocks(image: &RgbaImage) -> Vec<(f64, Region)> {
    let (w, h) = image.dimensions();
    let block = block_size(image);
    if w < block || h < block {
        return Vec::new();
    }
    let step = (block / 2).max(1);
    let mag = gradient_magnitude(image);

    let mut scored = Vec::new();
    for y in (0..=h - block).step_by(step as usize) {
        for x in (0..=w - block).step_by(step as usize) {
            let mut sum = 0.0f64;
            for yy in y..y + block {
                let row = (yy as usize) * (w as usize);
                for xx in x..x + block {
                    sum += f64::from(mag[row + xx as usize]);
                }
            }
            let density = sum / f64::from(block * block);
            if density > EDGE_DENSITY_THRESHOLD {
                let b = f64::from(block);
                scored.push((density, Region::new(f64::from(x), f64::from(y), b, b)));
            }
        }
    }
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
}

/// Edge stage of the detector chain: the top three qualifying blocks, in score order.
pub(crate) fn detect_by_edges(image: &RgbaImage) -> Option<RegionSet> {
    let blocks = edge_blocks(image);
    let [(_, left_eye), (_, right_eye), (_, mouth), ..] = blocks[..] else {
        tracing::debug!(found = blocks.len(), "edge stage: not enough dense blocks");
        return None;
    };
    Some(RegionSet {
        left_eye,
        right_eye,
        mouth,
        label: DetectionMethod::Edges,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/detect/edges.rs"]
mod tests;
