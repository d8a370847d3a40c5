//! Darkness-based eye and contrast-based mouth detection.

use image::RgbaImage;

use crate::detect::region::{DetectionMethod, Region, RegionSet};

/// Mean darkness above which a block is an eye candidate.
pub(crate) const EYE_DARKNESS_THRESHOLD: f64 = 0.3;
/// Mean horizontal contrast above which a block can be the mouth.
pub(crate) const MOUTH_CONTRAST_THRESHOLD: f64 = 0.2;

const EYE_BAND_Y: (f64, f64) = (0.2, 0.6);
const MOUTH_BAND_Y: (f64, f64) = (0.55, 0.8);
const BAND_X: (f64, f64) = (0.1, 0.9);

/// Scan block edge length; scales with the image and never drops below 4px.
pub(crate) fn block_size(image: &RgbaImage) -> u32 {
    (image.width().min(image.height()) / 16).max(4)
}

#[inline]
pub(crate) fn brightness(image: &RgbaImage, x: u32, y: u32) -> f64 {
    let p = image.get_pixel(x, y).0;
    (f64::from(p[0]) + f64::from(p[1]) + f64::from(p[2])) / 3.0
}

fn band(len: u32, (lo, hi): (f64, f64)) -> (u32, u32) {
    let len_f = f64::from(len);
    ((len_f * lo).floor() as u32, (len_f * hi).floor() as u32)
}

/// Top-left corners of `block`-sized cells stepping by `step` that fit inside the bands.
fn block_origins(
    image: &RgbaImage,
    band_y: (f64, f64),
    block: u32,
    step: u32,
) -> impl Iterator<Item = (u32, u32)> {
    let (x0, x1) = band(image.width(), BAND_X);
    let (y0, y1) = band(image.height(), band_y);
    (y0..)
        .step_by(step as usize)
        .take_while(move |y| y + block <= y1)
        .flat_map(move |y| {
            (x0..)
                .step_by(step as usize)
                .take_while(move |x| x + block <= x1)
                .map(move |x| (x, y))
        })
}

fn mean_darkness(image: &RgbaImage, x0: u32, y0: u32, block: u32) -> f64 {
    let mut sum = 0.0;
    for y in y0..y0 + block {
        for x in x0..x0 + block {
            sum += (255.0 - brightness(image, x, y)) / 255.0;
        }
    }
    sum / f64::from(block * block)
}

fn mean_horizontal_contrast(image: &RgbaImage, x0: u32, y0: u32, block: u32) -> f64 {
    if block < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for y in y0..y0 + block {
        for x in x0..x0 + block - 1 {
            sum += (brightness(image, x + 1, y) - brightness(image, x, y)).abs() / 255.0;
        }
    }
    sum / f64::from(block * (block - 1))
}

/// Dark blocks in the eye band, darkest first, minus those overlapping an accepted one.
///
/// The returned box is the scanned block grown by half a block on every side, so each eye
/// region is twice the block size; neighbouring dark blocks of the same feature collapse
/// into one candidate. Result is sorted by x.
pub(crate) fn eye_candidates(image: &RgbaImage) -> Vec<Region> {
    let block = block_size(image);
    let mut scored: Vec<(f64, Region)> = block_origins(image, EYE_BAND_Y, block, block)
        .filter_map(|(x, y)| {
            let d = mean_darkness(image, x, y, block);
            (d > EYE_DARKNESS_THRESHOLD).then(|| {
                let b = f64::from(block);
                (d, Region::new(f64::from(x), f64::from(y), b, b).inflate(b * 0.5))
            })
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut accepted: Vec<Region> = Vec::new();
    for (_, candidate) in scored {
        if accepted.iter().all(|a| !a.intersects(candidate)) {
            accepted.push(candidate);
        }
    }
    accepted.sort_by(|a, b| a.x.total_cmp(&b.x));
    accepted
}

/// Highest-contrast half-overlapping block in the mouth band.
pub(crate) fn mouth_candidate(image: &RgbaImage) -> Option<Region> {
    let block = block_size(image);
    let step = (block / 2).max(1);
    let mut best: Option<(f64, Region)> = None;
    for (x, y) in block_origins(image, MOUTH_BAND_Y, block, step) {
        let score = mean_horizontal_contrast(image, x, y, block);
        if score > MOUTH_CONTRAST_THRESHOLD && best.is_none_or(|(s, _)| score > s) {
            let b = f64::from(block);
            best = Some((score, Region::new(f64::from(x), f64::from(y), b, b)));
        }
    }
    best.map(|(_, r)| r)
}

/// Color stage of the detector chain.
pub(crate) fn detect_by_color(image: &RgbaImage) -> Option<RegionSet> {
    let eyes = eye_candidates(image);
    if eyes.len() < 2 {
        tracing::debug!(found = eyes.len(), "color stage: not enough eye candidates");
        return None;
    }
    let Some(mouth) = mouth_candidate(image) else {
        tracing::debug!("color stage: no mouth candidate");
        return None;
    };
    Some(RegionSet {
        left_eye: eyes[0],
        right_eye: eyes[1],
        mouth,
        label: DetectionMethod::Color,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/detect/color.rs"]
mod tests;
