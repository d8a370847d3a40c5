//! Fixed-priority region detection: tracking model, then color, then edges.

use image::RgbaImage;

use crate::{
    detect::{color::detect_by_color, edges::detect_by_edges, region::RegionSet},
    foundation::core::Landmark,
};

/// Full face-tracking model that can locate landmarks on a still image.
///
/// Implemented by the host; the engine never bundles a tracking model.
pub trait LandmarkDetector {
    /// Landmarks in image-pixel space, or `Ok(None)` when no face is found.
    fn detect_landmarks(&self, image: &RgbaImage) -> anyhow::Result<Option<Vec<Landmark>>>;
}

fn detect_by_landmarks(image: &RgbaImage, detector: &dyn LandmarkDetector) -> Option<RegionSet> {
    match detector.detect_landmarks(image) {
        Ok(Some(landmarks)) => {
            let regions = RegionSet::from_landmarks(&landmarks);
            if regions.is_none() {
                tracing::debug!(
                    count = landmarks.len(),
                    "landmark stage: incomplete landmark set"
                );
            }
            regions
        }
        Ok(None) => {
            tracing::debug!("landmark stage: no face found");
            None
        }
        Err(err) => {
            tracing::debug!(error = %format!("{err:#}"), "landmark stage failed");
            None
        }
    }
}

/// Run the detector chain, short-circuiting on the first stage that succeeds.
///
/// Every stage fails soft; `None` means all of them came up empty.
#[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect_regions(
    image: &RgbaImage,
    detector: Option<&dyn LandmarkDetector>,
) -> Option<RegionSet> {
    let found = detector
        .and_then(|d| detect_by_landmarks(image, d))
        .or_else(|| detect_by_color(image))
        .or_else(|| detect_by_edges(image));
    match &found {
        Some(set) => tracing::debug!(method = ?set.label, "regions detected"),
        None => tracing::debug!("no detection stage succeeded"),
    }
    found
}

#[cfg(test)]
#[path = "../../tests/unit/detect/chain.rs"]
mod tests;
