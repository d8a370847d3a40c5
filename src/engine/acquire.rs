//! Ordered rig-acquisition paths tried when an engine starts.

use crate::{
    assets::decode::AvatarImage,
    calibration::align::{CalibrationTransform, align_template_with},
    calibration::template::Template,
    detect::chain::{LandmarkDetector, detect_regions},
    detect::region::{DetectionMethod, RegionSet},
    engine::config::EngineConfig,
    foundation::core::{ImageSize, Point},
    foundation::error::{SpromojiError, SpromojiResult},
    rig::builder::{rig_from_aligned_template, rig_from_regions},
    rig::model::{Rig, RigSource},
};

/// Inputs for rig acquisition, tried in field order.
///
/// A failing path falls through to the next one; only when all of them fail does
/// initialization fail.
#[derive(Default)]
pub struct RigAcquisition<'a> {
    /// Authored rig file, JSON text or prebuilt rig.
    pub rig: Option<RigSource>,
    /// `[leftEye, rightEye, mouth]` taps in avatar pixels.
    pub calibration_points: Option<Vec<Point>>,
    /// Regions selected by hand or returned by the rigging service.
    pub regions: Option<RegionSet>,
    /// Tracking model for the first detector stage.
    pub detector: Option<&'a dyn LandmarkDetector>,
    /// Do not run the detector chain.
    pub skip_detection: bool,
}

impl<'a> RigAcquisition<'a> {
    pub fn from_rig(source: RigSource) -> Self {
        Self {
            rig: Some(source),
            ..Self::default()
        }
    }

    pub fn from_calibration(points: Vec<Point>) -> Self {
        Self {
            calibration_points: Some(points),
            ..Self::default()
        }
    }

    pub fn from_regions(regions: RegionSet) -> Self {
        Self {
            regions: Some(regions),
            ..Self::default()
        }
    }

    pub fn with_detector(mut self, detector: &'a dyn LandmarkDetector) -> Self {
        self.detector = Some(detector);
        self
    }
}

/// Which path produced the engine's rig.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RigOrigin {
    Loaded,
    Calibrated,
    Regions(DetectionMethod),
}

#[derive(Clone, Debug)]
pub struct AcquiredRig {
    pub rig: Rig,
    pub origin: RigOrigin,
    pub calibration: Option<CalibrationTransform>,
}

/// Run the acquisition chain for `avatar`.
#[tracing::instrument(skip_all, fields(width = avatar.size().width, height = avatar.size().height))]
pub fn acquire_rig(
    acquisition: RigAcquisition<'_>,
    avatar: &AvatarImage,
    config: &EngineConfig,
) -> SpromojiResult<AcquiredRig> {
    let image = avatar.size();
    let mut failures: Vec<String> = Vec::new();

    if let Some(source) = acquisition.rig {
        match Rig::load(source, image) {
            Ok(rig) => return Ok(acquired(rig, RigOrigin::Loaded, None)),
            Err(err) => {
                tracing::warn!(error = %err, "rig load failed; trying fallbacks");
                failures.push(err.to_string());
            }
        }
    }

    if let Some(points) = acquisition.calibration_points {
        let built = align_template_with(
            Template::canonical(),
            &points,
            image,
            config.calibration_margin,
        )
        .and_then(|aligned| {
            let rig = rig_from_aligned_template(&aligned, image)?;
            Ok((rig, aligned.transform))
        });
        match built {
            Ok((rig, transform)) => {
                return Ok(acquired(rig, RigOrigin::Calibrated, Some(transform)));
            }
            Err(err) => {
                tracing::warn!(error = %err, "calibration failed; trying fallbacks");
                failures.push(err.to_string());
            }
        }
    }

    if let Some(regions) = acquisition.regions
        && let Some(found) = region_rig(regions, image, &mut failures)
    {
        return Ok(found);
    }

    if !acquisition.skip_detection {
        match detect_regions(avatar.pixels(), acquisition.detector) {
            Some(regions) => {
                if let Some(found) = region_rig(regions, image, &mut failures) {
                    return Ok(found);
                }
            }
            None => failures.push("no facial regions detected".to_string()),
        }
    }

    if config.allow_generic_rig
        && let Some(found) = region_rig(RegionSet::generic(image), image, &mut failures)
    {
        return Ok(found);
    }

    if failures.is_empty() {
        failures.push("no acquisition path configured".to_string());
    }
    Err(SpromojiError::initialization(failures.join("; ")))
}

fn region_rig(
    regions: RegionSet,
    image: ImageSize,
    failures: &mut Vec<String>,
) -> Option<AcquiredRig> {
    match rig_from_regions(&regions, image) {
        Ok(rig) => Some(acquired(rig, RigOrigin::Regions(regions.label), None)),
        Err(err) => {
            tracing::warn!(method = ?regions.label, error = %err, "region rig rejected");
            failures.push(err.to_string());
            None
        }
    }
}

fn acquired(
    rig: Rig,
    origin: RigOrigin,
    calibration: Option<CalibrationTransform>,
) -> AcquiredRig {
    tracing::info!(
        ?origin,
        vertices = rig.vertices().len(),
        triangles = rig.triangles().len(),
        "rig acquired"
    );
    AcquiredRig {
        rig,
        origin,
        calibration,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/acquire.rs"]
mod tests;
