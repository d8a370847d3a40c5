//! Smoothed blendshape and head-orientation state fed by the tracker.

use std::collections::BTreeMap;

use crate::{
    foundation::core::Landmark,
    foundation::landmarks::{
        CHIN_BOTTOM, FOREHEAD_TOP, LANDMARK_COUNT, LEFT_EYE_OUTER, NOSE_TIP, RIGHT_EYE_OUTER,
    },
    foundation::math::lerp,
    rig::blendshape::{BlendShape, BlendState},
};

/// Default weight given to a new blendshape sample.
pub const BLEND_SMOOTHING: f64 = 0.85;
/// Default weight given to a new yaw/pitch sample.
pub const POSE_SMOOTHING: f64 = 0.80;

const MIN_SPAN: f64 = 1e-9;

/// Smoothed head orientation, roughly in `[-0.5, 0.5]` on each axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrientState {
    pub yaw: f64,
    pub pitch: f64,
}

/// One sample from the upstream tracker.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingFrame {
    #[serde(default)]
    pub blend_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Landmark>>,
}

impl TrackingFrame {
    pub fn from_scores<'a>(scores: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            blend_scores: scores
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<Landmark>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// Unsmoothed yaw/pitch from a full landmark set.
///
/// `None` when landmarks are missing or the eye / face span collapses.
pub fn raw_pose(landmarks: &[Landmark]) -> Option<OrientState> {
    if landmarks.len() < LANDMARK_COUNT {
        return None;
    }
    let nose = landmarks[NOSE_TIP];
    let (left, right) = (landmarks[LEFT_EYE_OUTER], landmarks[RIGHT_EYE_OUTER]);
    let (top, bottom) = (landmarks[FOREHEAD_TOP], landmarks[CHIN_BOTTOM]);

    let eye_span = right.x - left.x;
    let face_span = bottom.y - top.y;
    if eye_span.abs() < MIN_SPAN || face_span.abs() < MIN_SPAN {
        return None;
    }
    let mid_eye_x = (left.x + right.x) * 0.5;
    let pose = OrientState {
        yaw: (nose.x - mid_eye_x) / eye_span,
        pitch: ((nose.y - top.y) / face_span) - 0.5,
    };
    (pose.yaw.is_finite() && pose.pitch.is_finite()).then_some(pose)
}

/// Per-session smoothing state for blendshapes and head pose.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseBlendEstimator {
    blend_smoothing: f64,
    pose_smoothing: f64,
    blend: BlendState,
    orient: OrientState,
}

impl Default for PoseBlendEstimator {
    fn default() -> Self {
        Self::new(BLEND_SMOOTHING, POSE_SMOOTHING)
    }
}

impl PoseBlendEstimator {
    pub fn new(blend_smoothing: f64, pose_smoothing: f64) -> Self {
        Self {
            blend_smoothing,
            pose_smoothing,
            blend: BlendState::new(),
            orient: OrientState::default(),
        }
    }

    /// Fold one tracker sample into the smoothed state.
    ///
    /// Unrecognized or non-finite scores are ignored. Without usable landmarks the pose
    /// holds its last value.
    pub fn update(&mut self, frame: &TrackingFrame) {
        for (name, &score) in &frame.blend_scores {
            let Some(shape) = BlendShape::from_name(name) else {
                continue;
            };
            if !score.is_finite() {
                continue;
            }
            self.blend.smooth_toward(shape, score, self.blend_smoothing);
        }

        match frame.landmarks.as_deref().map(raw_pose) {
            Some(Some(raw)) => {
                self.orient.yaw = lerp(self.orient.yaw, raw.yaw, self.pose_smoothing);
                self.orient.pitch = lerp(self.orient.pitch, raw.pitch, self.pose_smoothing);
            }
            Some(None) => tracing::debug!("unusable landmarks; holding last pose"),
            None => {}
        }
    }

    pub fn blend(&self) -> &BlendState {
        &self.blend
    }

    pub fn orient(&self) -> OrientState {
        self.orient
    }

    /// Forget all smoothing history.
    pub fn reset(&mut self) {
        self.blend.clear();
        self.orient = OrientState::default();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/estimate/pose.rs"]
mod tests;
