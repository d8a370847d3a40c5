//! Recognized blendshape names and the smoothed per-shape state.

use crate::foundation::math::lerp;

/// Facial expression coefficients the engine knows how to apply.
///
/// Tracker keys outside this set are ignored rather than accumulated.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum BlendShape {
    EyeBlinkLeft,
    EyeBlinkRight,
    JawOpen,
    MouthOpen,
    MouthSmile,
    MouthSmileLeft,
    MouthSmileRight,
    BrowDownLeft,
    BrowDownRight,
    BrowInnerUp,
}

impl BlendShape {
    /// Number of recognized shapes.
    pub const COUNT: usize = 10;

    /// Every recognized shape, in table order.
    pub const ALL: [BlendShape; Self::COUNT] = [
        Self::EyeBlinkLeft,
        Self::EyeBlinkRight,
        Self::JawOpen,
        Self::MouthOpen,
        Self::MouthSmile,
        Self::MouthSmileLeft,
        Self::MouthSmileRight,
        Self::BrowDownLeft,
        Self::BrowDownRight,
        Self::BrowInnerUp,
    ];

    /// Tracker-facing name (e.g. `"eyeBlinkLeft"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::EyeBlinkLeft => "eyeBlinkLeft",
            Self::EyeBlinkRight => "eyeBlinkRight",
            Self::JawOpen => "jawOpen",
            Self::MouthOpen => "mouthOpen",
            Self::MouthSmile => "mouthSmile",
            Self::MouthSmileLeft => "mouthSmileLeft",
            Self::MouthSmileRight => "mouthSmileRight",
            Self::BrowDownLeft => "browDownLeft",
            Self::BrowDownRight => "browDownRight",
            Self::BrowInnerUp => "browInnerUp",
        }
    }

    /// Resolve a tracker name; `None` for unrecognized names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Smoothed blendshape values, keyed by [`BlendShape`].
///
/// Entries start unset and appear lazily the first time the tracker reports them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlendState {
    values: [Option<f64>; BlendShape::COUNT],
}

impl BlendState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smoothed value, or `None` if the shape was never reported.
    pub fn get(&self, shape: BlendShape) -> Option<f64> {
        self.values[shape.slot()]
    }

    /// Smoothed value, `0.0` when absent.
    pub fn value(&self, shape: BlendShape) -> f64 {
        self.get(shape).unwrap_or(0.0)
    }

    /// Move `shape` toward `sample`; the first sample is taken as-is.
    pub fn smooth_toward(&mut self, shape: BlendShape, sample: f64, t: f64) {
        let slot = &mut self.values[shape.slot()];
        *slot = Some(match *slot {
            None => sample,
            Some(prev) => lerp(prev, sample, t),
        });
    }

    pub fn clear(&mut self) {
        self.values = [None; BlendShape::COUNT];
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Set entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (BlendShape, f64)> + '_ {
        BlendShape::ALL
            .into_iter()
            .filter_map(|s| self.get(s).map(|v| (s, v)))
    }
}

/// Image-space displacement (pixels per unit blend value) a shape applies to a vertex.
///
/// Serialized either as a scalar, which displaces both axes equally, or as `{ "x": .., "y": .. }`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "DisplacementRepr", into = "DisplacementRepr")]
pub struct Displacement {
    pub x: f64,
    pub y: f64,
}

impl Displacement {
    pub fn uniform(w: f64) -> Self {
        Self { x: w, y: w }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum DisplacementRepr {
    Uniform(f64),
    Axes {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
}

impl From<DisplacementRepr> for Displacement {
    fn from(r: DisplacementRepr) -> Self {
        match r {
            DisplacementRepr::Uniform(w) => Self::uniform(w),
            DisplacementRepr::Axes { x, y } => Self { x, y },
        }
    }
}

impl From<Displacement> for DisplacementRepr {
    fn from(d: Displacement) -> Self {
        if d.x == d.y {
            Self::Uniform(d.x)
        } else {
            Self::Axes { x: d.x, y: d.y }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/blendshape.rs"]
mod tests;
