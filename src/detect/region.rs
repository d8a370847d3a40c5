use crate::{
    foundation::core::{ImageSize, Landmark, Point, Rect},
    foundation::error::{SpromojiError, SpromojiResult},
    foundation::landmarks::{LANDMARK_COUNT, LEFT_EYE, LIPS, RIGHT_EYE},
};

/// Axis-aligned box in image pixel space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Box spanned by two corner points, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_rect(Rect::from_points(a, b))
    }

    pub fn from_rect(r: Rect) -> Self {
        Self::new(r.x0, r.y0, r.width(), r.height())
    }

    pub fn rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }

    pub fn right(self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(self) -> f64 {
        self.y + self.h
    }

    pub fn center(self) -> Point {
        Point::new(self.x + (self.w * 0.5), self.y + (self.h * 0.5))
    }

    /// Positive-area overlap; boxes that only share an edge do not intersect.
    pub fn intersects(self, other: Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow by `d` on every side.
    pub fn inflate(self, d: f64) -> Self {
        Self::new(self.x - d, self.y - d, self.w + (2.0 * d), self.h + (2.0 * d))
    }

    /// Bounding box of a set of points; `None` when empty.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let r = it.fold(Rect::from_points(first, first), |r, p| r.union_pt(p));
        Some(Self::from_rect(r))
    }
}

/// How a [`RegionSet`] was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionMethod {
    /// Bounding boxes of tracked eye/lip landmarks.
    Landmarks,
    /// Darkness (eyes) and horizontal contrast (mouth) heuristics.
    Color,
    /// Sobel edge-density fallback.
    Edges,
    /// Drawn by the user.
    Manual,
    /// Polygons returned by the rigging service.
    Service,
    /// Fixed generic layout.
    Generic,
}

/// Eye and mouth boxes that seed a minimal rig.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSet {
    pub left_eye: Region,
    pub right_eye: Region,
    pub mouth: Region,
    pub label: DetectionMethod,
}

/// Facial part a service polygon outlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RegionKind {
    #[serde(rename = "eyeL")]
    LeftEye,
    #[serde(rename = "eyeR")]
    RightEye,
    #[serde(rename = "mouth")]
    Mouth,
}

/// Polygon in normalized image coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionPolygon {
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub poly: Vec<[f64; 2]>,
}

// The service also returns the avatar `hash`; it is not needed here.
#[derive(serde::Deserialize)]
struct ServiceResponse {
    rig: Vec<RegionPolygon>,
}

impl RegionSet {
    pub fn manual(left_eye: Region, right_eye: Region, mouth: Region) -> Self {
        Self {
            left_eye,
            right_eye,
            mouth,
            label: DetectionMethod::Manual,
        }
    }

    /// Generic layout used by the rigging service for unknown avatars.
    pub fn generic(image: ImageSize) -> Self {
        let (w, h) = (image.width_f64(), image.height_f64());
        let norm = |x0: f64, y0: f64, x1: f64, y1: f64| {
            Region::new(x0 * w, y0 * h, (x1 - x0) * w, (y1 - y0) * h)
        };
        Self {
            left_eye: norm(0.3, 0.35, 0.4, 0.45),
            right_eye: norm(0.6, 0.35, 0.7, 0.45),
            mouth: norm(0.4, 0.65, 0.6, 0.75),
            label: DetectionMethod::Generic,
        }
    }

    /// Eye and lip bounding boxes of a full landmark set; `None` if landmarks are missing.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        if landmarks.len() < LANDMARK_COUNT {
            return None;
        }
        let group = |idx: &[usize]| Region::bounding(idx.iter().map(|&i| landmarks[i].point()));
        Some(Self {
            left_eye: group(&LEFT_EYE)?,
            right_eye: group(&RIGHT_EYE)?,
            mouth: group(&LIPS)?,
            label: DetectionMethod::Landmarks,
        })
    }

    /// Convert normalized service polygons into pixel boxes.
    ///
    /// The first polygon of each kind wins; every kind must be present.
    pub fn from_polygons(polys: &[RegionPolygon], image: ImageSize) -> SpromojiResult<Self> {
        let find = |kind: RegionKind| -> SpromojiResult<Region> {
            let poly = polys.iter().find(|p| p.kind == kind).ok_or_else(|| {
                SpromojiError::invalid_input(format!("no {kind:?} polygon in region list"))
            })?;
            if poly.poly.len() < 3 {
                return Err(SpromojiError::invalid_input(format!(
                    "{kind:?} polygon needs at least 3 points"
                )));
            }
            if poly.poly.iter().flatten().any(|c| !c.is_finite()) {
                return Err(SpromojiError::invalid_input(format!(
                    "{kind:?} polygon has non-finite coordinates"
                )));
            }
            Region::bounding(poly.poly.iter().map(|&[u, v]| image.to_pixels(u, v)))
                .ok_or_else(|| SpromojiError::invalid_input("empty polygon"))
        };
        Ok(Self {
            left_eye: find(RegionKind::LeftEye)?,
            right_eye: find(RegionKind::RightEye)?,
            mouth: find(RegionKind::Mouth)?,
            label: DetectionMethod::Service,
        })
    }

    /// Parse a rigging-service response (`{"rig": [...], "hash": "..."}`).
    pub fn from_service_json(text: &str, image: ImageSize) -> SpromojiResult<Self> {
        let resp: ServiceResponse =
            serde_json::from_str(text).map_err(|e| SpromojiError::serde(e.to_string()))?;
        Self::from_polygons(&resp.rig, image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/detect/region.rs"]
mod tests;
