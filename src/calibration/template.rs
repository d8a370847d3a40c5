//! Canonical 468-point face template used to align a full mesh from three taps.

use std::sync::OnceLock;

use crate::{
    foundation::error::{SpromojiError, SpromojiResult},
    foundation::landmarks::{
        self, CHIN_BOTTOM, FOREHEAD_TOP, LANDMARK_COUNT, LEFT_EYE_OUTER, LEFT_EYE_TOP,
        LEFT_MOUTH_CORNER, LOWER_LIP_CENTER, NOSE_TIP, RIGHT_EYE_OUTER, RIGHT_EYE_TOP,
        RIGHT_MOUTH_CORNER, UPPER_LIP_CENTER,
    },
};

/// Template indices matched against the three calibration taps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateKeys {
    pub left_eye: usize,
    pub right_eye: usize,
    pub mouth: usize,
}

impl Default for TemplateKeys {
    fn default() -> Self {
        Self {
            left_eye: LEFT_EYE_TOP,
            right_eye: RIGHT_EYE_TOP,
            mouth: UPPER_LIP_CENTER,
        }
    }
}

impl TemplateKeys {
    pub fn as_array(self) -> [usize; 3] {
        [self.left_eye, self.right_eye, self.mouth]
    }
}

/// Normalized reference face mesh.
///
/// Read-only once built. Points are `[x, y, z]` with x/y in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    points: Vec<[f64; 3]>,
    triangles: Vec<[usize; 3]>,
    feature_triangles: Vec<usize>,
    keys: TemplateKeys,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateFile {
    points: Vec<[f64; 3]>,
    triangles: Vec<[usize; 3]>,
    #[serde(default)]
    keys: TemplateKeys,
}

impl Template {
    /// Validate a mesh and derive its feature triangles.
    pub fn new(
        points: Vec<[f64; 3]>,
        triangles: Vec<[usize; 3]>,
        keys: TemplateKeys,
    ) -> SpromojiResult<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(SpromojiError::invalid_input(format!(
                "template needs {LANDMARK_COUNT} points, got {}",
                points.len()
            )));
        }
        if points.iter().flatten().any(|c| !c.is_finite()) {
            return Err(SpromojiError::invalid_input(
                "template has non-finite coordinates",
            ));
        }
        if triangles.is_empty() {
            return Err(SpromojiError::invalid_input("template has no triangles"));
        }
        for (ti, tri) in triangles.iter().enumerate() {
            if tri.iter().any(|&i| i >= points.len()) {
                return Err(SpromojiError::invalid_input(format!(
                    "template triangle {ti} is out of range"
                )));
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(SpromojiError::invalid_input(format!(
                    "template triangle {ti} repeats a point"
                )));
            }
        }
        let [a, b, c] = keys.as_array();
        if a == b || b == c || a == c {
            return Err(SpromojiError::invalid_input("template keys must be distinct"));
        }

        let feature_triangles = feature_triangles_of(&triangles);
        Ok(Self {
            points,
            triangles,
            feature_triangles,
            keys,
        })
    }

    /// Load an alternative canonical mesh (`{"points": [...], "triangles": [...], "keys"?}`).
    pub fn from_json(text: &str) -> SpromojiResult<Self> {
        let file: TemplateFile =
            serde_json::from_str(text).map_err(|e| SpromojiError::serde(e.to_string()))?;
        Self::new(file.points, file.triangles, file.keys)
    }

    /// Process-wide bundled template, built on first use.
    pub fn canonical() -> &'static Template {
        static CANONICAL: OnceLock<Template> = OnceLock::new();
        CANONICAL.get_or_init(build_canonical)
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Indices into [`Template::triangles`] that touch an eye or lip landmark.
    pub fn feature_triangles(&self) -> &[usize] {
        &self.feature_triangles
    }

    pub fn keys(&self) -> TemplateKeys {
        self.keys
    }

    /// The `[leftEye, rightEye, mouth]` points, x/y only.
    pub fn key_points(&self) -> [(f64, f64); 3] {
        self.keys.as_array().map(|i| (self.points[i][0], self.points[i][1]))
    }
}

fn feature_triangles_of(triangles: &[[usize; 3]]) -> Vec<usize> {
    triangles
        .iter()
        .enumerate()
        .filter(|(_, tri)| tri.iter().any(|&i| landmarks::is_feature_landmark(i)))
        .map(|(ti, _)| ti)
        .collect()
}

const GRID_COLS: usize = 26;
const GRID_ROWS: usize = 18;
const GRID_X: (f64, f64) = (0.15, 0.85);
const GRID_Y: (f64, f64) = (0.08, 0.95);

// Semantic landmarks are pinned to the grid cell nearest their face position.
const ANCHORS: [(usize, f64, f64); 11] = [
    (FOREHEAD_TOP, 0.5, 0.08),
    (CHIN_BOTTOM, 0.5, 0.95),
    (NOSE_TIP, 0.5, 0.58),
    (LEFT_EYE_OUTER, 0.25, 0.40),
    (RIGHT_EYE_OUTER, 0.75, 0.40),
    (LEFT_EYE_TOP, 0.34, 0.37),
    (RIGHT_EYE_TOP, 0.66, 0.37),
    (UPPER_LIP_CENTER, 0.5, 0.745),
    (LOWER_LIP_CENTER, 0.5, 0.80),
    (LEFT_MOUTH_CORNER, 0.38, 0.77),
    (RIGHT_MOUTH_CORNER, 0.62, 0.77),
];

fn cell_xy(cell: usize) -> (f64, f64) {
    let (col, row) = (cell % GRID_COLS, cell / GRID_COLS);
    let x = GRID_X.0 + (GRID_X.1 - GRID_X.0) * (col as f64) / ((GRID_COLS - 1) as f64);
    let y = GRID_Y.0 + (GRID_Y.1 - GRID_Y.0) * (row as f64) / ((GRID_ROWS - 1) as f64);
    (x, y)
}

/// Give `index` the free cell closest to `(x, y)`; earlier cells win ties.
fn claim(cell_of: &mut [Option<usize>], taken: &mut [bool], index: usize, x: f64, y: f64) {
    if cell_of[index].is_some() {
        return;
    }
    let mut best: Option<(f64, usize)> = None;
    for (cell, _) in taken.iter().enumerate().filter(|(_, t)| !**t) {
        let (cx, cy) = cell_xy(cell);
        let d = (cx - x).hypot(cy - y);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, cell));
        }
    }
    if let Some((_, cell)) = best {
        taken[cell] = true;
        cell_of[index] = Some(cell);
    }
}

fn build_canonical() -> Template {
    let cells = GRID_COLS * GRID_ROWS;
    let mut cell_of: Vec<Option<usize>> = vec![None; LANDMARK_COUNT];
    let mut taken = vec![false; cells];

    for (index, x, y) in ANCHORS {
        claim(&mut cell_of, &mut taken, index, x, y);
    }
    let groups: [(&[usize], f64, f64); 5] = [
        (&landmarks::LEFT_EYE, 0.34, 0.40),
        (&landmarks::RIGHT_EYE, 0.66, 0.40),
        (&landmarks::LIPS, 0.5, 0.76),
        (&landmarks::LEFT_BROW, 0.34, 0.30),
        (&landmarks::RIGHT_BROW, 0.66, 0.30),
    ];
    for (group, x, y) in groups {
        for &index in group {
            claim(&mut cell_of, &mut taken, index, x, y);
        }
    }

    let mut free = (0..cells).filter(|&c| !taken[c]);
    for slot in cell_of.iter_mut().filter(|s| s.is_none()) {
        *slot = free.next();
    }

    let mut index_at = vec![0usize; cells];
    let mut points = Vec::with_capacity(LANDMARK_COUNT);
    for (index, cell) in cell_of.iter().enumerate() {
        let cell = cell.unwrap_or(index);
        index_at[cell] = index;
        let (x, y) = cell_xy(cell);
        let r2 = ((x - 0.5) / 0.35).powi(2) + ((y - 0.515) / 0.435).powi(2);
        let z = -0.08 * (1.0 - r2).max(0.0);
        points.push([x, y, z]);
    }

    let mut triangles = Vec::with_capacity((GRID_COLS - 1) * (GRID_ROWS - 1) * 2);
    for row in 0..GRID_ROWS - 1 {
        for col in 0..GRID_COLS - 1 {
            let a = index_at[row * GRID_COLS + col];
            let b = index_at[row * GRID_COLS + col + 1];
            let c = index_at[(row + 1) * GRID_COLS + col];
            let d = index_at[(row + 1) * GRID_COLS + col + 1];
            triangles.push([a, b, c]);
            triangles.push([b, d, c]);
        }
    }

    let feature_triangles = feature_triangles_of(&triangles);
    Template {
        points,
        triangles,
        feature_triangles,
        keys: TemplateKeys::default(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/calibration/template.rs"]
mod tests;
