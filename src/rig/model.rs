use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Context;

use crate::{
    foundation::core::{ImageSize, Point},
    foundation::error::{SpromojiError, SpromojiResult},
    foundation::math::is_unit_interval,
    rig::blendshape::{BlendShape, Displacement},
};

/// Where a rig comes from.
#[derive(Clone, Debug)]
pub enum RigSource {
    /// A rig JSON file on disk.
    Path(PathBuf),
    /// Rig JSON text.
    Json(String),
    /// A rig assembled in memory (e.g. by [`crate::rig_from_regions`]).
    Prebuilt(Rig),
}

/// Author-facing description of a single vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexDef {
    pub id: u32,
    pub u: f64,
    pub v: f64,
    pub weights: BTreeMap<BlendShape, Displacement>,
}

impl VertexDef {
    pub fn new(id: u32, u: f64, v: f64) -> Self {
        Self {
            id,
            u,
            v,
            weights: BTreeMap::new(),
        }
    }

    pub fn with_weight(mut self, shape: BlendShape, weight: Displacement) -> Self {
        self.weights.insert(shape, weight);
        self
    }
}

/// A rig vertex bound to an image.
///
/// Texture anchor and base position are fixed; only the render position moves.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    id: u32,
    u: f64,
    v: f64,
    weights: Vec<(BlendShape, Displacement)>,
    base: Point,
    pub(crate) pos: Point,
}

impl Vertex {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn u(&self) -> f64 {
        self.u
    }

    pub fn v(&self) -> f64 {
        self.v
    }

    pub fn weights(&self) -> &[(BlendShape, Displacement)] {
        &self.weights
    }

    /// Image-space anchor, `(u * width, v * height)`.
    pub fn base(&self) -> Point {
        self.base
    }

    /// Current smoothed render position.
    pub fn position(&self) -> Point {
        self.pos
    }
}

/// Triangulated mesh anchored to an avatar image.
///
/// Topology is immutable once built; vertex render positions are updated every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Rig {
    image: ImageSize,
    vertices: Vec<Vertex>,
    triangles: Vec<[usize; 3]>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct RigFile {
    vertices: Vec<VertexRecord>,
    triangles: Vec<[usize; 3]>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct VertexRecord {
    id: u32,
    u: f64,
    v: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    weights: BTreeMap<String, Displacement>,
}

impl Rig {
    /// Validate topology and bind vertices to `image`.
    pub fn new(
        vertices: Vec<VertexDef>,
        triangles: Vec<[usize; 3]>,
        image: ImageSize,
    ) -> SpromojiResult<Self> {
        if vertices.is_empty() {
            return Err(SpromojiError::rig_load("rig has no vertices"));
        }
        if triangles.is_empty() {
            return Err(SpromojiError::rig_load("rig has no triangles"));
        }

        let mut ids = BTreeSet::new();
        for v in &vertices {
            if !ids.insert(v.id) {
                return Err(SpromojiError::rig_load(format!(
                    "duplicate vertex id {}",
                    v.id
                )));
            }
            if !is_unit_interval(v.u) || !is_unit_interval(v.v) {
                return Err(SpromojiError::rig_load(format!(
                    "vertex {} has u/v outside [0, 1]",
                    v.id
                )));
            }
            if let Some((shape, _)) = v.weights.iter().find(|(_, w)| !w.is_finite()) {
                return Err(SpromojiError::rig_load(format!(
                    "vertex {} has non-finite weight for '{}'",
                    v.id,
                    shape.name()
                )));
            }
        }

        for (ti, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i >= vertices.len()) {
                return Err(SpromojiError::rig_load(format!(
                    "triangle {ti} references vertex index {bad} (only {} vertices)",
                    vertices.len()
                )));
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(SpromojiError::rig_load(format!(
                    "triangle {ti} repeats a vertex index"
                )));
            }
        }

        let vertices = vertices
            .into_iter()
            .map(|d| {
                let base = image.to_pixels(d.u, d.v);
                Vertex {
                    id: d.id,
                    u: d.u,
                    v: d.v,
                    weights: d.weights.into_iter().collect(),
                    base,
                    pos: base,
                }
            })
            .collect();

        Ok(Self {
            image,
            vertices,
            triangles,
        })
    }

    /// Load a rig from `source` and bind it to `image`.
    #[tracing::instrument(skip(source))]
    pub fn load(source: RigSource, image: ImageSize) -> SpromojiResult<Self> {
        match source {
            RigSource::Path(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("read rig file '{}'", path.display()))
                    .map_err(|e| SpromojiError::rig_load(format!("{e:#}")))?;
                Self::from_json(&text, image)
            }
            RigSource::Json(text) => Self::from_json(&text, image),
            RigSource::Prebuilt(rig) => {
                if rig.image != image {
                    return Ok(rig.rebind(image));
                }
                Ok(rig)
            }
        }
    }

    /// Parse the rig-file format (`vertices` + `triangles`).
    ///
    /// Weight keys that are not a recognized [`BlendShape`] are dropped with a warning.
    pub fn from_json(text: &str, image: ImageSize) -> SpromojiResult<Self> {
        let file: RigFile = serde_json::from_str(text)
            .map_err(|e| SpromojiError::rig_load(format!("malformed rig json: {e}")))?;

        let vertices = file
            .vertices
            .into_iter()
            .map(|rec| {
                let mut weights = BTreeMap::new();
                for (name, w) in rec.weights {
                    match BlendShape::from_name(&name) {
                        Some(shape) => {
                            weights.insert(shape, w);
                        }
                        None => {
                            tracing::warn!(vertex = rec.id, key = %name, "ignoring unrecognized blendshape weight");
                        }
                    }
                }
                VertexDef {
                    id: rec.id,
                    u: rec.u,
                    v: rec.v,
                    weights,
                }
            })
            .collect();

        Self::new(vertices, file.triangles, image)
    }

    /// Serialize back into the rig-file format.
    pub fn to_json(&self) -> SpromojiResult<String> {
        let file = RigFile {
            vertices: self
                .vertices
                .iter()
                .map(|v| VertexRecord {
                    id: v.id,
                    u: v.u,
                    v: v.v,
                    weights: v
                        .weights
                        .iter()
                        .map(|(s, w)| (s.name().to_string(), *w))
                        .collect(),
                })
                .collect(),
            triangles: self.triangles.clone(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| SpromojiError::serde(e.to_string()))
    }

    /// Same topology and weights anchored to a differently sized image.
    pub fn rebind(&self, image: ImageSize) -> Self {
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let base = image.to_pixels(v.u, v.v);
                Vertex {
                    base,
                    pos: base,
                    ..v.clone()
                }
            })
            .collect();
        Self {
            image,
            vertices,
            triangles: self.triangles.clone(),
        }
    }

    pub fn image_size(&self) -> ImageSize {
        self.image
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Snap every render position back to its base anchor.
    pub fn reset_positions(&mut self) {
        for v in &mut self.vertices {
            v.pos = v.base;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/model.rs"]
mod tests;
