//! Similarity (Procrustes) alignment of the template onto three calibration taps.

use crate::{
    calibration::template::Template,
    foundation::core::{Affine, ImageSize, Landmark, Point, Vec2},
    foundation::error::{SpromojiError, SpromojiResult},
};

/// How far outside the target a tap may land, as a fraction of its size.
pub const DEFAULT_CALIBRATION_MARGIN: f64 = 0.1;

/// Recovered template-to-target similarity, in normalized coordinates.
///
/// A template point `p` maps to `scale * R(rotation) * p + (tx, ty)`; multiply by the
/// target size to get pixels. `rms_error` is in target pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationTransform {
    pub scale: f64,
    pub rotation: f64,
    pub tx: f64,
    pub ty: f64,
    pub rms_error: f64,
}

impl CalibrationTransform {
    /// Scale and rotate, then translate.
    pub fn apply(&self, p: Point) -> Point {
        self.to_affine() * p
    }

    pub fn to_affine(&self) -> Affine {
        let (sin, cos) = self.rotation.sin_cos();
        let (a, b) = (self.scale * cos, self.scale * sin);
        Affine::new([a, b, -b, a, self.tx, self.ty])
    }
}

/// The full template mapped into target pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedTemplate {
    pub landmarks: Vec<Landmark>,
    pub triangles: Vec<[usize; 3]>,
    pub feature_triangles: Vec<usize>,
    pub transform: CalibrationTransform,
    pub target: ImageSize,
}

/// Align the canonical template to `[leftEye, rightEye, mouth]` taps in target pixels.
pub fn align_template(points: &[Point], target: ImageSize) -> SpromojiResult<AlignedTemplate> {
    align_template_with(
        Template::canonical(),
        points,
        target,
        DEFAULT_CALIBRATION_MARGIN,
    )
}

/// [`align_template`] against an arbitrary template and tap margin.
#[tracing::instrument(skip(template, points), fields(taps = points.len()))]
pub fn align_template_with(
    template: &Template,
    points: &[Point],
    target: ImageSize,
    margin: f64,
) -> SpromojiResult<AlignedTemplate> {
    let taps: [Point; 3] = points.try_into().map_err(|_| {
        SpromojiError::invalid_input(format!(
            "calibration needs exactly 3 points, got {}",
            points.len()
        ))
    })?;
    let (w, h) = (target.width_f64(), target.height_f64());
    for (i, p) in taps.iter().enumerate() {
        if !p.is_finite() {
            return Err(SpromojiError::invalid_input(format!(
                "calibration point {i} is not finite"
            )));
        }
        let inside = p.x >= -margin * w
            && p.x <= (1.0 + margin) * w
            && p.y >= -margin * h
            && p.y <= (1.0 + margin) * h;
        if !inside {
            return Err(SpromojiError::invalid_input(format!(
                "calibration point {i} ({:.1}, {:.1}) is outside the {}x{} target",
                p.x, p.y, target.width, target.height
            )));
        }
    }

    let user = taps.map(|p| target.to_normalized(p));
    let tmpl = template.key_points().map(|(x, y)| Point::new(x, y));

    let centroid = |pts: &[Point; 3]| {
        let s = pts.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        Point::new(s.0 / 3.0, s.1 / 3.0)
    };
    let (cu, ct) = (centroid(&user), centroid(&tmpl));
    let du = user.map(|p| p - cu);
    let dt = tmpl.map(|p| p - ct);

    let norm = |d: &[Vec2; 3]| d.iter().map(|v| v.hypot2()).sum::<f64>().sqrt();
    let (nu, nt) = (norm(&du), norm(&dt));
    if nt < f64::EPSILON {
        return Err(SpromojiError::invalid_input(
            "template key points coincide",
        ));
    }
    if nu < f64::EPSILON {
        return Err(SpromojiError::invalid_input(
            "calibration points coincide",
        ));
    }
    let scale = nu / nt;

    let (mut cross, mut dot) = (0.0, 0.0);
    for (t, u) in dt.iter().zip(&du) {
        cross += t.x * u.y - t.y * u.x;
        dot += t.x * u.x + t.y * u.y;
    }
    let rotation = cross.atan2(dot);

    let mut transform = CalibrationTransform {
        scale,
        rotation,
        tx: 0.0,
        ty: 0.0,
        rms_error: 0.0,
    };
    // Translation carries the rotated, scaled template centroid onto the tap centroid.
    let moved = transform.apply(ct);
    transform.tx = cu.x - moved.x;
    transform.ty = cu.y - moved.y;

    let to_px = |p: Point| Point::new(p.x * w, p.y * h);
    let sq: f64 = tmpl
        .iter()
        .zip(&taps)
        .map(|(&t, &tap)| to_px(transform.apply(t)).distance_squared(tap))
        .sum();
    transform.rms_error = (sq / 3.0).sqrt();

    let affine = transform.to_affine();
    let landmarks = template
        .points()
        .iter()
        .map(|&[x, y, z]| {
            let p = to_px(affine * Point::new(x, y));
            Landmark::new(p.x, p.y, z)
        })
        .collect();

    tracing::debug!(
        scale,
        rotation,
        tx = transform.tx,
        ty = transform.ty,
        rms = transform.rms_error,
        "template aligned"
    );

    Ok(AlignedTemplate {
        landmarks,
        triangles: template.triangles().to_vec(),
        feature_triangles: template.feature_triangles().to_vec(),
        transform,
        target,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/calibration/align.rs"]
mod tests;
