//! Rig synthesis from detected regions or an aligned template.

use crate::{
    calibration::align::AlignedTemplate,
    detect::region::RegionSet,
    foundation::core::{ImageSize, Point},
    foundation::error::SpromojiResult,
    foundation::landmarks::{
        CHIN_BOTTOM, LEFT_BROW, LEFT_EYE, LOWER_LIP, RIGHT_BROW, RIGHT_EYE,
    },
    rig::blendshape::{BlendShape, Displacement},
    rig::model::{Rig, VertexDef},
};

const EYE_BLINK_WEIGHT: f64 = -5.0;
const JAW_OPEN_WEIGHT: f64 = 8.0;
const BROW_DOWN_WEIGHT: f64 = 2.0;
/// Brow height above the eyes, as a fraction of image height.
const BROW_LIFT: f64 = 0.1;

/// Fixed topology of the minimal rig: eyes to mouth corners, brow to outer eye corners.
pub const REGION_RIG_TRIANGLES: [[usize; 3]; 7] = [
    [0, 1, 4],
    [1, 3, 4],
    [3, 5, 4],
    [3, 2, 5],
    [4, 5, 6],
    [7, 0, 1],
    [7, 3, 2],
];

fn uv(image: ImageSize, p: Point) -> (f64, f64) {
    let n = image.to_normalized(p);
    (n.x.clamp(0.0, 1.0), n.y.clamp(0.0, 1.0))
}

fn vertex(id: u32, image: ImageSize, p: Point) -> VertexDef {
    let (u, v) = uv(image, p);
    VertexDef::new(id, u, v)
}

/// Minimal 8-vertex / 7-triangle rig from eye and mouth boxes.
///
/// Vertex order: left eye top-left and bottom-right, right eye top-right and
/// bottom-left, mouth left and right corners, mouth bottom-center, brow.
#[tracing::instrument(skip(regions), fields(method = ?regions.label))]
pub fn rig_from_regions(regions: &RegionSet, image: ImageSize) -> SpromojiResult<Rig> {
    let (le, re, m) = (regions.left_eye, regions.right_eye, regions.mouth);
    let blink = Displacement::uniform(EYE_BLINK_WEIGHT);
    let jaw = Displacement::uniform(JAW_OPEN_WEIGHT);
    let brow = Displacement::uniform(BROW_DOWN_WEIGHT);

    let mid_y = m.y + (m.h * 0.5);
    let brow_x = (le.center().x + re.center().x) * 0.5;
    let brow_y = le.y.min(re.y) - (BROW_LIFT * image.height_f64());

    let vertices = vec![
        vertex(0, image, Point::new(le.x, le.y)).with_weight(BlendShape::EyeBlinkLeft, blink),
        vertex(1, image, Point::new(le.right(), le.bottom()))
            .with_weight(BlendShape::EyeBlinkLeft, blink),
        vertex(2, image, Point::new(re.right(), re.y))
            .with_weight(BlendShape::EyeBlinkRight, blink),
        vertex(3, image, Point::new(re.x, re.bottom()))
            .with_weight(BlendShape::EyeBlinkRight, blink),
        vertex(4, image, Point::new(m.x, mid_y)).with_weight(BlendShape::JawOpen, jaw),
        vertex(5, image, Point::new(m.right(), mid_y)).with_weight(BlendShape::JawOpen, jaw),
        vertex(6, image, Point::new(m.center().x, m.bottom()))
            .with_weight(BlendShape::JawOpen, jaw),
        vertex(7, image, Point::new(brow_x, brow_y))
            .with_weight(BlendShape::BrowDownLeft, brow)
            .with_weight(BlendShape::BrowDownRight, brow),
    ];

    Rig::new(vertices, REGION_RIG_TRIANGLES.to_vec(), image)
}

/// Full-mesh rig from a calibrated template.
///
/// Displacements are vertical only: eye groups blink, lower lip and chin follow the
/// jaw, brows lower.
#[tracing::instrument(skip(aligned), fields(points = aligned.landmarks.len()))]
pub fn rig_from_aligned_template(
    aligned: &AlignedTemplate,
    image: ImageSize,
) -> SpromojiResult<Rig> {
    let vertical = |w: f64| Displacement { x: 0.0, y: w };
    let vertices = aligned
        .landmarks
        .iter()
        .enumerate()
        .map(|(i, lm)| {
            let mut def = vertex(i as u32, image, lm.point());
            if LEFT_EYE.contains(&i) {
                def = def.with_weight(BlendShape::EyeBlinkLeft, vertical(EYE_BLINK_WEIGHT));
            }
            if RIGHT_EYE.contains(&i) {
                def = def.with_weight(BlendShape::EyeBlinkRight, vertical(EYE_BLINK_WEIGHT));
            }
            if LOWER_LIP.contains(&i) || i == CHIN_BOTTOM {
                def = def.with_weight(BlendShape::JawOpen, vertical(JAW_OPEN_WEIGHT));
            }
            if LEFT_BROW.contains(&i) {
                def = def.with_weight(BlendShape::BrowDownLeft, vertical(BROW_DOWN_WEIGHT));
            }
            if RIGHT_BROW.contains(&i) {
                def = def.with_weight(BlendShape::BrowDownRight, vertical(BROW_DOWN_WEIGHT));
            }
            def
        })
        .collect();

    Rig::new(vertices, aligned.triangles.clone(), image)
}

#[cfg(test)]
#[path = "../../tests/unit/rig/builder.rs"]
mod tests;
