use image::{Rgba, RgbaImage};

use super::*;
use crate::estimate::pose::PoseBlendEstimator;
use crate::estimate::pose::TrackingFrame;
use crate::foundation::core::ImageSize;
use crate::render::cpu::CpuSurface;
use crate::render::surface::RecordingSurface;
use crate::rig::blendshape::{BlendShape, Displacement};
use crate::rig::model::VertexDef;

fn rel_close(a: Point, b: Point) -> bool {
    let scale = 1.0_f64.max(b.x.abs()).max(b.y.abs());
    (a - b).hypot() <= 1e-6 * scale
}

fn avatar(w: u32, h: u32) -> AvatarImage {
    AvatarImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba([20, 200, 40, 255]))).unwrap()
}

fn one_triangle_rig() -> Rig {
    let size = ImageSize::new(100, 100).unwrap();
    Rig::new(
        vec![
            VertexDef::new(0, 0.0, 0.0)
                .with_weight(BlendShape::JawOpen, Displacement::uniform(10.0)),
            VertexDef::new(1, 1.0, 0.0),
            VertexDef::new(2, 0.0, 1.0),
        ],
        vec![[0, 1, 2]],
        size,
    )
    .unwrap()
}

fn blend(scores: &[(&str, f64)]) -> BlendState {
    let mut est = PoseBlendEstimator::default();
    est.update(&TrackingFrame::from_scores(scores.iter().copied()));
    est.blend().clone()
}

#[test]
fn affine_maps_each_source_vertex_onto_its_destination() {
    let cases = [
        (
            [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)],
            [(3.0, 4.0), (110.0, -2.0), (-5.0, 97.0)],
        ),
        (
            [(12.5, 40.0), (300.0, 41.0), (150.0, 260.0)],
            [(10.0, 45.0), (310.0, 30.0), (140.0, 275.5)],
        ),
        (
            [(1e4, 1e4), (1e4 + 3.0, 1e4), (1e4, 1e4 + 2.0)],
            [(0.0, 0.0), (6.0, 0.0), (0.0, 4.0)],
        ),
        (
            [(0.0, 0.0), (1.0, 2.0), (2.0, 1.0)],
            [(5.0, 5.0), (4.0, 9.0), (9.0, 4.0)],
        ),
    ];
    for (src, dst) in cases {
        let src = src.map(Point::from);
        let dst = dst.map(Point::from);
        let m = solve_affine(src, dst, 1e-6).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            assert!(rel_close(m * *s, *d), "{:?} -> {:?}, want {d:?}", s, m * *s);
        }
    }
}

#[test]
fn degenerate_source_triangles_are_rejected() {
    let dst = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)].map(Point::from);
    let collinear = [(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)].map(Point::from);
    let identical = [Point::new(3.0, 3.0); 3];
    assert!(solve_affine(collinear, dst, 1e-6).is_none());
    assert!(solve_affine(identical, dst, 1e-6).is_none());
}

#[test]
fn vertices_ease_toward_weighted_targets() {
    let mut rig = one_triangle_rig();
    let renderer = MeshWarpRenderer::default();
    renderer.update_vertices(&mut rig, &blend(&[("jawOpen", 1.0)]), OrientState::default());

    let v0 = rig.vertices()[0].position();
    assert!((v0.y - 7.5).abs() < 1e-12);
    assert!((v0.x - 7.5).abs() < 1e-12);
    assert_eq!(rig.vertices()[1].position(), rig.vertices()[1].base());

    renderer.update_vertices(&mut rig, &blend(&[("jawOpen", 1.0)]), OrientState::default());
    let v0 = rig.vertices()[0].position();
    assert!((v0.y - 9.375).abs() < 1e-12);
}

#[test]
fn orientation_offsets_every_vertex_uniformly() {
    let mut rig = one_triangle_rig();
    let orient = OrientState {
        yaw: 0.5,
        pitch: -0.25,
    };
    MeshWarpRenderer::default().update_vertices(&mut rig, &BlendState::new(), orient);
    for v in rig.vertices() {
        let d = v.position() - v.base();
        assert!((d.x - 1.5).abs() < 1e-12 && (d.y + 0.75).abs() < 1e-12);
    }
}

#[test]
fn rasterize_records_clip_and_texture_mapping_per_triangle() {
    let mut rig = one_triangle_rig();
    let renderer = MeshWarpRenderer::default();
    renderer.update_vertices(&mut rig, &blend(&[("jawOpen", 1.0)]), OrientState::default());

    let mut surface = RecordingSurface::new(100, 100);
    let stats = renderer
        .rasterize(&rig, &avatar(100, 100), OrientState::default(), &mut surface)
        .unwrap();
    assert_eq!(
        stats,
        RenderStats {
            triangles_drawn: 1,
            triangles_skipped: 0
        }
    );
    assert_eq!(surface.stack_depth(), 0);

    let (m, clip, opacity) = surface.draws().next().unwrap();
    assert_eq!(opacity, 1.0);
    for v in rig.vertices() {
        assert!(rel_close(*m * v.base(), v.position()));
    }
    let corners: [Point; 3] = [0, 1, 2].map(|i| rig.vertices()[i].position());
    let expected = triangle_path(corners);
    assert_eq!(clip, Some(&expected));
}

#[test]
fn degenerate_triangles_are_skipped_and_counted() {
    let size = ImageSize::new(50, 50).unwrap();
    let rig = Rig::new(
        vec![
            VertexDef::new(0, 0.0, 0.0),
            VertexDef::new(1, 1.0, 0.0),
            VertexDef::new(2, 0.0, 1.0),
            VertexDef::new(3, 0.5, 0.0),
        ],
        vec![[0, 1, 2], [0, 3, 1]],
        size,
    )
    .unwrap();
    let mut surface = RecordingSurface::new(50, 50);
    let stats = MeshWarpRenderer::default()
        .rasterize(&rig, &avatar(50, 50), OrientState::default(), &mut surface)
        .unwrap();
    assert_eq!(stats.triangles_drawn, 1);
    assert_eq!(stats.triangles_skipped, 1);
    assert_eq!(surface.draws().count(), 1);
}

#[test]
fn depth_pass_redraws_shifted_and_translucent() {
    let rig = one_triangle_rig();
    let renderer = MeshWarpRenderer::new(RenderSettings {
        depth_pass: Some(DepthPass::default()),
        ..RenderSettings::default()
    });
    let orient = OrientState {
        yaw: 0.5,
        pitch: 0.0,
    };
    let mut surface = RecordingSurface::new(100, 100);
    let stats = renderer
        .rasterize(&rig, &avatar(100, 100), orient, &mut surface)
        .unwrap();
    assert_eq!(stats.triangles_drawn, 1);

    let draws: Vec<_> = surface.draws().collect();
    assert_eq!(draws.len(), 2);
    let (main, _, _) = draws[0];
    let (shifted, _, opacity) = draws[1];
    assert_eq!(opacity, 0.35);
    let p = Point::new(10.0, 10.0);
    assert!(rel_close(*shifted * p, *main * p + Vec2::new(-3.0, 0.0)));
}

#[test]
fn render_frame_clears_before_drawing() {
    let mut rig = one_triangle_rig();
    let mut surface = RecordingSurface::new(100, 100);
    MeshWarpRenderer::default()
        .render_frame(
            &mut rig,
            &BlendState::new(),
            OrientState::default(),
            &avatar(100, 100),
            &mut surface,
            [9, 9, 9, 255],
        )
        .unwrap();
    assert_eq!(
        surface.ops()[0],
        crate::render::surface::SurfaceOp::Clear([9, 9, 9, 255])
    );
    assert_eq!(surface.draws().count(), 1);
}

#[test]
fn identity_mesh_reproduces_the_avatar_on_cpu() {
    let size = ImageSize::new(16, 16).unwrap();
    let rig = Rig::new(
        vec![
            VertexDef::new(0, 0.0, 0.0),
            VertexDef::new(1, 1.0, 0.0),
            VertexDef::new(2, 0.0, 1.0),
            VertexDef::new(3, 1.0, 1.0),
        ],
        vec![[0, 1, 2], [1, 3, 2]],
        size,
    )
    .unwrap();
    let mut surface = CpuSurface::new(16, 16).unwrap();
    surface.clear([0, 0, 0, 0]);
    MeshWarpRenderer::default()
        .rasterize(&rig, &avatar(16, 16), OrientState::default(), &mut surface)
        .unwrap();
    let frame = surface.finish();
    for (x, y) in [(2, 2), (10, 1), (1, 10), (13, 13)] {
        let px = frame.pixel(x, y);
        assert!(px[1] >= 195 && px[3] >= 250, "({x}, {y}) = {px:?}");
    }
}
