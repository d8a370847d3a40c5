use super::*;

fn known() -> CalibrationTransform {
    CalibrationTransform {
        scale: 1.3,
        rotation: 0.2,
        tx: 0.05,
        ty: -0.03,
        rms_error: 0.0,
    }
}

fn taps_for(t: &CalibrationTransform, target: ImageSize) -> Vec<Point> {
    Template::canonical()
        .key_points()
        .iter()
        .map(|&(x, y)| {
            let p = t.apply(Point::new(x, y));
            Point::new(p.x * target.width_f64(), p.y * target.height_f64())
        })
        .collect()
}

#[test]
fn recovers_a_known_similarity() {
    let target = ImageSize::new(400, 400).unwrap();
    let truth = known();
    let aligned = align_template(&taps_for(&truth, target), target).unwrap();
    let got = aligned.transform;

    assert!((got.scale - truth.scale).abs() / truth.scale < 0.01, "{got:?}");
    assert!((got.rotation - truth.rotation).abs() < 0.01, "{got:?}");
    assert!((got.tx - truth.tx).abs() < 1e-9);
    assert!((got.ty - truth.ty).abs() < 1e-9);
    assert!(got.rms_error < 1e-6);
}

#[test]
fn recovers_on_a_non_square_target() {
    let target = ImageSize::new(400, 200).unwrap();
    let truth = CalibrationTransform {
        scale: 0.9,
        rotation: -0.1,
        tx: 0.08,
        ty: 0.02,
        rms_error: 0.0,
    };
    let got = align_template(&taps_for(&truth, target), target)
        .unwrap()
        .transform;
    assert!((got.scale - 0.9).abs() < 1e-9);
    assert!((got.rotation + 0.1).abs() < 1e-9);
    assert!(got.rms_error < 1e-6);
}

#[test]
fn aligned_landmarks_land_on_taps_and_keep_depth() {
    let target = ImageSize::new(400, 400).unwrap();
    let taps = taps_for(&known(), target);
    let aligned = align_template(&taps, target).unwrap();
    let template = Template::canonical();

    assert_eq!(aligned.landmarks.len(), template.points().len());
    for (key, tap) in template.keys().as_array().iter().zip(&taps) {
        let lm = aligned.landmarks[*key];
        assert!(lm.point().distance(*tap) < 1e-6);
    }
    for (lm, p) in aligned.landmarks.iter().zip(template.points()) {
        assert_eq!(lm.z, p[2]);
    }
    assert_eq!(aligned.triangles, template.triangles());
    assert_eq!(aligned.feature_triangles, template.feature_triangles());
    assert_eq!(aligned.target, target);
}

#[test]
fn identity_taps_give_identity_transform() {
    let target = ImageSize::new(100, 100).unwrap();
    let identity = CalibrationTransform {
        scale: 1.0,
        rotation: 0.0,
        tx: 0.0,
        ty: 0.0,
        rms_error: 0.0,
    };
    let got = align_template(&taps_for(&identity, target), target)
        .unwrap()
        .transform;
    assert!((got.scale - 1.0).abs() < 1e-12);
    assert!(got.rotation.abs() < 1e-12);
    assert!(got.tx.abs() < 1e-12 && got.ty.abs() < 1e-12);
}

#[test]
fn imperfect_taps_report_residual() {
    let target = ImageSize::new(400, 400).unwrap();
    let mut taps = taps_for(&known(), target);
    taps[2].x += 20.0;
    let got = align_template(&taps, target).unwrap().transform;
    assert!(got.rms_error > 1.0);
    assert!(got.scale > 0.0);
}

#[test]
fn apply_matches_affine() {
    let t = known();
    let p = Point::new(0.3, 0.7);
    let (sin, cos) = t.rotation.sin_cos();
    let expected = Point::new(
        t.scale * (cos * p.x - sin * p.y) + t.tx,
        t.scale * (sin * p.x + cos * p.y) + t.ty,
    );
    assert!(t.apply(p).distance(expected) < 1e-12);
}

#[test]
fn wrong_point_count_is_invalid_input() {
    let target = ImageSize::new(100, 100).unwrap();
    for n in [0, 2, 4] {
        let pts = vec![Point::new(10.0, 10.0); n];
        let err = align_template(&pts, target).unwrap_err();
        assert!(matches!(err, SpromojiError::InvalidInput(_)), "{n}: {err}");
    }
}

#[test]
fn taps_far_outside_target_are_rejected() {
    let target = ImageSize::new(100, 100).unwrap();
    let far = [
        Point::new(-30.0, 40.0),
        Point::new(60.0, 40.0),
        Point::new(50.0, 70.0),
    ];
    assert!(matches!(
        align_template(&far, target),
        Err(SpromojiError::InvalidInput(_))
    ));

    let near = [
        Point::new(-5.0, 40.0),
        Point::new(60.0, 40.0),
        Point::new(50.0, 105.0),
    ];
    assert!(align_template(&near, target).is_ok());

    let nan = [
        Point::new(f64::NAN, 40.0),
        Point::new(60.0, 40.0),
        Point::new(50.0, 70.0),
    ];
    assert!(align_template(&nan, target).is_err());
}

#[test]
fn coincident_taps_are_rejected() {
    let target = ImageSize::new(100, 100).unwrap();
    let same = [Point::new(50.0, 50.0); 3];
    assert!(matches!(
        align_template(&same, target),
        Err(SpromojiError::InvalidInput(_))
    ));
}
