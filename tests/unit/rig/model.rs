use super::*;

fn size() -> ImageSize {
    ImageSize::new(100, 100).unwrap()
}

const ONE_TRIANGLE: &str = r#"{
    "vertices": [
        {"id": 0, "u": 0.0, "v": 0.0, "weights": {"jawOpen": 10}},
        {"id": 1, "u": 1.0, "v": 0.0},
        {"id": 2, "u": 0.0, "v": 1.0, "weights": {}}
    ],
    "triangles": [[0, 1, 2]]
}"#;

#[test]
fn parses_rig_file_and_binds_to_image() {
    let rig = Rig::from_json(ONE_TRIANGLE, size()).unwrap();
    assert_eq!(rig.vertices().len(), 3);
    assert_eq!(rig.triangles(), &[[0, 1, 2]]);

    let v1 = &rig.vertices()[1];
    assert_eq!(v1.base(), Point::new(100.0, 0.0));
    assert_eq!(v1.position(), v1.base());
    assert_eq!(
        rig.vertices()[0].weights(),
        &[(BlendShape::JawOpen, Displacement::uniform(10.0))]
    );
}

#[test]
fn missing_fields_fail_load() {
    for bad in [
        r#"{"triangles": [[0,1,2]]}"#,
        r#"{"vertices": []}"#,
        r#"{"vertices": [{"id": 0, "v": 0.0}], "triangles": []}"#,
        r#"not json"#,
    ] {
        let err = Rig::from_json(bad, size()).unwrap_err();
        assert!(matches!(err, SpromojiError::RigLoad(_)), "{bad}: {err}");
    }
}

#[test]
fn out_of_range_and_repeated_indices_are_rejected() {
    let out_of_range = ONE_TRIANGLE.replace("[[0, 1, 2]]", "[[0, 1, 3]]");
    let err = Rig::from_json(&out_of_range, size()).unwrap_err();
    assert!(err.to_string().contains("vertex index 3"));

    let repeated = ONE_TRIANGLE.replace("[[0, 1, 2]]", "[[0, 1, 1]]");
    assert!(Rig::from_json(&repeated, size()).is_err());

    let two_indices = ONE_TRIANGLE.replace("[[0, 1, 2]]", "[[0, 1]]");
    assert!(Rig::from_json(&two_indices, size()).is_err());

    let negative = ONE_TRIANGLE.replace("[[0, 1, 2]]", "[[0, -1, 2]]");
    assert!(Rig::from_json(&negative, size()).is_err());
}

#[test]
fn uv_outside_unit_square_and_duplicate_ids_are_rejected() {
    let bad_uv = ONE_TRIANGLE.replace(r#""u": 1.0"#, r#""u": 1.5"#);
    assert!(Rig::from_json(&bad_uv, size()).is_err());

    let dup = ONE_TRIANGLE.replace(r#""id": 1"#, r#""id": 0"#);
    let err = Rig::from_json(&dup, size()).unwrap_err();
    assert!(err.to_string().contains("duplicate vertex id"));
}

#[test]
fn unknown_weight_keys_are_dropped() {
    let text = ONE_TRIANGLE.replace(r#"{"jawOpen": 10}"#, r#"{"jawOpen": 10, "tongueOut": 3}"#);
    let rig = Rig::from_json(&text, size()).unwrap();
    assert_eq!(rig.vertices()[0].weights().len(), 1);
}

#[test]
fn json_roundtrip_preserves_topology_and_weights() {
    let rig = Rig::from_json(ONE_TRIANGLE, size()).unwrap();
    let text = rig.to_json().unwrap();
    let back = Rig::from_json(&text, size()).unwrap();
    assert_eq!(rig, back);
}

#[test]
fn load_reports_unreadable_path_as_rig_load_error() {
    let err = Rig::load(
        RigSource::Path(PathBuf::from("/definitely/not/here/rig.json")),
        size(),
    )
    .unwrap_err();
    assert!(matches!(err, SpromojiError::RigLoad(_)));
    assert!(err.to_string().contains("read rig file"));
}

#[test]
fn prebuilt_rig_is_rebound_to_new_image_size() {
    let rig = Rig::from_json(ONE_TRIANGLE, size()).unwrap();
    let bigger = ImageSize::new(200, 50).unwrap();
    let loaded = Rig::load(RigSource::Prebuilt(rig), bigger).unwrap();
    assert_eq!(loaded.image_size(), bigger);
    assert_eq!(loaded.vertices()[1].base(), Point::new(200.0, 0.0));
    assert_eq!(loaded.vertices()[2].base(), Point::new(0.0, 50.0));
}

#[test]
fn reset_positions_returns_to_base() {
    let mut rig = Rig::from_json(ONE_TRIANGLE, size()).unwrap();
    rig.vertices_mut()[0].pos = Point::new(5.0, 5.0);
    rig.reset_positions();
    assert_eq!(rig.vertices()[0].position(), Point::new(0.0, 0.0));
}

#[test]
fn json_roundtrip_keeps_texture_coordinates_bit_exact() {
    let uvs = [(0.1 + 0.2, 0.234), (1.0 / 3.0, 0.7 * 0.334), (0.23399999999999999, 2.0 / 3.0)];
    let defs: Vec<VertexDef> = uvs
        .iter()
        .enumerate()
        .map(|(i, &(u, v))| VertexDef::new(i as u32, u, v))
        .collect();
    let rig = Rig::new(defs, vec![[0, 1, 2]], size()).unwrap();

    let back = Rig::from_json(&rig.to_json().unwrap(), size()).unwrap();
    for (a, b) in rig.vertices().iter().zip(back.vertices()) {
        assert_eq!(a.u().to_bits(), b.u().to_bits());
        assert_eq!(a.v().to_bits(), b.v().to_bits());
    }
}
