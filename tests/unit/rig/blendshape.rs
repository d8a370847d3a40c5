use super::*;

#[test]
fn names_resolve_both_ways() {
    for shape in BlendShape::ALL {
        assert_eq!(BlendShape::from_name(shape.name()), Some(shape));
    }
    assert_eq!(BlendShape::from_name("tongueOut"), None);
    assert_eq!(BlendShape::from_name("JawOpen"), None);
}

#[test]
fn serde_uses_tracker_names() {
    let s = serde_json::to_string(&BlendShape::BrowDownLeft).unwrap();
    assert_eq!(s, "\"browDownLeft\"");
    let back: BlendShape = serde_json::from_str("\"jawOpen\"").unwrap();
    assert_eq!(back, BlendShape::JawOpen);
}

#[test]
fn first_sample_is_taken_verbatim_then_smoothed() {
    let mut st = BlendState::new();
    assert!(st.is_empty());
    assert_eq!(st.value(BlendShape::JawOpen), 0.0);

    st.smooth_toward(BlendShape::JawOpen, 0.4, 0.85);
    assert_eq!(st.get(BlendShape::JawOpen), Some(0.4));

    st.smooth_toward(BlendShape::JawOpen, 1.0, 0.5);
    assert!((st.value(BlendShape::JawOpen) - 0.7).abs() < 1e-12);
    assert_eq!(st.get(BlendShape::EyeBlinkLeft), None);
}

#[test]
fn steady_input_converges_and_then_stays_fixed() {
    let mut st = BlendState::new();
    st.smooth_toward(BlendShape::EyeBlinkLeft, 0.0, 0.85);
    for _ in 0..64 {
        st.smooth_toward(BlendShape::EyeBlinkLeft, 0.6, 0.85);
    }
    let settled = st.value(BlendShape::EyeBlinkLeft);
    assert!((settled - 0.6).abs() < 1e-12);

    st.smooth_toward(BlendShape::EyeBlinkRight, 0.3, 0.85);
    for _ in 0..10 {
        st.smooth_toward(BlendShape::EyeBlinkRight, 0.3, 0.85);
        assert_eq!(st.value(BlendShape::EyeBlinkRight), 0.3);
    }
}

#[test]
fn clear_and_iter() {
    let mut st = BlendState::new();
    st.smooth_toward(BlendShape::MouthSmile, 0.2, 0.85);
    st.smooth_toward(BlendShape::EyeBlinkLeft, 0.9, 0.85);
    let set: Vec<_> = st.iter().collect();
    assert_eq!(
        set,
        vec![(BlendShape::EyeBlinkLeft, 0.9), (BlendShape::MouthSmile, 0.2)]
    );
    st.clear();
    assert!(st.is_empty());
}

#[test]
fn displacement_accepts_scalar_or_axes() {
    let d: Displacement = serde_json::from_str("-5").unwrap();
    assert_eq!(d, Displacement::uniform(-5.0));
    let d: Displacement = serde_json::from_str(r#"{"y": 3.5}"#).unwrap();
    assert_eq!(d, Displacement { x: 0.0, y: 3.5 });

    assert_eq!(serde_json::to_string(&Displacement::uniform(8.0)).unwrap(), "8.0");
    let axes = serde_json::to_value(Displacement { x: 1.0, y: 2.0 }).unwrap();
    assert_eq!(axes, serde_json::json!({"x": 1.0, "y": 2.0}));
}
