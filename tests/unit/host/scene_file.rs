use super::*;

fn key(frame: f64, x: f64) -> Keyframe {
    Keyframe {
        frame,
        value: DVec3::new(x, 0.0, 0.0),
    }
}

#[test]
fn track_interpolates_and_holds_ends() {
    let t = Track(vec![key(0.0, 0.0), key(10.0, 5.0), key(20.0, 5.0)]);
    assert_eq!(t.sample(-3.0).x, 0.0);
    assert!((t.sample(4.0).x - 2.0).abs() < 1e-12);
    assert!((t.sample(15.0).x - 5.0).abs() < 1e-12);
    assert_eq!(t.sample(99.0).x, 5.0);
    assert_eq!(Track::default().sample(1.0), DVec3::ZERO);
}

#[test]
fn partial_json_fills_defaults() {
    let spec = SceneSpec::from_json_str(
        r#"{
            "resolution": { "width": 200, "height": 100, "percentage": 50 },
            "objects": [
                { "id": "cube", "position": [
                    { "frame": 1, "value": [0, 0, 0] },
                    { "frame": 3, "value": [2, 0, 0] }
                ] }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(spec.resolution.effective(), Resolution::new(100, 50));
    assert_eq!(spec.fps, 24);
    assert_eq!(spec.objects[0].kind, ObjectKind::Mesh);
    assert!((spec.objects[0].position.sample(2.0).x - 1.0).abs() < 1e-12);
    assert!(spec.compositor.is_none());
}

#[test]
fn camera_projection_is_tagged() {
    let spec = SceneSpec::from_json_str(
        r#"{ "camera": { "projection": { "type": "orthographic", "half_height": 5 } } }"#,
    )
    .unwrap();
    assert_eq!(
        spec.camera.projection,
        Projection::Orthographic { half_height: 5.0 }
    );
}

#[test]
fn validation_rejects_bad_scenes() {
    assert!(SceneSpec::from_json_str(r#"{ "fps": 0 }"#).is_err());
    assert!(
        SceneSpec::from_json_str(r#"{ "resolution": { "width": 0, "height": 10 } }"#).is_err()
    );
    assert!(
        SceneSpec::from_json_str(r#"{ "objects": [ { "id": "a" }, { "id": "a" } ] }"#).is_err()
    );
    assert!(SceneSpec::from_json_str(r#"{ "objects": [ {} ] }"#).is_err());

    let unsorted = r#"{ "objects": [ { "id": "a", "position": [
        { "frame": 5, "value": [0, 0, 0] },
        { "frame": 1, "value": [0, 0, 0] }
    ] } ] }"#;
    assert!(matches!(
        SceneSpec::from_json_str(unsorted),
        Err(BlurError::InvalidConfiguration(_))
    ));
}
