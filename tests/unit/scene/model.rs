use super::*;

#[test]
fn minimal_scene_uses_defaults() {
    let scene = SceneDef::from_json_str(
        r#"{"meshes":[{}],"stickers":[{"src":"logo.png"}]}"#,
    )
    .unwrap();
    assert_eq!(scene.meshes, vec![MeshDef::default()]);
    let st = &scene.stickers[0];
    assert_eq!(st.src, ImageRef::from("logo.png"));
    assert_eq!(st.uv, Uv::CENTER);
    assert_eq!(st.scale, None);
    assert_eq!(st.rotation, 0.0);
    assert_eq!(st.crop, None);
    assert_eq!(scene.color_mode, ColorMode::Original);
}

#[test]
fn full_scene_parses() {
    let json = serde_json::json!({
        "meshes": [{
            "map": "shirt.png",
            "normal_map": "shirt_n.png",
            "base_color": "#336699"
        }],
        "stickers": [{
            "src": "logo.png",
            "uv": {"u": 0.25, "v": 0.75},
            "scale": 0.3,
            "rotation": 45.0,
            "crop": {"x": 10.0, "y": 0.0, "width": 50.0, "height": 100.0}
        }],
        "color_mode": {"custom": "#ff0000"}
    });
    let scene = SceneDef::from_json_str(&json.to_string()).unwrap();
    assert_eq!(scene.meshes[0].map, Some(ImageRef::from("shirt.png")));
    assert_eq!(scene.meshes[0].base_color, Some(Color::rgb(0x33, 0x66, 0x99)));
    assert_eq!(scene.stickers[0].uv, Uv { u: 0.25, v: 0.75 });
    assert_eq!(scene.stickers[0].crop.unwrap().width, 50.0);
    assert_eq!(scene.color_mode, ColorMode::Custom(Color::rgb(255, 0, 0)));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = SceneDef::from_json_str(r#"{"meshes":[],"layers":[]}"#).unwrap_err();
    assert!(matches!(err, StickerError::Serde(_)));
}

#[test]
fn missing_file_is_an_error() {
    assert!(SceneDef::from_path("/definitely/not/here.json").is_err());
}
