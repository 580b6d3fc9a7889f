use cit_convert_core::assets::AssetRegistry;
use cit_convert_core::config::ConvertConfig;
use cit_convert_core::context::PackLayout;
use cit_convert_core::error::ConversionError;
use cit_convert_core::organization::{Router, TextureDestination};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

const CIT: &str = "assets/minecraft/optifine/cit";

struct Fixture {
    _dir: tempfile::TempDir,
    pack: PathBuf,
    out: PathBuf,
    layout: PackLayout,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let pack = dir.path().join("pack");
    let out = dir.path().join("out");
    fs::create_dir_all(&pack).unwrap();
    let layout = PackLayout::new(&ConvertConfig::new(&pack, &out)).unwrap();
    Fixture {
        _dir: dir,
        pack,
        out,
        layout,
    }
}

#[test]
fn converts_model_with_parent_and_textures() {
    let f = fixture();
    write(&f.pack, &format!("{CIT}/swords/ruby.png"), "png");
    write(&f.pack, &format!("{CIT}/swords/ruby.png.mcmeta"), "{\"animation\":{}}");
    write(
        &f.pack,
        &format!("{CIT}/swords/base_sword.json"),
        r#"{"parent": "minecraft:item/handheld"}"#,
    );
    let model = write(
        &f.pack,
        &format!("{CIT}/swords/ruby_sword.json"),
        r#"{"parent": "base_sword", "textures": {"layer0": "ruby", "layer1": "item/stick"}}"#,
    );

    let mut assets = AssetRegistry::new();
    let key = assets.json_model(&f.layout, &model, "").unwrap();
    let reference = assets.convert_model(&f.layout, &key, None).unwrap();
    assert_eq!(reference, "default:item/ruby_sword");

    let written = read_json(&f.out.join("assets/default/models/item/ruby_sword.json"));
    assert_eq!(
        written,
        json!({
            "parent": "default:item/base_sword",
            "textures": {
                "layer0": "default:item/ruby",
                "layer1": "item/stick",
                "particle": "#layer0"
            }
        })
    );
    let parent = read_json(&f.out.join("assets/default/models/item/base_sword.json"));
    assert_eq!(parent, json!({"parent": "minecraft:item/handheld"}));

    assert!(f.out.join("assets/default/textures/item/ruby.png").is_file());
    assert!(f.out.join("assets/default/textures/item/ruby.png.mcmeta").is_file());
}

#[test]
fn model_is_converted_at_most_once() {
    let f = fixture();
    write(&f.pack, &format!("{CIT}/ruby.png"), "png");
    let model = write(
        &f.pack,
        &format!("{CIT}/ruby_sword.json"),
        r#"{"parent": "item/handheld", "textures": {"layer0": "ruby"}}"#,
    );

    let mut assets = AssetRegistry::new();
    let key = assets.json_model(&f.layout, &model, "").unwrap();
    let first = assets.convert_model(&f.layout, &key, None).unwrap();

    // A second conversion must not touch the output again.
    let output = f.out.join("assets/default/models/item/ruby_sword.json");
    fs::remove_file(&output).unwrap();
    let again = assets.json_model(&f.layout, &model, "").unwrap();
    let second = assets
        .convert_model(&f.layout, &again, Some("default:item/other"))
        .unwrap();

    assert_eq!(first, second);
    assert!(!output.exists());
    assert_eq!(assets.model_count(), 1);
    assert_eq!(assets.model(&key).unwrap().converted(), Some(first.as_str()));
}

#[test]
fn same_model_under_two_suffixes_gets_two_outputs() {
    let f = fixture();
    let model = write(
        &f.pack,
        &format!("{CIT}/bow_model.json"),
        r#"{"parent": "item/bow"}"#,
    );

    let mut assets = AssetRegistry::new();
    let standby = assets.json_model(&f.layout, &model, "bow_standby").unwrap();
    let pulling = assets.json_model(&f.layout, &model, "bow_pulling_0").unwrap();
    let a = assets
        .convert_model(&f.layout, &standby, Some("default:item/standby"))
        .unwrap();
    let b = assets
        .convert_model(&f.layout, &pulling, Some("default:item/pulling"))
        .unwrap();

    assert_eq!(a, "default:item/bow_model_bow_standby");
    assert_eq!(b, "default:item/bow_model_bow_pulling_0");
    let written = read_json(&f.out.join("assets/default/models/item/bow_model_bow_pulling_0.json"));
    assert_eq!(
        written,
        json!({
            "parent": "item/bow",
            "textures": {"layer0": "default:item/pulling", "particle": "#layer0"}
        })
    );
}

#[test]
fn texture_override_replaces_every_slot() {
    let f = fixture();
    write(&f.pack, &format!("{CIT}/a.png"), "png");
    let model = write(
        &f.pack,
        &format!("{CIT}/two_layers.json"),
        r#"{"parent": "item/generated", "textures": {"layer0": "a", "layer1": "a"}}"#,
    );

    let mut assets = AssetRegistry::new();
    let key = assets.json_model(&f.layout, &model, "").unwrap();
    assets
        .convert_model(&f.layout, &key, Some("hb:item/override"))
        .unwrap();

    let written = read_json(&f.out.join("assets/default/models/item/two_layers.json"));
    assert_eq!(
        written["textures"],
        json!({"layer0": "hb:item/override", "layer1": "hb:item/override", "particle": "#layer0"})
    );
    // The original texture was never requested, so it is not copied.
    assert!(!f.out.join("assets/default/textures/item/a.png").exists());
}

#[test]
fn rejects_models_with_colliding_names() {
    let f = fixture();
    let first = write(&f.pack, &format!("{CIT}/a/gem.json"), r#"{"parent": "item/generated"}"#);
    let second = write(&f.pack, &format!("{CIT}/b/gem.json"), r#"{"parent": "item/generated"}"#);

    let mut assets = AssetRegistry::new();
    assets.json_model(&f.layout, &first, "").unwrap();
    let err = assets.json_model(&f.layout, &second, "").unwrap_err();

    match err {
        ConversionError::JsonModel { asset, message } => {
            assert_eq!(asset.as_deref(), Some(second.as_path()));
            assert!(message.contains("gem"), "got: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejects_textures_with_colliding_stems() {
    let f = fixture();
    let first = write(&f.pack, &format!("{CIT}/a/gem.png"), "png");
    let second = write(&f.pack, &format!("{CIT}/b/gem.png"), "png");

    let mut assets = AssetRegistry::new();
    assets.png(&f.layout, &first).unwrap();
    assets.png(&f.layout, &first).unwrap();
    let err = assets.png(&f.layout, &second).unwrap_err();
    assert!(matches!(err, ConversionError::Texture { .. }), "got: {err:?}");
    assert_eq!(err.asset(), Some(second.as_path()));
    assert_eq!(assets.texture_count(), 1);
}

#[test]
fn detects_cyclic_parents() {
    let f = fixture();
    write(&f.pack, &format!("{CIT}/loop_a.json"), r#"{"parent": "loop_b"}"#);
    let b = write(&f.pack, &format!("{CIT}/loop_b.json"), r#"{"parent": "loop_a"}"#);

    let mut assets = AssetRegistry::new();
    let err = assets.json_model(&f.layout, &b, "").unwrap_err();
    match err {
        ConversionError::CyclicParent { chain, .. } => {
            assert_eq!(chain.len(), 3);
            assert_eq!(chain.first(), chain.last());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejects_invalid_model_json() {
    struct TestCase {
        name: &'static str,
        content: &'static str,
        message: &'static str,
    }

    let cases = [
        TestCase {
            name: "not json",
            content: "{ nope",
            message: "failed to parse",
        },
        TestCase {
            name: "missing parent",
            content: r#"{"parent": "custom/nowhere"}"#,
            message: "custom/nowhere",
        },
        TestCase {
            name: "missing texture",
            content: r#"{"textures": {"layer0": "custom/nowhere"}}"#,
            message: "custom/nowhere",
        },
        TestCase {
            name: "textures not an object",
            content: r#"{"textures": ["a"]}"#,
            message: "not an object",
        },
    ];

    for case in cases {
        let f = fixture();
        let model = write(&f.pack, &format!("{CIT}/bad.json"), case.content);
        let mut assets = AssetRegistry::new();
        let err = assets.json_model(&f.layout, &model, "").unwrap_err();
        assert!(
            err.to_string().contains(case.message),
            "case: {}, got: {err}",
            case.name
        );
    }
}

#[test]
fn texture_is_copied_once_per_destination() {
    let f = fixture();
    let png = write(&f.pack, &format!("{CIT}/armor/ruby_layer_1.png"), "png");

    let mut assets = AssetRegistry::new();
    assets.png(&f.layout, &png).unwrap();
    let item = assets
        .convert_png(&f.layout, &png, TextureDestination::Item)
        .unwrap();
    let humanoid = assets
        .convert_png(&f.layout, &png, TextureDestination::EquipHumanoid)
        .unwrap();

    assert_eq!(item, "default:item/ruby_layer_1");
    assert_eq!(humanoid, "default:ruby_layer_1");
    let humanoid_out = f
        .out
        .join("assets/default/textures/entity/equipment/humanoid/ruby_layer_1.png");
    assert!(humanoid_out.is_file());

    fs::remove_file(&humanoid_out).unwrap();
    assets
        .convert_png(&f.layout, &png, TextureDestination::EquipHumanoid)
        .unwrap();
    assert!(!humanoid_out.exists());
}

#[test]
fn generic_model_requires_a_texture() {
    let f = fixture();
    let router = Router::default();

    let mut assets = AssetRegistry::new();
    let key = assets.generic_model("diamond_sword", "ruby", "", &router).unwrap();
    let err = assets.convert_generic(&f.layout, &key, None).unwrap_err();
    assert!(err.to_string().contains("texture"), "got: {err}");

    let reference = assets
        .convert_generic(&f.layout, &key, Some("default:item/ruby"))
        .unwrap();
    assert_eq!(reference, "default:item/ruby_from_diamond_sword");
    let written = read_json(&f.out.join("assets/default/models/item/ruby_from_diamond_sword.json"));
    assert_eq!(
        written,
        json!({"parent": "minecraft:item/diamond_sword", "textures": {"layer0": "default:item/ruby"}})
    );
}
