use cit_convert_core::organization::{
    MappingRule, OrganizationConfig, OrganizationRules, OutputKind, Router, TextureDestination,
};
use cit_convert_core::resolve::{normalize_path, relative_link, PackResolver};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn rule(original: &str, namespace: &str, root: &str) -> MappingRule {
    MappingRule {
        original_path: original.to_string(),
        target_namespace: namespace.to_string(),
        target_ressource_root_relative_path: root.to_string(),
    }
}

#[test]
fn local_file_wins_over_namespace_fallbacks() {
    let dir = tempdir().unwrap();
    let pack = dir.path();
    let rule_file = write(pack, "assets/minecraft/optifine/cit/swords/ruby.properties", "");
    let local = write(pack, "assets/minecraft/optifine/cit/swords/ruby.png", "local");
    write(pack, "assets/minecraft/textures/ruby.png", "global");

    let resolver = PackResolver::new(pack, vec!["minecraft".to_string()]);
    let found = resolver.find(&rule_file, "ruby", ".png");
    assert_eq!(found, Some(normalize_path(&local)));
}

#[test]
fn namespace_bases_are_searched_in_order() {
    struct TestCase {
        name: &'static str,
        files: &'static [&'static str],
        reference: &'static str,
        expected: Option<&'static str>,
    }

    let cases = [
        TestCase {
            name: "textures directory",
            files: &["assets/minecraft/textures/item/ruby.png"],
            reference: "item/ruby",
            expected: Some("assets/minecraft/textures/item/ruby.png"),
        },
        TestCase {
            name: "optifine before textures",
            files: &[
                "assets/minecraft/optifine/shared/ruby.png",
                "assets/minecraft/textures/shared/ruby.png",
            ],
            reference: "shared/ruby",
            expected: Some("assets/minecraft/optifine/shared/ruby.png"),
        },
        TestCase {
            name: "explicit namespace",
            files: &["assets/custom/textures/gem.png"],
            reference: "custom:gem",
            expected: Some("assets/custom/textures/gem.png"),
        },
        TestCase {
            name: "extension already present",
            files: &["assets/minecraft/textures/gem.png"],
            reference: "gem.png",
            expected: Some("assets/minecraft/textures/gem.png"),
        },
        TestCase {
            name: "missing",
            files: &[],
            reference: "nowhere/gem",
            expected: None,
        },
    ];

    for case in cases {
        let dir = tempdir().unwrap();
        let pack = dir.path();
        let rule_file = write(pack, "assets/minecraft/optifine/cit/a.properties", "");
        for file in case.files {
            write(pack, file, "x");
        }
        let resolver = PackResolver::new(pack, vec!["minecraft".to_string()]);
        let found = resolver.find(&rule_file, case.reference, ".png");
        let expected = case.expected.map(|rel| normalize_path(&pack.join(rel)));
        assert_eq!(found, expected, "case: {}", case.name);
    }
}

#[test]
fn regex_rules_are_consulted_before_exact_rules() {
    let dir = tempdir().unwrap();
    let pack = dir.path();
    let config = OrganizationConfig {
        file_mapping: vec![rule(
            "assets/minecraft/optifine/cit/swords/ruby.properties",
            "exact",
            "swords",
        )],
        file_mapping_regex: vec![rule(
            "assets/minecraft/optifine/cit/swords/.*",
            "pattern",
            "weapons/swords",
        )],
    };
    let rules = OrganizationRules::new(pack, &config).unwrap();

    let routed = rules.route(&pack.join("assets/minecraft/optifine/cit/swords/ruby.properties"));
    assert_eq!(
        routed,
        Router {
            namespace: "pattern".to_string(),
            root: "weapons/swords".to_string()
        }
    );
}

#[test]
fn unmatched_paths_get_the_default_router() {
    let dir = tempdir().unwrap();
    let pack = dir.path();
    let config = OrganizationConfig {
        file_mapping: vec![rule("assets/minecraft/optifine/cit/a.properties", "ns", "a")],
        file_mapping_regex: vec![rule("assets/minecraft/optifine/cit/swords/.*", "ns", "b")],
    };
    let rules = OrganizationRules::new(pack, &config).unwrap();

    // Regexes must match the whole path, not a prefix of it.
    let routed = rules.route(&pack.join("assets/minecraft/optifine/cit/swordsmith/a.properties"));
    assert_eq!(routed, Router::default());
    assert_eq!(routed.namespace, "default");
    assert_eq!(routed.root, ".");

    let outside = rules.route(Path::new("/somewhere/else/a.properties"));
    assert_eq!(outside, Router::default());
}

#[test]
fn invalid_regex_rule_fails_to_compile() {
    let config = OrganizationConfig {
        file_mapping: vec![],
        file_mapping_regex: vec![rule("assets/(unclosed", "ns", "root")],
    };
    let err = OrganizationRules::new("pack", &config).unwrap_err();
    assert!(err.to_string().contains("assets/(unclosed"), "got: {err}");
}

#[test]
fn router_builds_output_paths_and_references() {
    let router = Router {
        namespace: "hb".to_string(),
        root: "weapons/swords".to_string(),
    };
    let out = Path::new("out");

    assert_eq!(
        router.output_path(out, OutputKind::ItemModel, "ruby.json"),
        PathBuf::from("out/assets/hb/models/item/weapons/swords/ruby.json")
    );
    assert_eq!(
        router.output_path(out, OutputKind::ItemDefinition, "ruby.json"),
        PathBuf::from("out/assets/hb/items/weapons/swords/ruby.json")
    );
    assert_eq!(
        router.output_path(
            out,
            OutputKind::Texture(TextureDestination::EquipHumanoidLeggings),
            "ruby_layer_2.png"
        ),
        PathBuf::from("out/assets/hb/textures/entity/equipment/humanoid_leggings/weapons/swords/ruby_layer_2.png")
    );

    assert_eq!(
        router.reference(OutputKind::ItemModel, "ruby.json"),
        "hb:item/weapons/swords/ruby"
    );
    assert_eq!(
        router.reference(OutputKind::Texture(TextureDestination::Item), "ruby.png"),
        "hb:item/weapons/swords/ruby"
    );
    assert_eq!(
        router.reference(OutputKind::ItemDefinition, "ruby.json"),
        "hb:weapons/swords/ruby"
    );
    assert_eq!(
        Router::default().reference(OutputKind::EquipmentDefinition, "ruby.json"),
        "default:ruby"
    );
}

#[test]
fn relative_links_walk_up_from_the_report_directory() {
    assert_eq!(
        relative_link(Path::new("reports"), Path::new("pack/cit/a.properties")),
        "../pack/cit/a.properties"
    );
    assert_eq!(
        relative_link(Path::new(""), Path::new("pack/cit/a.properties")),
        "pack/cit/a.properties"
    );
    assert_eq!(
        relative_link(
            Path::new("out/./reports"),
            Path::new("out/pack/../pack/cit/a.properties")
        ),
        "../pack/cit/a.properties"
    );
    assert_eq!(
        relative_link(Path::new("/tmp/run"), Path::new("/tmp/run")),
        "."
    );
}
