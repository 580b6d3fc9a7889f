use cit_convert_core::conversion::{
    ArmorSlot, ComponentMatch, Conversion, ConversionLedger, MatchMethod,
};
use serde_json::json;
use std::collections::BTreeMap;

fn components(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn legacy_component_values_become_match_methods() {
    struct TestCase {
        raw: &'static str,
        method: MatchMethod,
        value: &'static str,
    }

    let cases = [
        TestCase {
            raw: "Ruby Sword",
            method: MatchMethod::Exact,
            value: "Ruby Sword",
        },
        TestCase {
            raw: "iregex:ruby.*",
            method: MatchMethod::Regex,
            value: "ruby.*",
        },
        TestCase {
            raw: "ipattern:*ruby*",
            method: MatchMethod::Regex,
            value: "*ruby*",
        },
    ];

    for case in cases {
        assert_eq!(
            ComponentMatch::from_legacy(case.raw),
            ComponentMatch {
                method: case.method,
                value: case.value.to_string(),
            },
            "raw: {}",
            case.raw
        );
    }
}

#[test]
fn merges_entries_with_the_same_item_definition_and_predicate() {
    let predicate = components(&[("components.custom_name", "Ruby")]);
    let mut ledger = ConversionLedger::default();
    ledger.extend(Conversion::from_items(
        &["diamond_helmet".to_string()],
        &predicate,
        Some("hb:ruby_helmet".to_string()),
        None,
        None,
        false,
    ));
    ledger.extend(Conversion::from_items(
        &["diamond_helmet".to_string()],
        &predicate,
        Some("hb:ruby_helmet".to_string()),
        Some("hb:ruby_helmet".to_string()),
        Some(ArmorSlot::Head),
        false,
    ));
    // Different predicate: stays separate.
    ledger.extend(Conversion::from_items(
        &["diamond_helmet".to_string()],
        &BTreeMap::new(),
        Some("hb:ruby_helmet".to_string()),
        None,
        None,
        false,
    ));
    assert_eq!(ledger.len(), 3);

    let merged = ledger.merged();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].target_armor_def.as_deref(), Some("hb:ruby_helmet"));
    assert_eq!(merged[0].target_armor_slot, Some(ArmorSlot::Head));
    assert_eq!(merged[0].is_elytra, Some(false));
    assert!(merged[1].original_components.is_empty());
    assert_eq!(merged[1].target_armor_def, None);
}

#[test]
fn merge_never_overwrites_armor_fields() {
    let mut ledger = ConversionLedger::default();
    ledger.extend(Conversion::from_items(
        &["elytra".to_string()],
        &BTreeMap::new(),
        None,
        Some("hb:first".to_string()),
        Some(ArmorSlot::Chest),
        true,
    ));
    ledger.extend(Conversion::from_items(
        &["elytra".to_string()],
        &BTreeMap::new(),
        None,
        Some("hb:second".to_string()),
        Some(ArmorSlot::Chest),
        false,
    ));

    let merged = ledger.merged();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].target_armor_def.as_deref(), Some("hb:first"));
    assert_eq!(merged[0].is_elytra, Some(true));
}

#[test]
fn serializes_only_the_fields_that_are_set() {
    let entry = Conversion::from_items(
        &["stick".to_string()],
        &components(&[("components.custom_data.id", "iregex:wand_.*")]),
        Some("default:wand".to_string()),
        None,
        None,
        false,
    )
    .remove(0)
    .generate();

    assert_eq!(
        serde_json::to_value(&entry).unwrap(),
        json!({
            "item": "stick",
            "original_components": {
                "components.custom_data.id": {"method": "regex", "value": "wand_.*"}
            },
            "target_item_def": "default:wand"
        })
    );
}
