//! Armor and elytra rule files become equipment definitions instead of item definitions.

use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::assets::write_json;
use crate::cit::CitRecord;
use crate::context::ConvertContext;
use crate::conversion::{ArmorSlot, Conversion};
use crate::error::ConversionError;
use crate::organization::{OutputKind, TextureDestination};

/// Slot for the first listed item that names an armor piece, and whether it is an elytra.
pub fn armor_slot(items: &[String], type_value: &str) -> Option<(ArmorSlot, bool)> {
    items.iter().find_map(|item| {
        if item.ends_with("_helmet") {
            Some((ArmorSlot::Head, false))
        } else if item.ends_with("_chestplate") || item == "elytra" {
            Some((ArmorSlot::Chest, item == "elytra" || type_value == "elytra"))
        } else if item.ends_with("_leggings") {
            Some((ArmorSlot::Legs, false))
        } else if item.ends_with("_boots") {
            Some((ArmorSlot::Feet, false))
        } else {
            None
        }
    })
}

/// `<stem>_icon.properties` beside the rule file or in a sibling `icons` directory.
pub fn icon_companion(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let icon_name = format!("{stem}_icon.properties");
    let dir = path.parent()?;
    let beside = dir.join(&icon_name);
    if beside.is_file() {
        return Some(beside);
    }
    dir.parent()
        .map(|p| p.join("icons").join(&icon_name))
        .filter(|p| p.is_file())
}

fn texture_for_layer(record: &CitRecord, layer: &str) -> Option<PathBuf> {
    record
        .texture_paths
        .iter()
        .find(|(suffix, _)| suffix.ends_with(layer))
        .and_then(|(_, path)| path.clone())
}

pub(crate) fn convert_equipment_record(ctx: &mut ConvertContext<'_>, record: &CitRecord) {
    let armor_def = match convert_equipment(ctx, record) {
        Ok(def) => def,
        Err(err) => {
            ctx.report.record_error(&record.path, err);
            None
        }
    };
    let slot = armor_slot(&record.items, record.type_value());
    let item_def = icon_companion(&record.path).map(|icon| {
        debug!(path = %record.path.display(), icon = %icon.display(), "Armor rule has an icon");
        record
            .router
            .reference(OutputKind::ItemDefinition, &format!("{}.json", record.name))
    });

    if armor_def.is_none() && item_def.is_none() {
        debug!(path = %record.path.display(), "Equipment rule produced no targets");
        return;
    }
    let is_elytra = slot.is_some_and(|(_, elytra)| elytra);
    ctx.ledger.extend(Conversion::from_items(
        &record.items,
        &record.original_components,
        item_def,
        armor_def,
        slot.map(|(slot, _)| slot),
        is_elytra,
    ));
}

/// Writes `equipment/<name>.json` for an armor or elytra rule and returns its reference, or
/// `None` when none of the expected layer textures resolved.
pub fn convert_equipment(
    ctx: &mut ConvertContext<'_>,
    record: &CitRecord,
) -> Result<Option<String>, ConversionError> {
    let layout = ctx.layout;
    let mut layers = Map::new();

    if record.type_value() == "elytra" {
        let Some(path) = record.texture_paths.get("").cloned().flatten() else {
            return Ok(None);
        };
        ctx.assets.png(layout, &path)?;
        let reference = ctx
            .assets
            .convert_png(layout, &path, TextureDestination::EquipWings)?;
        layers.insert("wings".to_string(), json!([{ "texture": reference }]));
    } else {
        let wanted = [
            ("layer_1", "humanoid", TextureDestination::EquipHumanoid),
            (
                "layer_2",
                "humanoid_leggings",
                TextureDestination::EquipHumanoidLeggings,
            ),
        ];
        for (layer, key, destination) in wanted {
            let Some(path) = texture_for_layer(record, layer) else {
                continue;
            };
            ctx.assets.png(layout, &path)?;
            let reference = ctx.assets.convert_png(layout, &path, destination)?;
            layers.insert(key.to_string(), json!([{ "texture": reference }]));
        }
        if layers.is_empty() {
            return Ok(None);
        }
    }

    let filename = format!("{}.json", record.name);
    let output = record
        .router
        .output_path(&layout.output_root, OutputKind::EquipmentDefinition, &filename);
    write_json(&output, &json!({ "layers": Value::Object(layers) })).map_err(|e| {
        ConversionError::json_model(
            &record.path,
            format!("failed to write equipment definition {}: {e}", output.display()),
        )
    })?;
    info!(path = %record.path.display(), output = %output.display(), "Wrote equipment definition");
    Ok(Some(
        record.router.reference(OutputKind::EquipmentDefinition, &filename),
    ))
}
