//! Item definition synthesis: turns a validated rule file into the item definition JSON for its
//! category (plain item, bow, shield, stack-size group) and records the ledger entries.

use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::assets::write_json;
use crate::cit::{numeric_siblings, stack_group_base, CitRecord};
use crate::context::ConvertContext;
use crate::conversion::Conversion;
use crate::equipment::convert_equipment_record;
use crate::error::ConversionError;
use crate::organization::{OutputKind, Router, TextureDestination};
use crate::report::RejectReason;

const BOW_BUILTIN: &str = "item/bow";
const SHIELD_BUILTIN: &str = "minecraft:item/shield";
const SHIELD_BLOCKING_BUILTIN: &str = "minecraft:item/shield_blocking";

/// `{"type": "model", "model": reference}`
pub fn model_node(reference: &str) -> Value {
    json!({ "type": "model", "model": reference })
}

fn shield_node(base: &str) -> Value {
    json!({
        "type": "minecraft:special",
        "base": base,
        "model": { "type": "minecraft:shield" }
    })
}

fn range_entry(node: Value, threshold: Value) -> Value {
    json!({ "model": node, "threshold": threshold })
}

/// Validates a rule file and, if it passes, converts it. Rejections and conversion errors are
/// written to the context's report; nothing here aborts the run.
pub fn convert_record(ctx: &mut ConvertContext<'_>, record: &CitRecord) {
    if let Err(reason) = record.validate() {
        ctx.report.reject(reason, &record.path);
        return;
    }
    debug!(
        path = %record.path.display(),
        custom_name = record.flags.has_custom_name,
        custom_data = record.flags.has_custom_data,
        "Converting rule file"
    );

    if let Some(base) = record.name.strip_suffix("_nbt") {
        match &record.nbt_base {
            Some(_) => {
                // Predicate-only variant of its base: points at the base's item definition.
                let target = record
                    .router
                    .reference(OutputKind::ItemDefinition, &format!("{base}.json"));
                ctx.ledger.extend(Conversion::from_items(
                    &record.items,
                    &record.original_components,
                    Some(target),
                    None,
                    None,
                    false,
                ));
                debug!(path = %record.path.display(), "Recorded _nbt rule against its base");
            }
            None => ctx.report.reject(RejectReason::NbtOrphan, &record.path),
        }
        return;
    }

    let mut output_name = record.name.clone();
    if let Some(base) = record.name.strip_suffix("_icon") {
        let dir = record.path.parent().map(PathBuf::from).unwrap_or_default();
        let beside = dir.join(format!("{base}.properties"));
        let in_models = dir
            .parent()
            .map(|p| p.join("models").join(format!("{base}.properties")));
        if !beside.is_file() && !in_models.is_some_and(|p| p.is_file()) {
            ctx.report.reject(RejectReason::IconOrphan, &record.path);
            return;
        }
        output_name = base.to_string();
    }

    match record.type_value() {
        "armor" | "elytra" => convert_equipment_record(ctx, record),
        _ if record.flags.has_stack_size => convert_stack_group(ctx, record),
        _ => convert_item(ctx, record, &output_name),
    }
}

/// Writes `{"model": node}` as the item definition `<name>.json` and returns its reference.
fn write_item_definition(
    ctx: &mut ConvertContext<'_>,
    record: &CitRecord,
    router: &Router,
    name: &str,
    node: Value,
) -> Option<String> {
    let filename = format!("{name}.json");
    let output = router.output_path(&ctx.layout.output_root, OutputKind::ItemDefinition, &filename);
    match write_json(&output, &json!({ "model": node })) {
        Ok(()) => {
            info!(path = %record.path.display(), output = %output.display(), "Wrote item definition");
            Some(router.reference(OutputKind::ItemDefinition, &filename))
        }
        Err(e) => {
            ctx.report.record_error(
                &record.path,
                ConversionError::JsonModel {
                    asset: None,
                    message: format!("failed to write final item definition {}: {e}", output.display()),
                },
            );
            None
        }
    }
}

fn convert_item(ctx: &mut ConvertContext<'_>, record: &CitRecord, output_name: &str) {
    let router = record.router.clone();
    let Some(node) = convert_specific_cit(ctx, record, &router) else {
        debug!(path = %record.path.display(), "No model produced for rule file");
        return;
    };
    if let Some(reference) = write_item_definition(ctx, record, &router, output_name, node) {
        ctx.ledger.extend(Conversion::from_items(
            &record.items,
            &record.original_components,
            Some(reference),
            None,
            None,
            false,
        ));
    }
}

/// Item model node for `record` alone, ignoring stack-size siblings. Bows and shields get
/// their multi-state structures; anything else is the default variant.
pub fn convert_specific_cit(
    ctx: &mut ConvertContext<'_>,
    record: &CitRecord,
    router: &Router,
) -> Option<Value> {
    if record.items.iter().any(|i| i == "bow") {
        Some(convert_bow(ctx, record, router))
    } else if record.items.iter().any(|i| i == "shield") {
        Some(convert_shield(ctx, record, router))
    } else {
        convert_specific_model(ctx, record, "", router)
    }
}

/// First variant among `suffixes` that converts, else the built-in bow.
fn bow_variant(
    ctx: &mut ConvertContext<'_>,
    record: &CitRecord,
    router: &Router,
    suffixes: &[&str],
) -> Value {
    suffixes
        .iter()
        .find_map(|suffix| convert_specific_model(ctx, record, suffix, router))
        .unwrap_or_else(|| model_node(BOW_BUILTIN))
}

fn convert_bow(ctx: &mut ConvertContext<'_>, record: &CitRecord, router: &Router) -> Value {
    let standby = bow_variant(ctx, record, router, &["bow_standby", "bow", ""]);
    let pulling_0 = bow_variant(ctx, record, router, &["bow_pulling_0"]);
    let pulling_1 = bow_variant(ctx, record, router, &["bow_pulling_1"]);
    let pulling_2 = bow_variant(ctx, record, router, &["bow_pulling_2"]);

    json!({
        "type": "condition",
        "on_false": standby,
        "on_true": {
            "type": "range_dispatch",
            "entries": [
                range_entry(pulling_1, json!(0.65)),
                range_entry(pulling_2, json!(0.9)),
            ],
            "fallback": pulling_0,
            "property": "minecraft:use_duration",
            "scale": 0.05
        },
        "property": "minecraft:using_item"
    })
}

fn convert_shield(ctx: &mut ConvertContext<'_>, record: &CitRecord, router: &Router) -> Value {
    let base_of = |node: Option<Value>, builtin: &str| {
        node.and_then(|n| n.get("model").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| builtin.to_string())
    };
    let blocking = convert_specific_model(ctx, record, "shield_blocking", router);
    let normal = convert_specific_model(ctx, record, "", router);

    json!({
        "type": "minecraft:condition",
        "on_false": shield_node(&base_of(normal, SHIELD_BUILTIN)),
        "on_true": shield_node(&base_of(blocking, SHIELD_BLOCKING_BUILTIN)),
        "property": "minecraft:using_item"
    })
}

/// Plain model node for one variant suffix (`""` = default), or `None` when the variant has
/// nothing to convert or its conversion failed (the error is recorded on the rule file).
pub fn convert_specific_model(
    ctx: &mut ConvertContext<'_>,
    record: &CitRecord,
    suffix: &str,
    router: &Router,
) -> Option<Value> {
    match try_convert_specific_model(ctx, record, suffix, router) {
        Ok(node) => node,
        Err(err) => {
            ctx.report.record_error(&record.path, err);
            None
        }
    }
}

fn try_convert_specific_model(
    ctx: &mut ConvertContext<'_>,
    record: &CitRecord,
    suffix: &str,
    router: &Router,
) -> Result<Option<Value>, ConversionError> {
    let layout = ctx.layout;
    let texture_path = record.texture_paths.get(suffix).cloned().flatten();

    let texture_override = match &texture_path {
        Some(path) => {
            ctx.assets.png(layout, path)?;
            Some(ctx.assets.convert_png(layout, path, TextureDestination::Item)?)
        }
        None => None,
    };

    let model_path = record
        .model_paths
        .get(suffix)
        .cloned()
        .flatten()
        .or_else(|| record.model_paths.get("").cloned().flatten());

    let reference = if let Some(model_path) = model_path {
        let key = ctx.assets.json_model(layout, &model_path, suffix)?;
        ctx.assets
            .convert_model(layout, &key, texture_override.as_deref())?
    } else if texture_path.is_some() {
        let Some(item) = record.items.first() else {
            return Ok(None);
        };
        let key = ctx.assets.generic_model(item, &record.name, suffix, router)?;
        ctx.assets
            .convert_generic(layout, &key, texture_override.as_deref())?
    } else {
        return Ok(None);
    };

    Ok(Some(model_node(&reference)))
}

/// Builds one `count` range dispatch from every stack-size sibling of `record`.
///
/// Every variant is synthesized independently; the group's item definition is only written
/// when all of them succeed.
fn convert_stack_group(ctx: &mut ConvertContext<'_>, record: &CitRecord) {
    let router = record.router.clone();
    let base = stack_group_base(&record.name).to_string();
    let Some(dir) = record.path.parent().map(PathBuf::from) else {
        return;
    };

    let mut variant_paths = numeric_siblings(&dir, &base);
    let base_file = dir.join(format!("{base}.properties"));
    if base_file.is_file() {
        variant_paths.push(base_file);
    }
    variant_paths.retain(|p| p.file_name() != record.path.file_name());
    variant_paths.push(record.path.clone());

    let mut variants: Vec<CitRecord> = variant_paths
        .iter()
        .map(|p| CitRecord::load(p, ctx.reader, ctx.layout))
        .filter(CitRecord::has_valid_stack_size)
        .collect();
    variants.sort_by_key(|v| v.stack_size_threshold);

    let nodes: Vec<Option<Value>> = variants
        .iter()
        .map(|variant| convert_specific_cit(ctx, variant, &router))
        .collect();
    if let Some(failed) = variants.iter().zip(&nodes).find(|(_, n)| n.is_none()) {
        warn!(
            path = %record.path.display(),
            variant = %failed.0.path.display(),
            "Stack-size variant failed, skipping group item definition"
        );
        return;
    }
    let entries: Vec<Value> = variants
        .iter()
        .zip(nodes.into_iter().flatten())
        .map(|(variant, node)| range_entry(node, json!(variant.stack_size_threshold)))
        .collect();

    let node = json!({
        "type": "range_dispatch",
        "property": "count",
        "normalize": false,
        "entries": entries
    });
    if let Some(reference) = write_item_definition(ctx, record, &router, &base, node) {
        ctx.ledger.extend(Conversion::from_items(
            &record.items,
            &record.original_components,
            Some(reference),
            None,
            None,
            false,
        ));
    }
}
