//! High-level pipeline: orchestrates clean → discover → convert → write outputs for one pack.
//!
//! A run:
//!   - Empties the output directory
//!   - Loads every rule file under `assets/minecraft/optifine/cit`, in sorted order
//!   - Sets aside rule files whose output name collides with an earlier one
//!   - Converts the rest, accumulating rejections, errors and ledger entries
//!   - Writes `conversions.json`, the Markdown report and the pack metadata copy
//!
//! Per-record problems never abort the run; they end up in the report. Only configuration and
//! filesystem failures on the run's own outputs are returned as [`ConvertError`].
//!
//! # Navigation
//! - Main entrypoint: [`convert_pack`]
//! - Supporting types: [`ConvertReport`]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::cit::CitRecord;
use crate::config::ConvertConfig;
use crate::context::{ConvertContext, PackLayout};
use crate::contract::PropertiesReader;
use crate::error::ConvertError;
use crate::report::RejectReason;
use crate::synthesis::convert_record;

/// Summary of one run, for the caller to print or assert on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub discovered: usize,
    pub converted: usize,
    pub rejected: usize,
    pub errors: usize,
    pub duplicates: usize,
    pub ledger_entries: usize,
    /// Non-empty rejection categories, in report order.
    pub rejections: Vec<(RejectReason, usize)>,
}

/// Directory holding the legacy rule files, relative to the pack root.
pub fn cit_dir(pack_root: &Path) -> PathBuf {
    pack_root
        .join("assets")
        .join("minecraft")
        .join("optifine")
        .join("cit")
}

/// Every `*.properties` file under the rule directory, sorted by path.
pub fn discover_rule_files(pack_root: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let root = cit_dir(pack_root);
    if !root.is_dir() {
        info!(dir = %root.display(), "[CONVERT] No rule directory, nothing to convert");
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "properties") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    debug!(count = files.len(), dir = %root.display(), "Discovered rule files");
    Ok(files)
}

/// Removes and recreates the output directory.
pub fn clean_output_dir(output_dir: &Path) -> Result<(), ConvertError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    }
    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    info!(dir = %output_dir.display(), "[CONVERT] Cleaned output directory");
    Ok(())
}

/// Entrypoint: converts the whole pack described by `config`.
pub fn convert_pack(
    config: &ConvertConfig,
    reader: &dyn PropertiesReader,
) -> Result<ConvertReport, ConvertError> {
    info!("[CONVERT] Starting pack conversion");
    let layout = PackLayout::new(config)?;
    clean_output_dir(&config.output_dir)?;

    let records: Vec<CitRecord> = discover_rule_files(&config.pack_root)?
        .iter()
        .map(|path| CitRecord::load(path, reader, &layout))
        .collect();
    info!(count = records.len(), "[CONVERT] Loaded rule files");

    let mut ctx = ConvertContext::new(&layout, reader);
    let (to_convert, duplicates) = split_duplicates(&records);
    for (identity, paths) in duplicates {
        ctx.report.record_duplicate(identity, paths);
    }

    let mut converted = 0;
    for record in &to_convert {
        let rejected_before = ctx.report.rejected_count();
        convert_record(&mut ctx, record);
        if ctx.report.rejected_count() == rejected_before
            && !ctx.report.errors().contains_key(&record.path)
        {
            converted += 1;
        }
    }

    let entries = ctx.ledger.merged();
    let body = serde_json::to_string_pretty(&entries)?;
    write_file(&config.conversions_path, &body)?;
    info!(
        path = %config.conversions_path.display(),
        entries = entries.len(),
        "[CONVERT] Wrote conversions"
    );

    ctx.report.write(&config.report_path)?;
    info!(path = %config.report_path.display(), "[CONVERT] Wrote conversion report");

    if let Some(meta) = &config.pack_meta {
        let target = config.output_dir.join("pack.mcmeta");
        match fs::copy(meta, &target) {
            Ok(_) => info!(from = %meta.display(), "[CONVERT] Copied pack metadata"),
            Err(e) => {
                error!(from = %meta.display(), error = %e, "[CONVERT][ERROR] Failed to copy pack metadata");
                return Err(ConvertError::io(meta, e));
            }
        }
    }

    let report = ConvertReport {
        discovered: records.len(),
        converted,
        rejected: ctx.report.rejected_count(),
        errors: ctx.report.errors().len(),
        duplicates: ctx.report.duplicates().len(),
        ledger_entries: entries.len(),
        rejections: RejectReason::ALL
            .into_iter()
            .map(|r| (r, ctx.report.rejected(r).len()))
            .filter(|(_, n)| *n > 0)
            .collect(),
    };
    info!(
        discovered = report.discovered,
        converted = report.converted,
        rejected = report.rejected,
        errors = report.errors,
        "[CONVERT] Pack conversion finished"
    );
    Ok(report)
}

/// Keeps the first record per (name, namespace, root). Returns the records to convert and every
/// colliding group. `_nbt` records without a base take no part in the check.
fn split_duplicates(records: &[CitRecord]) -> (Vec<&CitRecord>, Vec<(String, Vec<PathBuf>)>) {
    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut keep = Vec::new();

    for record in records {
        if record.is_nbt() && record.nbt_base.is_none() {
            keep.push(record);
            continue;
        }
        let identity = format!(
            "{} (namespace '{}', root '{}')",
            record.name, record.router.namespace, record.router.root
        );
        match groups.get_mut(&identity) {
            Some(paths) => paths.push(record.path.clone()),
            None => {
                groups.insert(identity.clone(), vec![record.path.clone()]);
                order.push(identity);
                keep.push(record);
            }
        }
    }

    let duplicates = order
        .into_iter()
        .filter_map(|identity| {
            let paths = groups.remove(&identity)?;
            (paths.len() > 1).then_some((identity, paths))
        })
        .collect();
    (keep, duplicates)
}

fn write_file(path: &Path, body: &str) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }
    fs::write(path, body).map_err(|e| ConvertError::io(path, e))
}
