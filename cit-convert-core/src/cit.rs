//! Property record: one legacy rule file, normalized, validated and with every referenced
//! model and texture resolved.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::context::PackLayout;
use crate::contract::PropertiesReader;
use crate::organization::Router;
use crate::report::RejectReason;

/// Items whose synthesis consumes named `texture.<suffix>` / `model.<suffix>` variants.
const SUPPORTED_COMPLEX_ITEMS: &[&str] = &["bow", "elytra", "shield"];
const ARMOR_PIECE_SUFFIXES: &[&str] = &["_boots", "_helmet", "_leggings", "_chestplate"];
const VALID_TYPES: &[&str] = &["item", "armor", "elytra"];

fn is_supported_complex_item(item: &str) -> bool {
    SUPPORTED_COMPLEX_ITEMS.contains(&item)
        || ARMOR_PIECE_SUFFIXES.iter().any(|s| item.ends_with(s))
}

/// Boolean outcome of the key and value checks run when a record is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFlags {
    pub has_items: bool,
    pub has_texture_dot: bool,
    pub has_model_dot: bool,
    pub has_unsupported_texture_override: bool,
    pub has_unsupported_model_override: bool,
    pub has_custom_name: bool,
    pub has_custom_data: bool,
    pub has_stack_size: bool,
    pub has_invalid_stack_size: bool,
    pub has_invalid_stack_size_group: bool,
    pub model_not_found: bool,
    pub texture_not_found: bool,
    pub has_invalid_type: bool,
}

#[derive(Debug, Clone)]
pub struct CitRecord {
    pub path: PathBuf,
    /// File stem of the rule file.
    pub name: String,
    pub raw_properties: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
    pub items: Vec<String>,
    pub flags: ValidationFlags,
    /// Resolved `model` / `model.<suffix>` paths, keyed by suffix (`""` for the default).
    pub model_paths: BTreeMap<String, Option<PathBuf>>,
    /// Resolved `texture` / `texture.<suffix>` paths, keyed by suffix.
    pub texture_paths: BTreeMap<String, Option<PathBuf>>,
    /// `components*` keys, carried into the ledger unchanged.
    pub original_components: BTreeMap<String, String>,
    pub stack_size_threshold: Option<u32>,
    /// For `_nbt` records, the sibling base rule file when it exists.
    pub nbt_base: Option<PathBuf>,
    /// Router used for every output of this record.
    pub router: Router,
}

impl CitRecord {
    pub fn load(path: &Path, reader: &dyn PropertiesReader, layout: &PackLayout) -> Self {
        let raw_properties = reader.read_properties(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read rule file, treating it as empty");
            BTreeMap::new()
        });
        Self::from_properties(path, raw_properties, layout)
    }

    pub fn from_properties(
        path: &Path,
        raw_properties: BTreeMap<String, String>,
        layout: &PackLayout,
    ) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let properties = normalize_properties(&raw_properties);
        let items: Vec<String> = properties
            .get("items")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let original_components = properties
            .iter()
            .filter(|(k, _)| k.starts_with("components"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let nbt_base = name
            .strip_suffix("_nbt")
            .map(|base| path.with_file_name(format!("{base}.properties")))
            .filter(|base| base.is_file());
        let router = match &nbt_base {
            Some(base) => layout.route(base),
            None => layout.route(path),
        };

        let mut record = CitRecord {
            path: path.to_path_buf(),
            name,
            raw_properties,
            properties,
            items,
            flags: ValidationFlags::default(),
            model_paths: BTreeMap::new(),
            texture_paths: BTreeMap::new(),
            original_components,
            stack_size_threshold: None,
            nbt_base,
            router,
        };
        record.validate_keys();
        record.validate_values(layout);
        debug!(path = %record.path.display(), flags = ?record.flags, "Loaded rule file");
        record
    }

    pub fn type_value(&self) -> &str {
        self.properties.get("type").map(String::as_str).unwrap_or("")
    }

    pub fn is_nbt(&self) -> bool {
        self.name.ends_with("_nbt")
    }

    fn validate_keys(&mut self) {
        let props = &self.properties;
        let first_unsupported = self
            .items
            .first()
            .is_some_and(|item| !is_supported_complex_item(item));
        let flags = &mut self.flags;
        flags.has_items = !self.items.is_empty();
        flags.has_texture_dot = props.keys().any(|k| k.starts_with("texture."));
        flags.has_model_dot = props.keys().any(|k| k.starts_with("model."));
        flags.has_unsupported_texture_override = first_unsupported && flags.has_texture_dot;
        flags.has_unsupported_model_override = first_unsupported && flags.has_model_dot;
        flags.has_custom_name = props.contains_key("components.custom_name");
        flags.has_custom_data = props
            .keys()
            .any(|k| k == "components.custom_data" || k.starts_with("components.custom_data."));
        flags.has_stack_size = props.contains_key("stackSize");
    }

    fn validate_values(&mut self, layout: &PackLayout) {
        let resolver = &layout.resolver;

        for (key, value) in &self.properties {
            let suffix = if key == "model" {
                ""
            } else if let Some(suffix) = key.strip_prefix("model.") {
                suffix
            } else {
                continue;
            };
            let found = resolver.find(&self.path, value, ".json");
            self.flags.model_not_found |= found.is_none();
            self.model_paths.insert(suffix.to_string(), found);
        }

        for (key, value) in &self.properties {
            let suffix = if key == "texture" {
                ""
            } else if let Some(suffix) = key.strip_prefix("texture.") {
                suffix
            } else {
                continue;
            };
            let found = resolver.find(&self.path, value, ".png");
            self.flags.texture_not_found |= found.is_none();
            self.texture_paths.insert(suffix.to_string(), found);
        }

        if let Some(value) = self.properties.get("stackSize") {
            self.stack_size_threshold = parse_stack_size(value);
            self.flags.has_invalid_stack_size = self.stack_size_threshold.is_none();
            self.flags.has_invalid_stack_size_group = !has_valid_stack_group(&self.path);
        }

        self.flags.has_invalid_type = !VALID_TYPES.contains(&self.type_value());
    }

    /// First failing check, in the fixed order the report categories are evaluated.
    pub fn validate(&self) -> Result<(), RejectReason> {
        let flags = &self.flags;
        let checks = [
            (flags.has_invalid_type, RejectReason::InvalidType),
            (!flags.has_items, RejectReason::MissingItems),
            (
                flags.has_unsupported_texture_override,
                RejectReason::UnsupportedTextureOverride,
            ),
            (
                flags.has_unsupported_model_override,
                RejectReason::UnsupportedModelOverride,
            ),
            (flags.model_not_found, RejectReason::ModelNotFound),
            (flags.texture_not_found, RejectReason::TextureNotFound),
            (flags.has_invalid_stack_size, RejectReason::InvalidStackSize),
            (
                flags.has_invalid_stack_size_group,
                RejectReason::InvalidStackSizeGroup,
            ),
        ];
        match checks.into_iter().find(|(failed, _)| *failed) {
            Some((_, reason)) => Err(reason),
            None => Ok(()),
        }
    }

    /// True when this record declares a usable stack-size threshold.
    pub fn has_valid_stack_size(&self) -> bool {
        self.flags.has_stack_size && self.stack_size_threshold.is_some()
    }
}

/// Applies the legacy key aliases and defaults:
/// missing or `default` type becomes `item`, `matchItems` becomes `items`, and the
/// `minecraft:` namespace is stripped from every listed item id.
pub fn normalize_properties(raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut normalized = raw.clone();

    match normalized.get("type").map(String::as_str) {
        None | Some("default") => {
            normalized.insert("type".to_string(), "item".to_string());
        }
        Some(_) => {}
    }

    if let Some(items) = normalized.remove("matchItems") {
        normalized.insert("items".to_string(), items);
    }

    if let Some(items) = normalized.get_mut("items") {
        *items = items
            .split_whitespace()
            .map(|item| item.strip_prefix("minecraft:").unwrap_or(item))
            .collect::<Vec<_>>()
            .join(" ");
    }

    normalized
}

/// `N` or `min-max`; only the minimum is kept as the dispatch threshold.
pub fn parse_stack_size(value: &str) -> Option<u32> {
    match value.split_once('-') {
        Some((min, max)) => {
            let min = min.trim().parse::<u32>().ok()?;
            max.trim().parse::<u32>().ok()?;
            Some(min)
        }
        None => value.trim().parse::<u32>().ok(),
    }
}

/// Splits `name_12` into (`name`, 12). `None` when the stem has no numeric suffix.
pub fn split_numeric_suffix(stem: &str) -> Option<(&str, u32)> {
    let (base, suffix) = stem.rsplit_once('_')?;
    if base.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().map(|n| (base, n))
}

/// Group base of a stack-size rule file: the stem without its numeric suffix.
pub fn stack_group_base(stem: &str) -> &str {
    split_numeric_suffix(stem).map_or(stem, |(base, _)| base)
}

/// `<base>_<digits>.properties` files in `dir`, sorted by file name.
pub fn numeric_siblings(dir: &Path, base: &str) -> Vec<PathBuf> {
    let pattern = match Regex::new(&format!(r"^{}_([0-9]+)\.properties$", regex::escape(base))) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut siblings: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.is_match(n))
        })
        .collect();
    siblings.sort();
    siblings
}

/// A numeric-suffixed file needs its base file or another numeric sibling; an unsuffixed file
/// needs at least one numeric sibling.
fn has_valid_stack_group(path: &Path) -> bool {
    let Some(dir) = path.parent() else {
        return false;
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match split_numeric_suffix(&stem) {
        Some((base, _)) => {
            dir.join(format!("{base}.properties")).is_file()
                || numeric_siblings(dir, base)
                    .iter()
                    .any(|p| p.file_name() != path.file_name())
        }
        None => !numeric_siblings(dir, &stem).is_empty(),
    }
}
