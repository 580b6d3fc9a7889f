use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{write_json, AssetRegistry};
use crate::context::PackLayout;
use crate::error::ConversionError;
use crate::organization::{OutputKind, Router, TextureDestination};

/// Unresolvable parents are accepted when they point at built-in models.
const PARENT_SENTINELS: &[&str] = &["minecraft:", "item/", "block/", "builtin/"];
/// Unresolvable textures are accepted for back-references and built-in textures.
const TEXTURE_SENTINELS: &[&str] = &["#", "minecraft:", "item/", "block/"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub path: PathBuf,
    pub suffix: String,
}

/// A source JSON model, registered under a variant suffix.
#[derive(Debug, Clone)]
pub struct JsonModel {
    pub path: PathBuf,
    pub suffix: String,
    pub output_name: String,
    pub router: Router,
    converted: Option<String>,
}

impl JsonModel {
    fn output_name(path: &Path, suffix: &str) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if suffix.is_empty() {
            stem
        } else {
            format!("{stem}_{suffix}")
        }
    }

    /// Reference of the converted output, once converted.
    pub fn converted(&self) -> Option<&str> {
        self.converted.as_deref()
    }
}

fn read_model(path: &Path) -> Result<Map<String, Value>, ConversionError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ConversionError::json_model(path, format!("failed to read JSON file: {e}"))
    })?;
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ConversionError::json_model(
            path,
            "model root is not a JSON object",
        )),
        Err(e) => Err(ConversionError::json_model(
            path,
            format!("failed to parse JSON file: {e}"),
        )),
    }
}

fn has_sentinel(reference: &str, sentinels: &[&str]) -> bool {
    sentinels.iter().any(|s| reference.starts_with(s))
}

impl AssetRegistry {
    /// Returns the key of the model at `path` under `suffix`, registering and validating it
    /// (and its parent chain) on first use.
    pub fn json_model(
        &mut self,
        layout: &PackLayout,
        path: &Path,
        suffix: &str,
    ) -> Result<ModelKey, ConversionError> {
        self.register_model(layout, path, suffix, &mut Vec::new())
    }

    fn register_model(
        &mut self,
        layout: &PackLayout,
        path: &Path,
        suffix: &str,
        chain: &mut Vec<PathBuf>,
    ) -> Result<ModelKey, ConversionError> {
        let key = ModelKey {
            path: path.to_path_buf(),
            suffix: suffix.to_string(),
        };
        if self.models.contains_key(&key) {
            return Ok(key);
        }
        if chain.iter().any(|p| p == path) {
            let mut cycle = chain.clone();
            cycle.push(path.to_path_buf());
            return Err(ConversionError::CyclicParent {
                asset: path.to_path_buf(),
                chain: cycle,
            });
        }

        let output_name = JsonModel::output_name(path, suffix);
        self.model_names
            .claim(&output_name, path)
            .map_err(|existing| {
                ConversionError::json_model(
                    path,
                    format!(
                        "another JSON model with the name '{output_name}' already exists: {}",
                        existing.display()
                    ),
                )
            })?;

        chain.push(path.to_path_buf());
        let validated = self.validate_model(layout, path, suffix, chain);
        chain.pop();
        validated?;

        debug!(path = %path.display(), suffix, output_name = %output_name, "Registered JSON model");
        self.models.insert(
            key.clone(),
            JsonModel {
                path: path.to_path_buf(),
                suffix: suffix.to_string(),
                output_name,
                router: layout.route(path),
                converted: None,
            },
        );
        Ok(key)
    }

    fn validate_model(
        &mut self,
        layout: &PackLayout,
        path: &Path,
        suffix: &str,
        chain: &mut Vec<PathBuf>,
    ) -> Result<(), ConversionError> {
        let data = read_model(path)?;

        if let Some(parent) = data.get("parent") {
            let parent_ref = parent.as_str().ok_or_else(|| {
                ConversionError::json_model(path, "the 'parent' field is not a string")
            })?;
            match layout.resolver.find(path, parent_ref, ".json") {
                Some(parent_path) => {
                    self.register_model(layout, &parent_path, suffix, chain)?;
                }
                None if has_sentinel(parent_ref, PARENT_SENTINELS) => {}
                None => {
                    return Err(ConversionError::json_model(
                        path,
                        format!("parent '{parent_ref}' not found"),
                    ))
                }
            }
        }

        let Some(textures) = data.get("textures") else {
            return Ok(());
        };
        let textures = textures.as_object().ok_or_else(|| {
            ConversionError::json_model(path, "the 'textures' field is not an object")
        })?;
        for (texture_key, value) in textures {
            let texture_ref = value.as_str().ok_or_else(|| {
                ConversionError::json_model(
                    path,
                    format!("texture '{texture_key}' is not a string"),
                )
            })?;
            if layout.resolver.find(path, texture_ref, ".png").is_none()
                && !has_sentinel(texture_ref, TEXTURE_SENTINELS)
            {
                return Err(ConversionError::json_model(
                    path,
                    format!("texture '{texture_ref}' referenced by '{texture_key}' not found"),
                ));
            }
        }
        Ok(())
    }

    /// Converts a registered model, writing it to its routed item-model path, and returns its
    /// reference. A model is written once; later calls return the cached reference.
    ///
    /// When `texture_override` is set every texture slot of the model (and of its converted
    /// parents) is replaced by it.
    pub fn convert_model(
        &mut self,
        layout: &PackLayout,
        key: &ModelKey,
        texture_override: Option<&str>,
    ) -> Result<String, ConversionError> {
        self.convert_model_guarded(layout, key, texture_override, &mut Vec::new())
    }

    fn convert_model_guarded(
        &mut self,
        layout: &PackLayout,
        key: &ModelKey,
        texture_override: Option<&str>,
        chain: &mut Vec<PathBuf>,
    ) -> Result<String, ConversionError> {
        let model = self.models.get(key).cloned().ok_or_else(|| {
            ConversionError::json_model(&key.path, "JSON model was used before registration")
        })?;
        if let Some(reference) = model.converted {
            debug!(path = %model.path.display(), reference = %reference, "JSON model already converted");
            return Ok(reference);
        }
        if chain.contains(&model.path) {
            let mut cycle = chain.clone();
            cycle.push(model.path.clone());
            return Err(ConversionError::CyclicParent {
                asset: model.path.clone(),
                chain: cycle,
            });
        }

        let mut data = read_model(&model.path)?;

        let parent_ref = data
            .get("parent")
            .and_then(Value::as_str)
            .map(str::to_owned);
        if let Some(parent_ref) = parent_ref {
            if let Some(parent_path) = layout.resolver.find(&model.path, &parent_ref, ".json") {
                let parent_key = self.json_model(layout, &parent_path, &model.suffix)?;
                chain.push(model.path.clone());
                let parent = self.convert_model_guarded(layout, &parent_key, texture_override, chain);
                chain.pop();
                data.insert("parent".to_string(), Value::String(parent?));
            }
        }

        match data.get_mut("textures") {
            Some(Value::Object(textures)) => {
                for value in textures.values_mut() {
                    if let Some(texture) = texture_override {
                        *value = Value::String(texture.to_string());
                        continue;
                    }
                    let Some(texture_ref) = value.as_str() else {
                        continue;
                    };
                    if let Some(png_path) = layout.resolver.find(&model.path, texture_ref, ".png") {
                        self.png(layout, &png_path)?;
                        let reference =
                            self.convert_png(layout, &png_path, TextureDestination::Item)?;
                        *value = Value::String(reference);
                    }
                }
            }
            Some(_) => {}
            None => {
                if let Some(texture) = texture_override {
                    data.insert("textures".to_string(), json!({ "layer0": texture }));
                }
            }
        }

        if let Some(Value::Object(textures)) = data.get_mut("textures") {
            if !textures.contains_key("particle") {
                if let Some(first) = textures.keys().next().cloned() {
                    textures.insert("particle".to_string(), Value::String(format!("#{first}")));
                }
            }
        }

        let filename = format!("{}.json", model.output_name);
        let output = model
            .router
            .output_path(&layout.output_root, OutputKind::ItemModel, &filename);
        write_json(&output, &Value::Object(data)).map_err(|e| {
            ConversionError::json_model(
                &model.path,
                format!("failed to write converted model {}: {e}", output.display()),
            )
        })?;
        let reference = model.router.reference(OutputKind::ItemModel, &filename);
        debug!(path = %model.path.display(), output = %output.display(), reference = %reference, "Converted JSON model");

        if let Some(entry) = self.models.get_mut(key) {
            entry.converted = Some(reference.clone());
        }
        Ok(reference)
    }
}
