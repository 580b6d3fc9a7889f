use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use super::{write_json, AssetRegistry};
use crate::context::PackLayout;
use crate::error::ConversionError;
use crate::organization::{OutputKind, Router};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericKey {
    pub item: String,
    pub rule_name: String,
    pub suffix: String,
}

/// Model synthesized for a rule that declares a texture but no model.
#[derive(Debug, Clone)]
pub struct GenericModel {
    pub item: String,
    pub output_name: String,
    pub router: Router,
    converted: Option<String>,
}

impl AssetRegistry {
    /// Registers the generated model for `item` in rule `rule_name`, routed with the rule's
    /// router. Shares the JSON model name table.
    pub fn generic_model(
        &mut self,
        item: &str,
        rule_name: &str,
        suffix: &str,
        router: &Router,
    ) -> Result<GenericKey, ConversionError> {
        let key = GenericKey {
            item: item.to_string(),
            rule_name: rule_name.to_string(),
            suffix: suffix.to_string(),
        };
        if self.generics.contains_key(&key) {
            return Ok(key);
        }
        let base = format!("{rule_name}_from_{item}");
        let output_name = if suffix.is_empty() {
            base
        } else {
            format!("{base}_{suffix}")
        };
        let marker = PathBuf::from(&output_name);
        self.model_names
            .claim(&output_name, &marker)
            .map_err(|existing| {
                ConversionError::json_model(
                    &marker,
                    format!(
                        "a JSON model with the name '{output_name}' already exists: {}",
                        existing.display()
                    ),
                )
            })?;
        self.generics.insert(
            key.clone(),
            GenericModel {
                item: item.to_string(),
                output_name,
                router: router.clone(),
                converted: None,
            },
        );
        Ok(key)
    }

    pub fn convert_generic(
        &mut self,
        layout: &PackLayout,
        key: &GenericKey,
        texture_override: Option<&str>,
    ) -> Result<String, ConversionError> {
        let generic = self.generics.get_mut(key).ok_or_else(|| ConversionError::JsonModel {
            asset: None,
            message: format!("generic model for '{}' was used before registration", key.item),
        })?;
        if let Some(reference) = &generic.converted {
            return Ok(reference.clone());
        }
        let Some(texture) = texture_override else {
            return Err(ConversionError::json_model(
                &generic.output_name,
                "a texture is required to generate a generic model",
            ));
        };

        let data = json!({
            "parent": format!("minecraft:item/{}", generic.item),
            "textures": { "layer0": texture },
        });
        let filename = format!("{}.json", generic.output_name);
        let output = generic
            .router
            .output_path(&layout.output_root, OutputKind::ItemModel, &filename);
        write_json(&output, &data).map_err(|e| {
            ConversionError::json_model(
                &generic.output_name,
                format!("failed to write generic model {}: {e}", output.display()),
            )
        })?;
        let reference = generic.router.reference(OutputKind::ItemModel, &filename);
        debug!(item = %generic.item, reference = %reference, "Generated generic model");
        generic.converted = Some(reference.clone());
        Ok(reference)
    }
}
