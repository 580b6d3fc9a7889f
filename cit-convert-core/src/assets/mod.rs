//! Per-run asset registries.
//!
//! Every model, texture and generated model is registered once per run and converted at most
//! once. Output layouts are flat per namespace, so each registry also keeps a name table: two
//! different source files that would produce the same output name are rejected.

mod generic;
mod model;
mod texture;

pub use generic::{GenericKey, GenericModel};
pub use model::{JsonModel, ModelKey};
pub use texture::PngTexture;

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maps output names to the source file that claimed them.
#[derive(Debug, Default)]
struct NameTable {
    names: HashMap<String, PathBuf>,
}

impl NameTable {
    /// Claims `name` for `source`. Returns the previous owner when another file already has it.
    fn claim(&mut self, name: &str, source: &Path) -> Result<(), PathBuf> {
        match self.names.get(name) {
            Some(existing) if existing != source => Err(existing.clone()),
            Some(_) => Ok(()),
            None => {
                self.names.insert(name.to_string(), source.to_path_buf());
                Ok(())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    models: HashMap<ModelKey, JsonModel>,
    model_names: NameTable,
    textures: HashMap<PathBuf, PngTexture>,
    texture_names: NameTable,
    generics: HashMap<GenericKey, GenericModel>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self, key: &ModelKey) -> Option<&JsonModel> {
        self.models.get(key)
    }

    pub fn texture(&self, path: &Path) -> Option<&PngTexture> {
        self.textures.get(path)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

/// Pretty-prints `value` to `path`, creating parent directories.
pub(crate) fn write_json(path: &Path, value: &Value) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    fs::write(path, body)
}
