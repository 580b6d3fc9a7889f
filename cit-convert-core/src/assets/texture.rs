use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::AssetRegistry;
use crate::context::PackLayout;
use crate::error::ConversionError;
use crate::organization::{OutputKind, Router, TextureDestination};

/// A source image. Copied once per destination it is requested for.
#[derive(Debug, Clone)]
pub struct PngTexture {
    pub path: PathBuf,
    pub router: Router,
    written: HashSet<TextureDestination>,
}

impl AssetRegistry {
    /// Registers the image at `path`; a different image with the same stem is a collision.
    pub fn png(&mut self, layout: &PackLayout, path: &Path) -> Result<(), ConversionError> {
        if self.textures.contains_key(path) {
            return Ok(());
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.texture_names.claim(&stem, path).map_err(|existing| {
            ConversionError::texture(
                path,
                format!(
                    "another PNG file with the name '{stem}' already exists: {}",
                    existing.display()
                ),
            )
        })?;
        debug!(path = %path.display(), "Registered PNG texture");
        self.textures.insert(
            path.to_path_buf(),
            PngTexture {
                path: path.to_path_buf(),
                router: layout.route(path),
                written: HashSet::new(),
            },
        );
        Ok(())
    }

    /// Copies a registered image (and its `.mcmeta` sidecar, if present) to the routed path for
    /// `destination` and returns its reference.
    pub fn convert_png(
        &mut self,
        layout: &PackLayout,
        path: &Path,
        destination: TextureDestination,
    ) -> Result<String, ConversionError> {
        let texture = self.textures.get_mut(path).ok_or_else(|| {
            ConversionError::texture(path, "PNG texture was used before registration")
        })?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = OutputKind::Texture(destination);
        let reference = texture.router.reference(kind, &file_name);
        if texture.written.contains(&destination) {
            return Ok(reference);
        }

        let output = texture
            .router
            .output_path(&layout.output_root, kind, &file_name);
        copy_with_parents(path, &output).map_err(|e| {
            ConversionError::texture(
                path,
                format!("failed to copy texture to {}: {e}", output.display()),
            )
        })?;

        let sidecar_name = format!("{file_name}.mcmeta");
        let sidecar = path.with_file_name(&sidecar_name);
        if sidecar.is_file() {
            let sidecar_output = output.with_file_name(&sidecar_name);
            copy_with_parents(&sidecar, &sidecar_output).map_err(|e| {
                ConversionError::texture(
                    &sidecar,
                    format!("failed to copy texture metadata to {}: {e}", sidecar_output.display()),
                )
            })?;
        }

        debug!(path = %path.display(), output = %output.display(), ?destination, "Copied PNG texture");
        texture.written.insert(destination);
        Ok(reference)
    }
}

fn copy_with_parents(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}
