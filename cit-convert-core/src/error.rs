//! Error types shared by the conversion engine.
//!
//! Two families exist:
//! - [`ConversionError`]: a per-asset problem (bad model JSON, unresolvable reference,
//!   name collision, cyclic parent). Caught at the rule-file boundary and written to the report.
//! - [`ConvertError`]: a fatal configuration or environment failure that ends the run.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    /// Validation or conversion failure of a JSON model (or of a final item definition write,
    /// in which case no single asset is to blame).
    #[error("{message}")]
    JsonModel {
        asset: Option<PathBuf>,
        message: String,
    },

    #[error("{message}")]
    Texture { asset: PathBuf, message: String },

    #[error("cyclic parent chain: {}", format_chain(chain))]
    CyclicParent { asset: PathBuf, chain: Vec<PathBuf> },
}

impl ConversionError {
    pub fn json_model(asset: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConversionError::JsonModel {
            asset: Some(asset.into()),
            message: message.into(),
        }
    }

    pub fn texture(asset: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConversionError::Texture {
            asset: asset.into(),
            message: message.into(),
        }
    }

    /// The model or texture file the error points at, if any.
    pub fn asset(&self) -> Option<&Path> {
        match self {
            ConversionError::JsonModel { asset, .. } => asset.as_deref(),
            ConversionError::Texture { asset, .. } => Some(asset),
            ConversionError::CyclicParent { asset, .. } => Some(asset),
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that abort a whole conversion run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid routing pattern '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to scan pack directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
