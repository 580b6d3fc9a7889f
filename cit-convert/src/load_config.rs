/// `load_config` module: Loads a JSON run config and the JSON5 routing file it points at, and
/// adapts both into the core crate's [`ConvertConfig`].
///
/// # Responsibilities
/// - Parse the user-supplied run config (`serde_json`) and routing file (`json5`)
/// - Fill in the conventional defaults for every optional field
/// - Resolve relative paths against the directory holding the run config
/// - Apply the `CIT_CONVERT_OUTPUT_PATH` environment override
///
/// # Errors
/// All errors use `anyhow::Error` with the offending path in the message, and are surfaced at
/// the CLI boundary.
use anyhow::Result;
use cit_convert_core::config::ConvertConfig;
use cit_convert_core::organization::OrganizationConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Environment variable that replaces the configured `output_path`.
pub const OUTPUT_PATH_ENV: &str = "CIT_CONVERT_OUTPUT_PATH";

const DEFAULT_PACK_ROOT: &str = "PACK_HB";
const DEFAULT_ORGANIZATION: &str = "organization.json5";
const DEFAULT_PACK_META: &str = "pack.mcmeta";
const DEFAULT_REPORT: &str = "conversion_report.md";
const DEFAULT_CONVERSIONS: &str = "conversions.json";

/// On-disk shape of the run config.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub output_path: PathBuf,
    #[serde(default)]
    pub pack_root: Option<PathBuf>,
    /// Routing file. Optional; when absent, `organization.json5` is used if it exists.
    #[serde(default)]
    pub organization: Option<PathBuf>,
    #[serde(default)]
    pub pack_meta: Option<PathBuf>,
    #[serde(default)]
    pub report_path: Option<PathBuf>,
    #[serde(default)]
    pub conversions_path: Option<PathBuf>,
    #[serde(default)]
    pub namespaces: Option<Vec<String>>,
}

/// Loads the run config at `path` into a [`ConvertConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConvertConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RunConfig = match serde_json::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config JSON successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config JSON");
            return Err(anyhow::anyhow!("Failed to parse config JSON {:?}: {e}", path_ref));
        }
    };

    let base_dir = path_ref
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let resolve = |p: &Path| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base_dir.join(p)
        }
    };

    let output_dir = match std::env::var(OUTPUT_PATH_ENV) {
        Ok(value) if !value.is_empty() => {
            info!(env = OUTPUT_PATH_ENV, output_path = %value, "Output path overridden from environment");
            PathBuf::from(value)
        }
        _ => resolve(&raw.output_path),
    };
    let pack_root = resolve(raw.pack_root.as_deref().unwrap_or(Path::new(DEFAULT_PACK_ROOT)));

    let organization = match &raw.organization {
        Some(file) => load_organization(&resolve(file))?,
        None => {
            let default = resolve(Path::new(DEFAULT_ORGANIZATION));
            if default.is_file() {
                load_organization(&default)?
            } else {
                warn!(path = %default.display(), "No routing file, every asset uses the default router");
                OrganizationConfig::default()
            }
        }
    };

    let pack_meta = match &raw.pack_meta {
        Some(meta) => Some(resolve(meta)),
        None => Some(resolve(Path::new(DEFAULT_PACK_META))).filter(|p| p.is_file()),
    };

    let mut config = ConvertConfig::new(pack_root, output_dir);
    config.organization = organization;
    config.pack_meta = pack_meta;
    config.report_path = resolve(raw.report_path.as_deref().unwrap_or(Path::new(DEFAULT_REPORT)));
    config.conversions_path = resolve(
        raw.conversions_path
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_CONVERSIONS)),
    );
    if let Some(namespaces) = raw.namespaces {
        config.namespaces = namespaces;
    }
    config.trace_loaded();
    Ok(config)
}

/// Parses a JSON5 routing file.
pub fn load_organization(path: &Path) -> Result<OrganizationConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = ?path, "Failed to read routing file");
        anyhow::anyhow!("Failed to read routing file {:?}: {}", path, e)
    })?;
    let organization: OrganizationConfig = json5::from_str(&content).map_err(|e| {
        error!(error = ?e, path = ?path, "Failed to parse routing file");
        anyhow::anyhow!("Failed to parse routing file {:?}: {e}", path)
    })?;
    organization.trace_loaded();
    Ok(organization)
}
