use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::organization::OrganizationConfig;

/// Everything a conversion run needs, already loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Root of the legacy pack (contains `assets/`).
    pub pack_root: PathBuf,
    /// Output directory; wiped and rebuilt on every run.
    pub output_dir: PathBuf,
    /// Namespaces searched, in order, for references without an explicit `ns:` prefix.
    pub namespaces: Vec<String>,
    pub organization: OrganizationConfig,
    /// Copied verbatim into the output root when set.
    pub pack_meta: Option<PathBuf>,
    pub report_path: PathBuf,
    pub conversions_path: PathBuf,
}

impl ConvertConfig {
    /// Config with the conventional file names, rooted at the given pack and output directories.
    pub fn new(pack_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pack_root: pack_root.into(),
            output_dir: output_dir.into(),
            namespaces: vec!["minecraft".to_string()],
            organization: OrganizationConfig::default(),
            pack_meta: None,
            report_path: PathBuf::from("conversion_report.md"),
            conversions_path: PathBuf::from("conversions.json"),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            pack_root = %self.pack_root.display(),
            output_dir = %self.output_dir.display(),
            namespaces = ?self.namespaces,
            "Loaded ConvertConfig"
        );
        debug!(?self, "ConvertConfig loaded (full debug)");
    }
}
