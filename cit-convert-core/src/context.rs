//! Run-scoped state: the immutable pack layout and the mutable registries and accumulators
//! that every rule file conversion reads from and writes to.

use std::path::{Path, PathBuf};

use crate::assets::AssetRegistry;
use crate::config::ConvertConfig;
use crate::contract::PropertiesReader;
use crate::conversion::ConversionLedger;
use crate::error::ConvertError;
use crate::organization::{OrganizationRules, Router};
use crate::report::ReportLog;
use crate::resolve::PackResolver;

/// Where inputs are looked up and where outputs are written.
#[derive(Debug, Clone)]
pub struct PackLayout {
    pub resolver: PackResolver,
    pub rules: OrganizationRules,
    pub output_root: PathBuf,
}

impl PackLayout {
    pub fn new(config: &ConvertConfig) -> Result<Self, ConvertError> {
        Ok(Self {
            resolver: PackResolver::new(&config.pack_root, config.namespaces.clone()),
            rules: OrganizationRules::new(&config.pack_root, &config.organization)?,
            output_root: config.output_dir.clone(),
        })
    }

    pub fn pack_root(&self) -> &Path {
        self.resolver.pack_root()
    }

    pub fn route(&self, path: &Path) -> Router {
        self.rules.route(path)
    }
}

/// Owned by one run; passed by `&mut` through resolution and synthesis.
pub struct ConvertContext<'a> {
    pub layout: &'a PackLayout,
    pub reader: &'a dyn PropertiesReader,
    pub assets: AssetRegistry,
    pub report: ReportLog,
    pub ledger: ConversionLedger,
}

impl<'a> ConvertContext<'a> {
    pub fn new(layout: &'a PackLayout, reader: &'a dyn PropertiesReader) -> Self {
        Self {
            layout,
            reader,
            assets: AssetRegistry::new(),
            report: ReportLog::default(),
            ledger: ConversionLedger::default(),
        }
    }
}
