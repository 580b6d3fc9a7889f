//! Accumulates what could not be converted and renders the Markdown report.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::error::{ConversionError, ConvertError};
use crate::resolve::relative_link;

/// Why a rule file was not converted. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    MissingItems,
    UnsupportedTextureOverride,
    UnsupportedModelOverride,
    ModelNotFound,
    TextureNotFound,
    InvalidStackSize,
    InvalidStackSizeGroup,
    InvalidType,
    NbtOrphan,
    IconOrphan,
}

impl RejectReason {
    pub const ALL: [RejectReason; 10] = [
        RejectReason::MissingItems,
        RejectReason::UnsupportedTextureOverride,
        RejectReason::UnsupportedModelOverride,
        RejectReason::ModelNotFound,
        RejectReason::TextureNotFound,
        RejectReason::InvalidStackSize,
        RejectReason::InvalidStackSizeGroup,
        RejectReason::InvalidType,
        RejectReason::NbtOrphan,
        RejectReason::IconOrphan,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RejectReason::MissingItems => "Rule files without an 'items' property",
            RejectReason::UnsupportedTextureOverride => "Rule files with per-item texture overrides",
            RejectReason::UnsupportedModelOverride => "Rule files with per-item model overrides",
            RejectReason::ModelNotFound => "Rule files with a missing model file",
            RejectReason::TextureNotFound => "Rule files with a missing texture file",
            RejectReason::InvalidStackSize => "Rule files with an invalid stackSize",
            RejectReason::InvalidStackSizeGroup => "Rule files with an invalid stackSize group",
            RejectReason::InvalidType => "Rule files with an invalid type",
            RejectReason::NbtOrphan => "Orphan _nbt rule files (no base)",
            RejectReason::IconOrphan => "Orphan _icon rule files (no base)",
        }
    }
}

#[derive(Debug, Default)]
pub struct ReportLog {
    rejected: BTreeMap<RejectReason, Vec<PathBuf>>,
    errors: BTreeMap<PathBuf, ConversionError>,
    duplicates: BTreeMap<String, Vec<PathBuf>>,
}

impl ReportLog {
    pub fn reject(&mut self, reason: RejectReason, path: &Path) {
        warn!(path = %path.display(), ?reason, "Rule file not converted");
        self.rejected
            .entry(reason)
            .or_default()
            .push(path.to_path_buf());
    }

    /// Records a conversion error for a rule file; a later error for the same file replaces it.
    pub fn record_error(&mut self, path: &Path, err: ConversionError) {
        error!(
            path = %path.display(),
            asset = ?err.asset(),
            error = %err,
            "Conversion error"
        );
        self.errors.insert(path.to_path_buf(), err);
    }

    pub fn record_duplicate(&mut self, identity: String, paths: Vec<PathBuf>) {
        warn!(identity = %identity, count = paths.len(), "Duplicated rule name");
        self.duplicates.insert(identity, paths);
    }

    pub fn rejected(&self, reason: RejectReason) -> &[PathBuf] {
        self.rejected.get(&reason).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.values().map(Vec::len).sum()
    }

    pub fn errors(&self) -> &BTreeMap<PathBuf, ConversionError> {
        &self.errors
    }

    pub fn duplicates(&self) -> &BTreeMap<String, Vec<PathBuf>> {
        &self.duplicates
    }

    /// Renders the Markdown report; links are relative to the directory of `report_path`.
    pub fn render(&self, report_path: &Path) -> String {
        MarkdownReport {
            log: self,
            report_dir: report_path.parent().unwrap_or(Path::new("")),
        }
        .to_string()
    }

    pub fn write(&self, report_path: &Path) -> Result<(), ConvertError> {
        if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
        }
        fs::write(report_path, self.render(report_path))
            .map_err(|e| ConvertError::io(report_path, e))
    }
}

struct MarkdownReport<'a> {
    log: &'a ReportLog,
    report_dir: &'a Path,
}

impl MarkdownReport<'_> {
    fn link(&self, target: &Path) -> String {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());
        format!("[{name}]({})", relative_link(self.report_dir, target))
    }

    fn fmt_errors(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Rule files with JSON/PNG conversion errors\n")?;
        writeln!(f, "Total: {}\n", self.log.errors.len())?;
        writeln!(f, "| Rule file | JSON/PNG file | Error |")?;
        writeln!(f, "|---|---|---|")?;
        for (path, err) in &self.log.errors {
            let asset = err
                .asset()
                .map(|a| self.link(a))
                .unwrap_or_else(|| "-".to_string());
            let message = err.to_string().replace('|', "\\|");
            writeln!(f, "| {} | {} | {} |", self.link(path), asset, message)?;
        }
        writeln!(f)
    }

    fn fmt_duplicates(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Duplicated rule names\n")?;
        writeln!(f, "Total: {}\n", self.log.duplicates.len())?;
        for (identity, paths) in &self.log.duplicates {
            writeln!(f, "### {identity}\n")?;
            writeln!(f, "Used by {} rule files:\n", paths.len())?;
            for path in paths {
                writeln!(f, "- {}", self.link(path))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# CIT conversion report\n")?;
        for reason in RejectReason::ALL {
            if reason == RejectReason::NbtOrphan {
                self.fmt_errors(f)?;
                self.fmt_duplicates(f)?;
            }
            let paths = self.log.rejected(reason);
            writeln!(f, "## {}\n", reason.title())?;
            writeln!(f, "Total: {}\n", paths.len())?;
            for path in paths {
                writeln!(f, "- {}", self.link(path))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
