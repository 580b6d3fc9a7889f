//! Line-oriented `key=value` reader for legacy rule files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::contract::PropertiesReader;

/// Default [`PropertiesReader`] backed by the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertiesFileReader;

impl PropertiesReader for PropertiesFileReader {
    fn read_properties(&self, path: &Path) -> std::io::Result<BTreeMap<String, String>> {
        let content = fs::read_to_string(path)?;
        let properties = parse_properties(&content);
        debug!(path = %path.display(), keys = properties.len(), "Read rule file");
        Ok(properties)
    }
}

/// Blank lines and `#` comments are skipped; the first `=` splits key from value and both
/// sides are trimmed. Later duplicates of a key win.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
