//! # contract: seams between the conversion engine and its I/O collaborators
//!
//! The engine never parses rule files itself. It asks a [`PropertiesReader`] for the flat
//! key/value mapping of a rule file, so tests (and alternative front-ends) can feed records
//! without touching the legacy text format.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; enable the `test-export-mocks` feature (on by default)
//!   to get `MockPropertiesReader` in downstream test crates.

use mockall::automock;
use std::collections::BTreeMap;
use std::path::Path;

/// Reads one legacy rule file into its raw key/value pairs.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PropertiesReader {
    fn read_properties(&self, path: &Path) -> std::io::Result<BTreeMap<String, String>>;
}
