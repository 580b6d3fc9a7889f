//! Layered asset lookup: maps a logical reference (`ns:path`, `path`) found in a rule file or
//! model to a concrete file in the pack.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Candidate base directories, tried in order for each namespace. `{ns}` is substituted.
/// The directory of the referencing file is always tried before these.
const NAMESPACE_BASES: &[&str] = &[
    "",
    "assets",
    "assets/{ns}",
    "assets/{ns}/optifine",
    "assets/{ns}/optifine/cit",
    "assets/{ns}/textures",
    "assets/{ns}/models",
];

#[derive(Debug, Clone)]
pub struct PackResolver {
    pack_root: PathBuf,
    namespaces: Vec<String>,
}

impl PackResolver {
    pub fn new(pack_root: impl Into<PathBuf>, namespaces: Vec<String>) -> Self {
        Self {
            pack_root: pack_root.into(),
            namespaces,
        }
    }

    pub fn pack_root(&self) -> &Path {
        &self.pack_root
    }

    /// Finds the first existing file for `reference`, searching relative to `reference_root`
    /// (a file, whose directory is used, or a directory) and then the namespace-wide fallbacks.
    ///
    /// `extension` (e.g. `.png`) is appended when the reference does not already end with it.
    pub fn find(&self, reference_root: &Path, reference: &str, extension: &str) -> Option<PathBuf> {
        let (namespaces, relative) = match reference.split_once(':') {
            Some((ns, rest)) => (vec![ns.to_string()], rest),
            None => (self.namespaces.clone(), reference),
        };

        let root_dir = if reference_root.is_file() {
            reference_root.parent().unwrap_or(Path::new("")).to_path_buf()
        } else {
            reference_root.to_path_buf()
        };

        let mut relative = relative.replace('\\', "/");
        if !relative.ends_with(extension) {
            relative.push_str(extension);
        }
        let relative = relative.trim_start_matches('/');

        for ns in &namespaces {
            let mut bases = vec![root_dir.clone()];
            bases.extend(
                NAMESPACE_BASES
                    .iter()
                    .map(|b| self.pack_root.join(b.replace("{ns}", ns))),
            );
            for base in bases {
                let candidate = base.join(relative);
                if candidate.is_file() {
                    let found = normalize_path(&candidate);
                    debug!(reference, found = %found.display(), "Resolved pack reference");
                    return Some(found);
                }
            }
        }
        debug!(reference, root = %root_dir.display(), "Pack reference not found");
        None
    }
}

/// Lexical normalization: drops `.` components and folds `..` into the preceding component.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Forward-slash form of a path, without empty, `.` or trailing segments.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `path` relative to `base`, as a canonical forward-slash string.
///
/// Tries a lexical prefix match first and falls back to canonicalized paths, so that a pack
/// given as a relative path still matches files reached through `..` segments.
pub fn relative_to(base: &Path, path: &Path) -> Option<String> {
    let base_norm = normalize_path(base);
    let path_norm = normalize_path(path);
    if let Ok(rel) = path_norm.strip_prefix(&base_norm) {
        return Some(slash_path(rel));
    }
    let base_abs = base.canonicalize().ok()?;
    let path_abs = path.canonicalize().ok()?;
    path_abs
        .strip_prefix(&base_abs)
        .ok()
        .map(slash_path)
}

/// Relative path from directory `from_dir` to `to`, e.g. for links written in a report.
pub fn relative_link(from_dir: &Path, to: &Path) -> String {
    let from_norm = normalize_path(from_dir);
    let to_norm = normalize_path(to);
    let from: Vec<_> = from_norm.components().collect();
    let target: Vec<_> = to_norm.components().collect();
    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
