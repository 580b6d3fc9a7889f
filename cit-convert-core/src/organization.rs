//! Output routing: decides which namespace and sub-directory a converted asset is written to,
//! and the reference string that generated JSON uses to point at it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConvertError;
use crate::resolve::relative_to;

/// One entry of the routing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub original_path: String,
    pub target_namespace: String,
    pub target_ressource_root_relative_path: String,
}

/// On-disk shape of the routing file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationConfig {
    #[serde(default)]
    pub file_mapping: Vec<MappingRule>,
    #[serde(default)]
    pub file_mapping_regex: Vec<MappingRule>,
}

impl OrganizationConfig {
    pub fn trace_loaded(&self) {
        info!(
            exact_rules = self.file_mapping.len(),
            regex_rules = self.file_mapping_regex.len(),
            "Loaded routing rules"
        );
    }
}

/// Where an image is copied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDestination {
    Item,
    EquipHumanoid,
    EquipHumanoidLeggings,
    EquipWings,
}

/// Every kind of file the converter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    ItemModel,
    ItemDefinition,
    EquipmentDefinition,
    Texture(TextureDestination),
}

impl OutputKind {
    fn sub_path(self) -> &'static str {
        match self {
            OutputKind::ItemModel => "models/item",
            OutputKind::ItemDefinition => "items",
            OutputKind::EquipmentDefinition => "equipment",
            OutputKind::Texture(TextureDestination::Item) => "textures/item",
            OutputKind::Texture(TextureDestination::EquipHumanoid) => {
                "textures/entity/equipment/humanoid"
            }
            OutputKind::Texture(TextureDestination::EquipHumanoidLeggings) => {
                "textures/entity/equipment/humanoid_leggings"
            }
            OutputKind::Texture(TextureDestination::EquipWings) => {
                "textures/entity/equipment/wings"
            }
        }
    }

    fn reference_prefix(self) -> Option<&'static str> {
        match self {
            OutputKind::ItemModel | OutputKind::Texture(TextureDestination::Item) => Some("item"),
            _ => None,
        }
    }
}

/// Target namespace and root directory for a group of assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Router {
    pub namespace: String,
    pub root: String,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            root: ".".to_string(),
        }
    }
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.root)
    }
}

impl Router {
    /// `<output_root>/assets/<ns>/<kind sub-path>/<root>/<filename>`
    pub fn output_path(&self, output_root: &Path, kind: OutputKind, filename: &str) -> PathBuf {
        let mut path = output_root
            .join("assets")
            .join(&self.namespace)
            .join(kind.sub_path());
        for segment in segments(&self.root) {
            path.push(segment);
        }
        path.join(filename)
    }

    /// `ns:[prefix/]root/stem`, where `stem` is `filename` without its extension.
    pub fn reference(&self, kind: OutputKind, filename: &str) -> String {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut parts: Vec<&str> = Vec::new();
        if let Some(prefix) = kind.reference_prefix() {
            parts.push(prefix);
        }
        parts.extend(segments(&self.root));
        parts.extend(segments(&stem));
        format!("{}:{}", self.namespace, parts.join("/"))
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
}

/// Forward slashes, no doubled or trailing slash.
fn canonical(path: &str) -> String {
    let mut s = path.replace('\\', "/");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    s.trim_end_matches('/').to_string()
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Pattern(Regex),
}

#[derive(Debug, Clone)]
struct RoutingRule {
    matcher: Matcher,
    router: Router,
}

impl RoutingRule {
    fn matches(&self, relative: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(p) => p == relative,
            Matcher::Pattern(re) => re.is_match(relative),
        }
    }
}

/// Compiled routing table. Regex rules are consulted before exact rules; first match wins.
#[derive(Debug, Clone)]
pub struct OrganizationRules {
    pack_root: PathBuf,
    regex_rules: Vec<RoutingRule>,
    exact_rules: Vec<RoutingRule>,
}

impl OrganizationRules {
    pub fn new(pack_root: impl Into<PathBuf>, config: &OrganizationConfig) -> Result<Self, ConvertError> {
        let regex_rules = config
            .file_mapping_regex
            .iter()
            .map(|rule| {
                // Rules must match the whole relative path.
                let anchored = format!("^(?:{})$", canonical(&rule.original_path));
                let re = Regex::new(&anchored).map_err(|source| ConvertError::InvalidRule {
                    pattern: rule.original_path.clone(),
                    source,
                })?;
                Ok(RoutingRule {
                    matcher: Matcher::Pattern(re),
                    router: router_of(rule),
                })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;
        let exact_rules = config
            .file_mapping
            .iter()
            .map(|rule| RoutingRule {
                matcher: Matcher::Exact(canonical(&rule.original_path)),
                router: router_of(rule),
            })
            .collect();
        Ok(Self {
            pack_root: pack_root.into(),
            regex_rules,
            exact_rules,
        })
    }

    /// Rules that route nothing: every path gets the default router.
    pub fn empty(pack_root: impl Into<PathBuf>) -> Self {
        Self {
            pack_root: pack_root.into(),
            regex_rules: Vec::new(),
            exact_rules: Vec::new(),
        }
    }

    pub fn route(&self, path: &Path) -> Router {
        let Some(relative) = relative_to(&self.pack_root, path) else {
            debug!(path = %path.display(), "Path outside pack root, using default router");
            return Router::default();
        };
        let relative = canonical(&relative);
        self.regex_rules
            .iter()
            .chain(self.exact_rules.iter())
            .find(|rule| rule.matches(&relative))
            .map(|rule| rule.router.clone())
            .unwrap_or_default()
    }
}

fn router_of(rule: &MappingRule) -> Router {
    Router {
        namespace: rule.target_namespace.clone(),
        root: rule.target_ressource_root_relative_path.clone(),
    }
}
