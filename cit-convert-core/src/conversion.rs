//! Conversion ledger: which target definitions each original item id (and component predicate)
//! now maps to. Entries are merged into `conversions.json` at the end of a run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Legacy prefixes marking a component value as a pattern rather than a literal.
const PATTERN_PREFIXES: &[&str] = &["iregex:", "ipattern:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorSlot {
    Head,
    Chest,
    Legs,
    Feet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentMatch {
    pub method: MatchMethod,
    pub value: String,
}

impl ComponentMatch {
    pub fn from_legacy(value: &str) -> Self {
        PATTERN_PREFIXES
            .iter()
            .find_map(|prefix| value.strip_prefix(prefix))
            .map(|pattern| ComponentMatch {
                method: MatchMethod::Regex,
                value: pattern.to_string(),
            })
            .unwrap_or_else(|| ComponentMatch {
                method: MatchMethod::Exact,
                value: value.to_string(),
            })
    }
}

/// One raw ledger record, as emitted by a rule file.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub item: String,
    pub original_components: BTreeMap<String, String>,
    pub target_item_def: Option<String>,
    pub target_armor_def: Option<String>,
    pub target_armor_slot: Option<ArmorSlot>,
    pub is_elytra: bool,
}

impl Conversion {
    /// One conversion per item id, all sharing the same targets.
    pub fn from_items(
        items: &[String],
        original_components: &BTreeMap<String, String>,
        target_item_def: Option<String>,
        target_armor_def: Option<String>,
        target_armor_slot: Option<ArmorSlot>,
        is_elytra: bool,
    ) -> Vec<Conversion> {
        items
            .iter()
            .map(|item| Conversion {
                item: item.clone(),
                original_components: original_components.clone(),
                target_item_def: target_item_def.clone(),
                target_armor_def: target_armor_def.clone(),
                target_armor_slot,
                is_elytra,
            })
            .collect()
    }

    pub fn generate(&self) -> ConversionEntry {
        ConversionEntry {
            item: self.item.clone(),
            original_components: self
                .original_components
                .iter()
                .map(|(k, v)| (k.clone(), ComponentMatch::from_legacy(v)))
                .collect(),
            target_item_def: self.target_item_def.clone(),
            target_armor_def: self.target_armor_def.clone(),
            target_armor_slot: self.target_armor_slot,
            is_elytra: self.target_armor_def.as_ref().map(|_| self.is_elytra),
        }
    }
}

/// Serialized form of a ledger entry in `conversions.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEntry {
    pub item: String,
    pub original_components: BTreeMap<String, ComponentMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_item_def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_armor_def: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_armor_slot: Option<ArmorSlot>,
    /// Present only alongside an equipment definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_elytra: Option<bool>,
}

type MergeKey = (String, Option<String>, Vec<(String, ComponentMatch)>);

impl ConversionEntry {
    fn merge_key(&self) -> MergeKey {
        // BTreeMap iteration is already sorted by component name.
        let predicate = self
            .original_components
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (self.item.clone(), self.target_item_def.clone(), predicate)
    }

    /// Fills armor fields that are still unset; never overwrites a set value.
    fn absorb(&mut self, other: ConversionEntry) {
        if self.target_armor_def.is_none() && other.target_armor_def.is_some() {
            self.target_armor_def = other.target_armor_def;
            if self.is_elytra.is_none() {
                self.is_elytra = other.is_elytra;
            }
        }
        if self.target_armor_slot.is_none() && other.target_armor_slot.is_some() {
            self.target_armor_slot = other.target_armor_slot;
        }
    }
}

#[derive(Debug, Default)]
pub struct ConversionLedger {
    conversions: Vec<Conversion>,
}

impl ConversionLedger {
    pub fn extend(&mut self, conversions: Vec<Conversion>) {
        self.conversions.extend(conversions);
    }

    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    /// Merges entries sharing (item, item definition, component predicate), in first-seen order.
    pub fn merged(&self) -> Vec<ConversionEntry> {
        let mut merged: Vec<ConversionEntry> = Vec::new();
        let mut index: HashMap<MergeKey, usize> = HashMap::new();
        for entry in self.conversions.iter().map(Conversion::generate) {
            let key = entry.merge_key();
            match index.get(&key) {
                Some(&i) => merged[i].absorb(entry),
                None => {
                    index.insert(key, merged.len());
                    merged.push(entry);
                }
            }
        }
        debug!(
            raw = self.conversions.len(),
            merged = merged.len(),
            "Merged conversion ledger"
        );
        merged
    }
}
