//! Read-time name replacement table
//!
//! The row streamer consults a `NameMap` for every record it emits. Names that
//! are not keys of the map pass through unchanged. The map is immutable once
//! built and is handed to the streamer as configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_MAPPING: [(&str, &str); 6] = [
    ("Dan Altenwerth Jr.", "Amina Yusuf"),
    ("Glenda Wisozk", "Elias Tekle"),
    ("Daniel Fahey IV", "Salem Haile"),
    ("Ronnie Bechtelar", "Hana Bekele"),
    ("Alma Bechtelar", "Tsehay Asfaw"),
    ("Jonathon Jones", "Melaku Degu"),
];

/// Immutable original-name to replacement-name table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap {
    entries: BTreeMap<String, String>,
}

impl NameMap {
    /// A map with no entries; every name passes through.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Replacement for `name`, or `name` itself on a miss
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Owned form of [`NameMap::resolve`]; reuses `name` on a miss.
    pub fn apply(&self, name: String) -> String {
        match self.entries.get(&name) {
            Some(replacement) => replacement.clone(),
            None => name,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NameMap {
    fn default() -> Self {
        DEFAULT_MAPPING.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NameMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
