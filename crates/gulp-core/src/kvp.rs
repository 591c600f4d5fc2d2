//! Ordered key → value-list multi-map used for inputs, outputs and envs.
//!
//! Raw stored data may repeat a key; lookups scan in stored order and take
//! the first hit. Writers dedup through [`Kvp::nuke_and_set`].
//!
//! The map is serialized as one JSON array of `{"key", "value"}` pairs.
//! [`Kvp::from_encoded`] reads the legacy form where every pair was its own
//! JSON string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvPair {
    pub key: String,
    #[serde(default)]
    pub value: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kvp(Vec<KvPair>);

impl KvPair {
    pub fn new(key: impl Into<String>, value: Vec<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl Kvp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the legacy per-entry encoding. One bad entry fails the whole
    /// decode so a caller never sees a partial map.
    pub fn from_encoded<S: AsRef<str>>(entries: &[S]) -> Result<Self, serde_json::Error> {
        entries
            .iter()
            .map(|e| serde_json::from_str::<KvPair>(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// First value of the first entry whose key matches; empty if none.
    pub fn matches(&self, key: &str) -> String {
        self.0
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.value.first())
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.iter().find(|p| p.key == key).map(|p| p.value.as_slice())
    }

    /// Remove every entry whose key is in `updates`, then append one entry
    /// per update key in the map's order.
    pub fn nuke_and_set(&mut self, updates: BTreeMap<String, Vec<String>>) {
        self.0.retain(|p| !updates.contains_key(&p.key));
        self.0
            .extend(updates.into_iter().map(|(key, value)| KvPair { key, value }));
    }

    pub fn nuke_keys(&mut self, key: &str) {
        self.0.retain(|p| p.key != key);
    }

    pub fn push(&mut self, key: impl Into<String>, value: Vec<String>) {
        self.0.push(KvPair::new(key, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &KvPair> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<KvPair>> for Kvp {
    fn from(pairs: Vec<KvPair>) -> Self {
        Self(pairs)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for Kvp {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| KvPair::new(k, v)).collect())
    }
}
