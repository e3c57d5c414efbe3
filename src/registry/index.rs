//! In-memory index of register ids by pickletype

use super::RegistryEntry;
use std::collections::{BTreeMap, BTreeSet};

/// Ids grouped by pickletype
///
/// `all_ids` is always the union of the buckets, each id lives in exactly one
/// bucket, and empty buckets are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryIndex {
    all_ids: BTreeSet<String>,
    ids_by_type: BTreeMap<String, BTreeSet<String>>,
    type_of: BTreeMap<String, String>,
}

impl RegistryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from scratch
    pub fn rebuild<'a>(entries: impl IntoIterator<Item = &'a RegistryEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(&entry.id, &entry.pickletype);
        }
        index
    }

    /// Add `id` under `pickletype`, moving it if already indexed elsewhere
    pub fn insert(&mut self, id: &str, pickletype: &str) {
        self.remove(id);

        self.all_ids.insert(id.to_string());
        self.ids_by_type
            .entry(pickletype.to_string())
            .or_default()
            .insert(id.to_string());
        self.type_of.insert(id.to_string(), pickletype.to_string());
    }

    /// Drop `id`, returning the pickletype it was filed under
    pub fn remove(&mut self, id: &str) -> Option<String> {
        let pickletype = self.type_of.remove(id)?;
        self.all_ids.remove(id);

        if let Some(bucket) = self.ids_by_type.get_mut(&pickletype) {
            bucket.remove(id);
            if bucket.is_empty() {
                self.ids_by_type.remove(&pickletype);
            }
        }

        Some(pickletype)
    }

    /// Move `id` to a new pickletype; returns false if `id` is not indexed
    pub fn retype(&mut self, id: &str, pickletype: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.insert(id, pickletype);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.all_ids.contains(id)
    }

    pub fn all_ids(&self) -> &BTreeSet<String> {
        &self.all_ids
    }

    pub fn ids_by_type(&self, pickletype: &str) -> Option<&BTreeSet<String>> {
        self.ids_by_type.get(pickletype)
    }

    pub fn pickletype_of(&self, id: &str) -> Option<&str> {
        self.type_of.get(id).map(String::as_str)
    }

    pub fn pickletypes(&self) -> impl Iterator<Item = &str> {
        self.ids_by_type.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }
}
