use crate::models::{ShortcutCategory, ShortcutEntry, ShortcutSnapshot, ShortcutSource, UserQuota};
use std::collections::{BTreeMap, HashMap};

/// In-memory shortcut set: the effective mapping the matching engine runs against.
///
/// Keys are kept in a second list ordered longest-first so the matcher can scan
/// without sorting on every keystroke.
#[derive(Debug, Default, Clone)]
pub struct ShortcutStore {
    shortcuts: HashMap<String, ShortcutEntry>,
    by_length: Vec<String>,
    categories: Vec<ShortcutCategory>,
    quota: UserQuota,
}

impl ShortcutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ShortcutSnapshot) -> Self {
        let mut store = Self {
            shortcuts: snapshot.shortcuts.into_iter().collect(),
            by_length: Vec::new(),
            categories: snapshot.categories,
            quota: snapshot.quota,
        };
        store.categories.sort_by_key(|c| c.display_order);
        store.reindex();
        store
    }

    fn reindex(&mut self) {
        let mut keys: Vec<String> = self.shortcuts.keys().cloned().collect();
        // Ties broken lexically so scans are deterministic
        keys.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        self.by_length = keys;
    }

    pub fn insert(&mut self, shortcut: String, entry: ShortcutEntry) {
        self.shortcuts.insert(shortcut, entry);
        self.reindex();
    }

    pub fn remove(&mut self, shortcut: &str) -> Option<ShortcutEntry> {
        let removed = self.shortcuts.remove(shortcut);
        if removed.is_some() {
            self.reindex();
        }
        removed
    }

    pub fn get(&self, shortcut: &str) -> Option<&ShortcutEntry> {
        self.shortcuts.get(shortcut)
    }

    pub fn contains(&self, shortcut: &str) -> bool {
        self.shortcuts.contains_key(shortcut)
    }

    /// Keys ordered longest first
    pub fn keys_longest_first(&self) -> impl Iterator<Item = &str> {
        self.by_length.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ShortcutEntry)> {
        self.shortcuts.iter()
    }

    /// Owned copy of every entry, for cache rebuilds
    pub fn entries(&self) -> Vec<(String, ShortcutEntry)> {
        self.shortcuts
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    pub fn categories(&self) -> &[ShortcutCategory] {
        &self.categories
    }

    pub fn quota(&self) -> UserQuota {
        self.quota
    }

    pub fn quota_mut(&mut self) -> &mut UserQuota {
        &mut self.quota
    }

    pub fn by_source(&self, source: ShortcutSource) -> BTreeMap<String, ShortcutEntry> {
        self.shortcuts
            .iter()
            .filter(|(_, e)| e.source == source)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Entries grouped by category; known categories first in display order,
    /// then `uncategorized`, then any category the backend did not list
    pub fn by_category(&self) -> Vec<(String, Vec<(String, ShortcutEntry)>)> {
        let mut grouped: Vec<(String, Vec<(String, ShortcutEntry)>)> = self
            .categories
            .iter()
            .map(|c| (c.name.clone(), Vec::new()))
            .collect();
        grouped.push(("uncategorized".to_string(), Vec::new()));

        let mut keys: Vec<&String> = self.shortcuts.keys().collect();
        keys.sort();

        for key in keys {
            let entry = &self.shortcuts[key];
            let category = entry.category.as_deref().unwrap_or("uncategorized");
            let slot = match grouped.iter().position(|(name, _)| name == category) {
                Some(index) => index,
                None => {
                    grouped.push((category.to_string(), Vec::new()));
                    grouped.len() - 1
                }
            };
            grouped[slot].1.push((key.clone(), entry.clone()));
        }

        grouped
    }

    /// Case-insensitive search over key, expansion and description
    pub fn search(&self, query: &str) -> Vec<(String, ShortcutEntry)> {
        let query = query.to_lowercase();
        let mut results: Vec<(String, ShortcutEntry)> = self
            .shortcuts
            .iter()
            .filter(|(key, entry)| {
                key.to_lowercase().contains(&query)
                    || entry.expansion.to_lowercase().contains(&query)
                    || entry
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}
