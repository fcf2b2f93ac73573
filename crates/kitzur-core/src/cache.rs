//! Bounded shortcut cache: a prefix tree over the keys plus a recency-ordered map.
//!
//! The trie only records which keys exist; entries live in the map alone, and
//! every insert or removal goes through [`ShortcutCache::insert_key`] /
//! [`ShortcutCache::remove_key`], so the two indexes always hold the same key set.

use crate::config::MAX_SHORTCUT_LEN;
use crate::models::ShortcutEntry;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub shortcut: String,
    pub entry: ShortcutEntry,
    /// Logical recency stamp; larger is more recent
    pub last_used: u64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    terminal: bool,
}

impl TrieNode {
    fn insert(&mut self, key: &str) {
        let mut node = self;
        for c in key.chars() {
            node = node.children.entry(c).or_default();
        }
        node.terminal = true;
    }

    /// Returns true when this node is left empty and can be pruned by its parent
    fn remove(&mut self, chars: &[char]) -> bool {
        match chars.split_first() {
            None => self.terminal = false,
            Some((c, rest)) => {
                let Some(child) = self.children.get_mut(c) else {
                    return false;
                };
                if child.remove(rest) {
                    self.children.remove(c);
                }
            }
        }
        !self.terminal && self.children.is_empty()
    }

    fn find(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = self;
        for c in prefix.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }

    fn collect_keys(&self, path: &mut String, out: &mut Vec<String>, limit: usize) {
        if out.len() >= limit {
            return;
        }
        if self.terminal {
            out.push(path.clone());
        }
        for (c, child) in &self.children {
            if out.len() >= limit {
                break;
            }
            path.push(*c);
            child.collect_keys(path, out, limit);
            path.pop();
        }
    }
}

#[derive(Debug)]
pub struct ShortcutCache {
    trie: TrieNode,
    entries: HashMap<String, CacheEntry>,
    max_size: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl ShortcutCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            trie: TrieNode::default(),
            entries: HashMap::new(),
            max_size: max_size.max(1),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn insert_key(&mut self, shortcut: &str, entry: CacheEntry) {
        self.trie.insert(shortcut);
        self.entries.insert(shortcut.to_string(), entry);
    }

    fn remove_key(&mut self, shortcut: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(shortcut)?;
        let chars: Vec<char> = shortcut.chars().collect();
        self.trie.remove(&chars);
        Some(removed)
    }

    fn least_recently_used(&self) -> Option<String> {
        self.entries
            .values()
            .min_by_key(|e| e.last_used)
            .map(|e| e.shortcut.clone())
    }

    /// Insert or overwrite a shortcut, evicting the least recently used entry when full
    pub fn set(&mut self, shortcut: &str, entry: ShortcutEntry) {
        let last_used = self.tick();

        if !self.entries.contains_key(shortcut) && self.entries.len() >= self.max_size {
            if let Some(lru) = self.least_recently_used() {
                log::debug!("Evicting shortcut '{}' from cache", lru);
                self.remove_key(&lru);
            }
        }

        self.insert_key(
            shortcut,
            CacheEntry {
                shortcut: shortcut.to_string(),
                entry,
                last_used,
            },
        );
    }

    /// Exact lookup; refreshes recency on a hit
    pub fn get(&mut self, shortcut: &str) -> Option<&CacheEntry> {
        let stamp = self.tick();
        match self.entries.get_mut(shortcut) {
            Some(entry) => {
                self.hits += 1;
                entry.last_used = stamp;
                Some(entry)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Lookup without touching recency or statistics
    pub fn peek(&self, shortcut: &str) -> Option<&CacheEntry> {
        self.entries.get(shortcut)
    }

    pub fn contains(&self, shortcut: &str) -> bool {
        self.entries.contains_key(shortcut)
    }

    pub fn remove(&mut self, shortcut: &str) -> Option<CacheEntry> {
        self.remove_key(shortcut)
    }

    /// Up to `limit` entries whose key starts with `prefix`, in trie order
    pub fn find_by_prefix(&self, prefix: &str, limit: usize) -> Vec<&CacheEntry> {
        let Some(node) = self.trie.find(prefix) else {
            return Vec::new();
        };

        let mut keys = Vec::new();
        let mut path = prefix.to_string();
        node.collect_keys(&mut path, &mut keys, limit);

        keys.iter().filter_map(|k| self.entries.get(k)).collect()
    }

    /// Longest cached key that `text` ends with, looking back at most
    /// `MAX_SHORTCUT_LEN` characters
    pub fn find_match(&mut self, text: &str) -> Option<CacheEntry> {
        let starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let window = starts.len().saturating_sub(MAX_SHORTCUT_LEN);

        for &start in &starts[window..] {
            if let Some(entry) = self.get(&text[start..]) {
                return Some(entry.clone());
            }
        }
        None
    }

    /// Replace the whole cache contents; longer keys are inserted first
    pub fn bulk_load(&mut self, mut shortcuts: Vec<(String, ShortcutEntry)>) {
        self.clear();
        shortcuts.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        for (shortcut, entry) in shortcuts {
            self.set(&shortcut, entry);
        }
    }

    /// Mark the given keys as recently used
    pub fn warm_up<S: AsRef<str>>(&mut self, shortcuts: &[S]) {
        for shortcut in shortcuts {
            self.get(shortcut.as_ref());
        }
    }

    pub fn clear(&mut self) {
        self.trie = TrieNode::default();
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(expansion: &str) -> ShortcutEntry {
        ShortcutEntry::system(expansion)
    }

    #[test]
    fn get_counts_hits_and_misses() {
        let mut cache = ShortcutCache::new(10);
        cache.set("בס", entry("בית ספר"));

        assert_eq!(cache.get("בס").unwrap().entry.expansion, "בית ספר");
        assert!(cache.get("חסר").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = ShortcutCache::new(2);
        cache.set("a", entry("A"));
        cache.set("b", entry("B"));
        cache.get("a");
        cache.set("c", entry("C"));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.find_by_prefix("b", 10).is_empty());
    }

    #[test]
    fn overwrite_does_not_evict() {
        let mut cache = ShortcutCache::new(2);
        cache.set("a", entry("A"));
        cache.set("b", entry("B"));
        cache.set("a", entry("A2"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek("a").unwrap().entry.expansion, "A2");
        assert!(cache.contains("b"));
    }

    #[test]
    fn prefix_search_respects_limit_and_keeps_longer_keys() {
        let mut cache = ShortcutCache::new(10);
        cache.set("ב", entry("1"));
        cache.set("בס", entry("2"));
        cache.set("בסד", entry("3"));
        cache.set("גן", entry("4"));

        let keys: Vec<&str> = cache
            .find_by_prefix("ב", 10)
            .iter()
            .map(|e| e.shortcut.as_str())
            .collect();
        assert_eq!(keys, vec!["ב", "בס", "בסד"]);
        assert_eq!(cache.find_by_prefix("ב", 2).len(), 2);
        assert!(cache.find_by_prefix("ת", 10).is_empty());
    }

    #[test]
    fn removing_inner_key_keeps_descendants() {
        let mut cache = ShortcutCache::new(10);
        cache.set("בס", entry("2"));
        cache.set("בסד", entry("3"));

        cache.remove("בס");
        let keys: Vec<&str> = cache
            .find_by_prefix("", 10)
            .iter()
            .map(|e| e.shortcut.as_str())
            .collect();
        assert_eq!(keys, vec!["בסד"]);
    }

    #[test]
    fn find_match_prefers_longest_suffix() {
        let mut cache = ShortcutCache::new(10);
        cache.set("ס", entry("short"));
        cache.set("בס", entry("long"));

        let found = cache.find_match("שלום בס").unwrap();
        assert_eq!(found.shortcut, "בס");
        assert!(cache.find_match("שלום").is_none());
    }

    #[test]
    fn bulk_load_and_clear_reset_counters() {
        let mut cache = ShortcutCache::new(10);
        cache.get("x");
        cache.bulk_load(vec![
            ("a".to_string(), entry("A")),
            ("abc".to_string(), entry("ABC")),
        ]);

        assert_eq!(cache.stats().misses, 0);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.find_by_prefix("", 10).is_empty());
    }
}
