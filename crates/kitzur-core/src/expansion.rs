//! Shortcut matching engine.
//!
//! Given the text and a cursor position, decide whether the text just before the
//! cursor ends with a known shortcut (optionally carrying a Hebrew grammatical
//! prefix, optionally followed by one punctuation mark) and compute the splice.

use crate::config::EngineConfig;
use crate::models::{ProcessTextResult, ShortcutEntry};
use crate::store::ShortcutStore;

/// Hebrew grammatical prefixes that may attach to a shortcut, longest first
pub const HEBREW_PREFIXES: &[&str] = &["וש", "כש", "מה", "ו", "ה", "ש", "ב", "ל", "מ", "כ"];

/// Characters retried as "typed right after the shortcut"
pub const TRAILING_PUNCTUATION: &[char] = &[
    ',', '.', '!', '?', ':', ';', ')', ']', '}', '"', '-', '\\', '|', '%', '=', '׳', '\'',
];

const APOSTROPHES: &[char] = &['\'', '׳'];
const DEFINITE_ARTICLE: char = 'ה';

#[derive(Debug, Clone)]
struct Candidate<'a> {
    /// Store key the typed text resolved to
    key: &'a str,
    entry: &'a ShortcutEntry,
    prefix: Option<&'static str>,
    /// Characters of the key portion as typed (the variant key is one longer)
    key_len: usize,
    /// Typed text that will be replaced, prefix included
    typed: String,
    definite_variant: bool,
}

impl Candidate<'_> {
    fn rank(&self) -> (usize, usize) {
        (self.key_len, self.prefix.map_or(0, |p| p.chars().count()))
    }

    fn matched_len(&self) -> usize {
        self.typed.chars().count()
    }
}

pub fn is_trailing_punctuation(c: char) -> bool {
    TRAILING_PUNCTUATION.contains(&c)
}

/// Byte offset of the `index`-th character, clamped to the end of the string
pub(crate) fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Key variant with `ה` inserted after the apostrophe (`ב'ס` -> `ב'הס`), for
/// multi-word expansions only
fn definite_variant_key(key: &str, entry: &ShortcutEntry) -> Option<String> {
    if entry.expansion.split_whitespace().count() < 2 {
        return None;
    }
    let (index, apostrophe) = key.char_indices().find(|(_, c)| APOSTROPHES.contains(c))?;
    let split = index + apostrophe.len_utf8();
    Some(format!("{}{}{}", &key[..split], DEFINITE_ARTICLE, &key[split..]))
}

/// Put `ה` in front of the second word unless it already starts with one
fn with_definite_second_word(expansion: &str) -> String {
    let Some(gap) = expansion.find(char::is_whitespace) else {
        return expansion.to_string();
    };
    let rest = &expansion[gap..];
    let word_start = gap + (rest.len() - rest.trim_start().len());
    if expansion[word_start..].starts_with(DEFINITE_ARTICLE) {
        return expansion.to_string();
    }
    format!(
        "{}{}{}",
        &expansion[..word_start],
        DEFINITE_ARTICLE,
        &expansion[word_start..]
    )
}

/// Attach a grammatical prefix to an expansion
fn combine_prefix(prefix: &str, expansion: &str, english: bool) -> String {
    if prefix == "ה" && expansion.starts_with(DEFINITE_ARTICLE) {
        expansion.to_string()
    } else if english {
        format!("{}- {}", prefix, expansion)
    } else {
        format!("{}{}", prefix, expansion)
    }
}

/// Check `typed_key` (and its prefixed forms) against the end of `before`
fn consider<'a>(
    before: &str,
    typed_key: &str,
    key: &'a str,
    entry: &'a ShortcutEntry,
    definite_variant: bool,
    best: &mut Option<Candidate<'a>>,
) {
    if !before.ends_with(typed_key) {
        return;
    }

    let head = &before[..before.len() - typed_key.len()];
    let takes_prefix = typed_key.chars().next().is_some_and(char::is_alphabetic);
    let prefix = HEBREW_PREFIXES
        .iter()
        .copied()
        .find(|p| takes_prefix && head.ends_with(p));

    let candidate = Candidate {
        key,
        entry,
        prefix,
        key_len: typed_key.chars().count(),
        typed: format!("{}{}", prefix.unwrap_or(""), typed_key),
        definite_variant,
    };

    let better = match best {
        Some(current) => candidate.rank() > current.rank(),
        None => true,
    };
    if better {
        *best = Some(candidate);
    }
}

/// Best shortcut ending exactly at the end of `before`.
///
/// Longest key wins; for the same key, the prefixed form beats the bare one.
fn find_direct<'a>(store: &'a ShortcutStore, before: &str) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;

    for key in store.keys_longest_first() {
        let key_len = key.chars().count();
        if let Some(current) = &best {
            // Nothing shorter than this can beat the current match, variants included
            if key_len + 1 < current.key_len {
                break;
            }
        }

        let Some(entry) = store.get(key) else {
            continue;
        };

        consider(before, key, key, entry, false, &mut best);
        if let Some(variant) = definite_variant_key(key, entry) {
            consider(before, &variant, key, entry, true, &mut best);
        }
    }

    best
}

/// A successful expansion together with the store key it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub key: String,
    pub result: ProcessTextResult,
}

/// Expand a shortcut ending at `cursor_position` (in characters), reporting
/// which store key matched. `None` when nothing matches.
pub fn find_expansion(
    store: &ShortcutStore,
    config: &EngineConfig,
    text: &str,
    cursor_position: usize,
) -> Option<Expansion> {
    let cursor = cursor_position.min(text.chars().count());
    let (before, after) = text.split_at(byte_offset(text, cursor));

    let (candidate, punctuation) = match find_direct(store, before) {
        Some(candidate) => (candidate, None),
        None => {
            let last = before.chars().last().filter(|c| is_trailing_punctuation(*c))?;
            let stripped = &before[..before.len() - last.len_utf8()];
            (find_direct(store, stripped)?, Some(last))
        }
    };

    let base = if candidate.definite_variant {
        with_definite_second_word(&candidate.entry.expansion)
    } else {
        candidate.entry.expansion.clone()
    };
    let english = candidate
        .entry
        .category
        .as_deref()
        .is_some_and(|c| config.is_english_category(c));
    let expansion = match candidate.prefix {
        Some(prefix) => combine_prefix(prefix, &base, english),
        None => base,
    };

    let mut replacement = expansion.clone();
    if let Some(p) = punctuation {
        replacement.push(p);
    }

    let matched_len = candidate.matched_len() + usize::from(punctuation.is_some());
    let start = cursor - matched_len;
    let head = &before[..byte_offset(before, start)];

    log::debug!(
        "Expanding shortcut '{}' to '{}' at {}",
        candidate.typed,
        expansion,
        start
    );

    Some(Expansion {
        key: candidate.key.to_string(),
        result: ProcessTextResult {
            text: format!("{}{}{}", head, replacement, after),
            cursor_position: start + replacement.chars().count(),
            expanded: true,
            expanded_shortcut: Some(candidate.typed),
            expanded_to: Some(expansion),
        },
    })
}

/// Expand a shortcut ending at `cursor_position` (in characters), if any.
///
/// Never fails: when nothing matches, the input comes back unchanged with
/// `expanded == false`.
pub fn process_text(
    store: &ShortcutStore,
    config: &EngineConfig,
    text: &str,
    cursor_position: usize,
) -> ProcessTextResult {
    find_expansion(store, config, text, cursor_position)
        .map(|expansion| expansion.result)
        .unwrap_or_else(|| ProcessTextResult::unchanged(text, cursor_position))
}
