use crate::config::MAX_SHORTCUT_LEN;
use crate::error::{KitzurError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who owns a shortcut entry
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutSource {
    System,
    User,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub expansion: String,
    pub source: ShortcutSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ShortcutEntry {
    pub fn system(expansion: impl Into<String>) -> Self {
        Self {
            expansion: expansion.into(),
            source: ShortcutSource::System,
            category: None,
            description: None,
        }
    }

    pub fn user(expansion: impl Into<String>) -> Self {
        Self {
            expansion: expansion.into(),
            source: ShortcutSource::User,
            category: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_system(&self) -> bool {
        self.source == ShortcutSource::System
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserQuota {
    pub used: u32,
    pub max: u32,
}

impl UserQuota {
    pub fn new(used: u32, max: u32) -> Self {
        Self { used, max }
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}

impl Default for UserQuota {
    fn default() -> Self {
        Self {
            used: 0,
            max: crate::config::DEFAULT_QUOTA_MAX,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortcutCategory {
    pub name: String,
    #[serde(default)]
    pub display_order: u32,
}

/// Everything a backend load returns
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ShortcutSnapshot {
    pub shortcuts: Vec<(String, ShortcutEntry)>,
    #[serde(default)]
    pub categories: Vec<ShortcutCategory>,
    #[serde(default)]
    pub quota: UserQuota,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddShortcutRequest {
    pub shortcut: String,
    pub expansion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicitly shadow a system shortcut with the same key
    #[serde(default)]
    pub allow_override: bool,
}

/// Credentials of an authenticated editor session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

/// Outcome of running the matching engine at a cursor position
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTextResult {
    pub text: String,
    pub cursor_position: usize,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_shortcut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_to: Option<String>,
}

impl ProcessTextResult {
    pub fn unchanged(text: &str, cursor_position: usize) -> Self {
        Self {
            text: text.to_string(),
            cursor_position,
            expanded: false,
            expanded_shortcut: None,
            expanded_to: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UndoHistoryItem {
    pub text: String,
    pub cursor_position: usize,
    pub is_shortcut_expansion: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_shortcut: Option<String>,
}

/// Punctuation characters accepted inside shortcut keys
const KEY_PUNCTUATION: &[char] = &[
    '\'', '"', '׳', '״', '.', ',', '!', '?', ':', ';', '-', '_', '/', '(', ')', '[', ']', '%',
    '&', '+', '=', '*', '@', '#',
];

/// Check that a key is 1..=20 characters of letters, digits and key punctuation
pub fn validate_shortcut_key(key: &str) -> Result<()> {
    let len = key.chars().count();
    if len == 0 {
        return Err(KitzurError::InvalidShortcut(
            "shortcut cannot be empty".to_string(),
        ));
    }
    if len > MAX_SHORTCUT_LEN {
        return Err(KitzurError::InvalidShortcut(format!(
            "shortcut '{}' is longer than {} characters",
            key, MAX_SHORTCUT_LEN
        )));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| !(c.is_alphanumeric() || KEY_PUNCTUATION.contains(c)))
    {
        return Err(KitzurError::InvalidShortcut(format!(
            "shortcut '{}' contains unsupported character '{}'",
            key, bad
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hebrew_latin_and_punctuation_keys() {
        for key in ["ב'ס", "פייסבוק", "fb", "א1", ".?", "עו\"ד"] {
            assert!(validate_shortcut_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn rejects_empty_long_and_spaced_keys() {
        assert!(validate_shortcut_key("").is_err());
        assert!(validate_shortcut_key(&"א".repeat(21)).is_err());
        assert!(validate_shortcut_key("two words").is_err());
    }

    #[test]
    fn entry_source_serializes_lowercase() {
        let json = serde_json::to_string(&ShortcutEntry::system("בית ספר")).unwrap();
        assert!(json.contains("\"source\":\"system\""));
        assert!(!json.contains("category"));
    }

    #[test]
    fn quota_remaining_saturates() {
        assert_eq!(UserQuota::new(120, 100).remaining(), 0);
        assert!(UserQuota::new(100, 100).is_exhausted());
        assert!(!UserQuota::new(99, 100).is_exhausted());
    }
}
