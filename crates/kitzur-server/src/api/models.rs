//! Data models for API requests and responses.

use kitzur_core::{
    KitzurError, ShortcutCategory, ShortcutEntry, ShortcutSnapshot, ShortcutSource, UserQuota,
};
use serde::{Deserialize, Serialize};

/// Standard API response format
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Machine-readable error code, e.g. `QUOTA_EXCEEDED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            code: None,
        }
    }

    pub fn from_error(error: &KitzurError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.code().to_string()),
        }
    }
}

/// One shortcut as sent over the wire
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortcutItem {
    pub shortcut: String,
    pub expansion: String,
    pub source: ShortcutSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ShortcutItem {
    pub fn new(shortcut: String, entry: ShortcutEntry) -> Self {
        Self {
            shortcut,
            expansion: entry.expansion,
            source: entry.source,
            category: entry.category,
            description: entry.description,
        }
    }
}

/// Payload of the shortcut load endpoints
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShortcutsPayload {
    pub shortcuts: Vec<ShortcutItem>,
    pub categories: Vec<ShortcutCategory>,
    pub quota: UserQuota,
}

impl From<ShortcutSnapshot> for ShortcutsPayload {
    fn from(snapshot: ShortcutSnapshot) -> Self {
        Self {
            shortcuts: snapshot
                .shortcuts
                .into_iter()
                .map(|(shortcut, entry)| ShortcutItem::new(shortcut, entry))
                .collect(),
            categories: snapshot.categories,
            quota: snapshot.quota,
        }
    }
}

/// API server information
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiServerInfo {
    pub port: u16,
    pub url: String,
    pub database: String,
}

/// Query of the delete endpoint
#[derive(Deserialize, Debug)]
pub struct DeleteShortcutRequest {
    pub shortcut: String,
}
