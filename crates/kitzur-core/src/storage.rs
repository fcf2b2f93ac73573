use crate::backend::ShortcutBackend;
use crate::config::{ensure_config_dir, get_db_file_path, DEFAULT_QUOTA_MAX};
use crate::error::{KitzurError, Result};
use crate::models::{
    validate_shortcut_key, AddShortcutRequest, Session, ShortcutCategory, ShortcutEntry,
    ShortcutSnapshot, ShortcutSource, UserQuota,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One shortcut as persisted in the database file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredShortcut {
    pub shortcut: String,
    pub expansion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Personal entry explicitly shadows a system entry with the same key
    #[serde(default)]
    pub override_system: bool,
}

impl StoredShortcut {
    fn to_entry(&self, source: ShortcutSource) -> ShortcutEntry {
        ShortcutEntry {
            expansion: self.expansion.clone(),
            source,
            category: self.category.clone(),
            description: self.description.clone(),
        }
    }
}

fn default_quota_max() -> u32 {
    DEFAULT_QUOTA_MAX
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub token: String,
    #[serde(default = "default_quota_max")]
    pub quota_max: u32,
    #[serde(default)]
    pub shortcuts: Vec<StoredShortcut>,
}

/// Layout of the JSON database file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutDatabase {
    #[serde(default)]
    pub categories: Vec<ShortcutCategory>,
    #[serde(default)]
    pub system: Vec<StoredShortcut>,
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
}

impl ShortcutDatabase {
    fn authenticate(&self, session: &Session) -> Result<&UserRecord> {
        self.users
            .get(&session.user_id)
            .filter(|user| user.token == session.token)
            .ok_or(KitzurError::Unauthorized)
    }

    fn authenticate_mut(&mut self, session: &Session) -> Result<&mut UserRecord> {
        self.users
            .get_mut(&session.user_id)
            .filter(|user| user.token == session.token)
            .ok_or(KitzurError::Unauthorized)
    }

    fn is_system(&self, shortcut: &str) -> bool {
        self.system.iter().any(|s| s.shortcut == shortcut)
    }

    fn system_entries(&self) -> BTreeMap<String, ShortcutEntry> {
        self.system
            .iter()
            .map(|s| (s.shortcut.clone(), s.to_entry(ShortcutSource::System)))
            .collect()
    }

    fn snapshot(&self, shortcuts: BTreeMap<String, ShortcutEntry>, quota: UserQuota) -> ShortcutSnapshot {
        let mut categories = self.categories.clone();
        categories.sort_by_key(|c| c.display_order);
        ShortcutSnapshot {
            shortcuts: shortcuts.into_iter().collect(),
            categories,
            quota,
        }
    }

    fn public_snapshot(&self) -> ShortcutSnapshot {
        self.snapshot(self.system_entries(), UserQuota::default())
    }

    /// System entries merged with the user's personal ones
    fn user_snapshot(&self, user: &UserRecord) -> ShortcutSnapshot {
        let mut shortcuts = self.system_entries();
        for personal in &user.shortcuts {
            if shortcuts.contains_key(&personal.shortcut) && !personal.override_system {
                log::warn!(
                    "Personal shortcut '{}' shadows a system shortcut without override, keeping the system entry",
                    personal.shortcut
                );
                continue;
            }
            shortcuts.insert(
                personal.shortcut.clone(),
                personal.to_entry(ShortcutSource::User),
            );
        }
        let quota = UserQuota::new(user.shortcuts.len() as u32, user.quota_max);
        self.snapshot(shortcuts, quota)
    }
}

/// Shortcut backend persisted in a single JSON file.
///
/// Every operation reads the file, applies its change, and writes it back with
/// a temp-file + rename so a crash never leaves a half-written database.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backend over the database in the kitzur configuration directory
    pub fn open_default() -> Result<Self> {
        ensure_config_dir()?;
        Ok(Self::new(get_db_file_path()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| KitzurError::Backend("database lock poisoned".to_string()))
    }

    /// Read the database. A missing or empty file is an empty database.
    pub fn load_database(&self) -> Result<ShortcutDatabase> {
        if !self.path.exists() {
            return Ok(ShortcutDatabase::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ShortcutDatabase::default());
        }

        serde_json::from_str(&content).map_err(|e| e.into())
    }

    pub fn save_database(&self, database: &ShortcutDatabase) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let serialized = serde_json::to_string_pretty(database)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, serialized)?;
        fs::rename(&temp_path, &self.path)?;

        log::debug!("Shortcut database written to {}", self.path.display());
        Ok(())
    }

    /// Resolve a bearer token to its session
    pub fn session_for_token(&self, token: &str) -> Result<Session> {
        let _guard = self.guard()?;
        let database = self.load_database()?;
        database
            .users
            .iter()
            .find(|(_, user)| !token.is_empty() && user.token == token)
            .map(|(user_id, user)| Session::new(user_id.clone(), user.token.clone()))
            .ok_or(KitzurError::Unauthorized)
    }

    /// Create the user if missing, or replace its token
    pub fn ensure_user(&self, user_id: &str, token: &str) -> Result<Session> {
        if user_id.trim().is_empty() || token.trim().is_empty() {
            return Err(KitzurError::Other(
                "user id and token cannot be empty".to_string(),
            ));
        }

        let _guard = self.guard()?;
        let mut database = self.load_database()?;
        database
            .users
            .entry(user_id.to_string())
            .and_modify(|user| user.token = token.to_string())
            .or_insert_with(|| UserRecord {
                token: token.to_string(),
                quota_max: DEFAULT_QUOTA_MAX,
                shortcuts: Vec::new(),
            });
        self.save_database(&database)?;

        log::info!("User '{}' registered", user_id);
        Ok(Session::new(user_id, token))
    }

    /// Insert or replace system shortcuts; unknown categories are appended in
    /// order of first appearance. Returns the number of entries written.
    pub fn seed_system(&self, entries: Vec<(String, ShortcutEntry)>) -> Result<usize> {
        for (shortcut, _) in &entries {
            validate_shortcut_key(shortcut)?;
        }

        let _guard = self.guard()?;
        let mut database = self.load_database()?;
        let count = entries.len();

        for (shortcut, entry) in entries {
            if let Some(category) = &entry.category {
                if !database.categories.iter().any(|c| &c.name == category) {
                    let display_order = database
                        .categories
                        .iter()
                        .map(|c| c.display_order + 1)
                        .max()
                        .unwrap_or(1);
                    database.categories.push(ShortcutCategory {
                        name: category.clone(),
                        display_order,
                    });
                }
            }

            let stored = StoredShortcut {
                shortcut: shortcut.clone(),
                expansion: entry.expansion,
                description: entry.description,
                category: entry.category,
                override_system: false,
            };
            match database.system.iter_mut().find(|s| s.shortcut == shortcut) {
                Some(existing) => *existing = stored,
                None => database.system.push(stored),
            }
        }

        self.save_database(&database)?;
        log::info!("Seeded {} system shortcuts", count);
        Ok(count)
    }
}

#[async_trait]
impl ShortcutBackend for FileBackend {
    async fn load_public(&self) -> Result<ShortcutSnapshot> {
        let _guard = self.guard()?;
        Ok(self.load_database()?.public_snapshot())
    }

    async fn load_user(&self, session: &Session) -> Result<ShortcutSnapshot> {
        let _guard = self.guard()?;
        let database = self.load_database()?;
        let user = database.authenticate(session)?;
        Ok(database.user_snapshot(user))
    }

    async fn add_personal(
        &self,
        session: &Session,
        request: &AddShortcutRequest,
    ) -> Result<ShortcutEntry> {
        let _guard = self.guard()?;
        let mut database = self.load_database()?;
        database.authenticate(session)?;

        validate_shortcut_key(&request.shortcut)?;
        if request.expansion.trim().is_empty() {
            return Err(KitzurError::InvalidShortcut(
                "expansion cannot be empty".to_string(),
            ));
        }

        let is_system = database.is_system(&request.shortcut);
        let user = database.authenticate_mut(session)?;

        if user.shortcuts.len() as u32 >= user.quota_max {
            return Err(KitzurError::QuotaExceeded {
                max: user.quota_max,
            });
        }
        if user.shortcuts.iter().any(|s| s.shortcut == request.shortcut) {
            return Err(KitzurError::DuplicateShortcut(request.shortcut.clone()));
        }
        if is_system && !request.allow_override {
            return Err(KitzurError::SystemShortcut(request.shortcut.clone()));
        }

        let stored = StoredShortcut {
            shortcut: request.shortcut.clone(),
            expansion: request.expansion.clone(),
            description: request.description.clone(),
            category: None,
            override_system: is_system,
        };
        let entry = stored.to_entry(ShortcutSource::User);
        user.shortcuts.push(stored);

        self.save_database(&database)?;
        log::info!(
            "Added personal shortcut '{}' for user '{}'",
            request.shortcut,
            session.user_id
        );
        Ok(entry)
    }

    async fn delete_personal(&self, session: &Session, shortcut: &str) -> Result<()> {
        let _guard = self.guard()?;
        let mut database = self.load_database()?;
        let is_system = database.is_system(shortcut);
        let user = database.authenticate_mut(session)?;

        let before = user.shortcuts.len();
        user.shortcuts.retain(|s| s.shortcut != shortcut);
        if user.shortcuts.len() == before {
            return Err(if is_system {
                KitzurError::SystemShortcut(shortcut.to_string())
            } else {
                KitzurError::NotFound(shortcut.to_string())
            });
        }

        self.save_database(&database)?;
        log::info!(
            "Deleted personal shortcut '{}' for user '{}'",
            shortcut,
            session.user_id
        );
        Ok(())
    }
}
