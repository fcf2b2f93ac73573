//! Session-owned shortcut manager: loads snapshots from a backend, keeps the
//! store and cache in step, and applies personal-shortcut mutations.

use crate::backend::ShortcutBackend;
use crate::cache::{CacheStats, ShortcutCache};
use crate::config::EngineConfig;
use crate::error::{KitzurError, Result};
use crate::expansion::find_expansion;
use crate::models::{
    validate_shortcut_key, AddShortcutRequest, ProcessTextResult, Session, ShortcutCategory,
    ShortcutEntry, ShortcutSnapshot, ShortcutSource, UserQuota,
};
use crate::store::ShortcutStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub struct ShortcutManager<B: ShortcutBackend> {
    backend: B,
    config: EngineConfig,
    store: ShortcutStore,
    cache: ShortcutCache,
    session: Option<Session>,
    last_fetch: Option<DateTime<Utc>>,
}

impl<B: ShortcutBackend> ShortcutManager<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let cache = ShortcutCache::new(config.cache_size);
        Self {
            backend,
            config,
            store: ShortcutStore::new(),
            cache,
            session: None,
            last_fetch: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ShortcutStore {
        &self.store
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    /// Attach credentials and load the user's shortcuts
    pub async fn initialize(&mut self, session: Session) -> Result<()> {
        log::info!("Initializing shortcut manager for user '{}'", session.user_id);
        self.session = Some(session);
        self.last_fetch = None;
        self.load_shortcuts(true).await.map(|_| ())
    }

    /// Load system shortcuts only, for editors without a signed-in user
    pub async fn load_public(&mut self) -> Result<()> {
        match self.backend.load_public().await {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load public shortcuts, keeping current set: {}", e);
                Err(e)
            }
        }
    }

    /// Load the user's shortcuts unless the last load is younger than the
    /// refresh interval. Returns whether a load happened.
    ///
    /// A failed load keeps the current snapshot; matching goes on against it.
    pub async fn load_shortcuts(&mut self, force: bool) -> Result<bool> {
        let Some(session) = self.session.clone() else {
            return Err(KitzurError::Unauthorized);
        };

        if !force && self.is_fresh(Utc::now()) {
            log::debug!("Shortcut snapshot is fresh, skipping load");
            return Ok(false);
        }

        match self.backend.load_user(&session).await {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                Ok(true)
            }
            Err(e) => {
                log::warn!("Failed to load shortcuts, keeping current set: {}", e);
                Err(e)
            }
        }
    }

    pub async fn refresh(&mut self) -> Result<bool> {
        self.load_shortcuts(true).await
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_fetch else {
            return false;
        };
        match (now - last).to_std() {
            Ok(age) => age < self.config.refresh_interval(),
            // Clock went backwards; treat as stale
            Err(_) => false,
        }
    }

    fn apply_snapshot(&mut self, snapshot: ShortcutSnapshot) {
        self.store = ShortcutStore::from_snapshot(snapshot);
        self.cache.bulk_load(self.store.entries());
        self.last_fetch = Some(Utc::now());
        log::info!(
            "Loaded {} shortcuts ({} cached)",
            self.store.len(),
            self.cache.len()
        );
    }

    /// Run the matching engine; an expansion counts as a cache use
    pub fn process_text(&mut self, text: &str, cursor_position: usize) -> ProcessTextResult {
        match find_expansion(&self.store, &self.config, text, cursor_position) {
            Some(expansion) => {
                if self.cache.get(&expansion.key).is_none() {
                    if let Some(entry) = self.store.get(&expansion.key) {
                        self.cache.set(&expansion.key, entry.clone());
                    }
                }
                expansion.result
            }
            None => ProcessTextResult::unchanged(text, cursor_position),
        }
    }

    pub async fn add_personal_shortcut(
        &mut self,
        shortcut: &str,
        expansion: &str,
        description: Option<&str>,
    ) -> Result<ShortcutEntry> {
        self.add_personal(AddShortcutRequest {
            shortcut: shortcut.to_string(),
            expansion: expansion.to_string(),
            description: description.map(str::to_string),
            allow_override: false,
        })
        .await
    }

    /// Add a personal shortcut. On any error the shortcut set is left as it was.
    pub async fn add_personal(&mut self, request: AddShortcutRequest) -> Result<ShortcutEntry> {
        let Some(session) = self.session.as_ref() else {
            return Err(KitzurError::Unauthorized);
        };

        let quota = self.store.quota();
        if quota.is_exhausted() {
            return Err(KitzurError::QuotaExceeded { max: quota.max });
        }
        if !request.allow_override
            && self
                .store
                .get(&request.shortcut)
                .is_some_and(ShortcutEntry::is_system)
        {
            return Err(KitzurError::SystemShortcut(request.shortcut));
        }

        let entry = self.backend.add_personal(session, &request).await?;

        self.store.insert(request.shortcut.clone(), entry.clone());
        self.cache.set(&request.shortcut, entry.clone());
        self.store.quota_mut().used += 1;

        log::info!("Added personal shortcut '{}'", request.shortcut);
        Ok(entry)
    }

    /// Remove a personal shortcut. A system entry it overrode returns on the
    /// next load.
    pub async fn delete_personal_shortcut(&mut self, shortcut: &str) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Err(KitzurError::Unauthorized);
        };

        match self.store.get(shortcut) {
            None => return Err(KitzurError::NotFound(shortcut.to_string())),
            Some(entry) if entry.is_system() => {
                return Err(KitzurError::SystemShortcut(shortcut.to_string()))
            }
            Some(_) => {}
        }

        self.backend.delete_personal(session, shortcut).await?;

        self.store.remove(shortcut);
        self.cache.remove(shortcut);
        let quota = self.store.quota_mut();
        quota.used = quota.used.saturating_sub(1);

        log::info!("Deleted personal shortcut '{}'", shortcut);
        Ok(())
    }

    /// Replace a personal shortcut: delete the old key, then add the new one.
    /// The new key is checked first; if the add still fails the old entry is
    /// put back.
    pub async fn update_personal_shortcut(
        &mut self,
        old_shortcut: &str,
        new_shortcut: &str,
        expansion: &str,
        description: Option<&str>,
    ) -> Result<ShortcutEntry> {
        if self.session.is_none() {
            return Err(KitzurError::Unauthorized);
        }
        let old_entry = match self.store.get(old_shortcut) {
            None => return Err(KitzurError::NotFound(old_shortcut.to_string())),
            Some(entry) if entry.is_system() => {
                return Err(KitzurError::SystemShortcut(old_shortcut.to_string()))
            }
            Some(entry) => entry.clone(),
        };

        validate_shortcut_key(new_shortcut)?;
        if expansion.trim().is_empty() {
            return Err(KitzurError::InvalidShortcut(
                "expansion cannot be empty".to_string(),
            ));
        }
        if new_shortcut != old_shortcut {
            match self.store.get(new_shortcut) {
                Some(entry) if entry.is_system() => {
                    return Err(KitzurError::SystemShortcut(new_shortcut.to_string()))
                }
                Some(_) => return Err(KitzurError::DuplicateShortcut(new_shortcut.to_string())),
                None => {}
            }
        }

        self.delete_personal_shortcut(old_shortcut).await?;
        match self
            .add_personal_shortcut(new_shortcut, expansion, description)
            .await
        {
            Ok(entry) => Ok(entry),
            Err(e) => {
                log::warn!(
                    "Update of '{}' failed, restoring the old entry: {}",
                    old_shortcut,
                    e
                );
                let restore = AddShortcutRequest {
                    shortcut: old_shortcut.to_string(),
                    expansion: old_entry.expansion,
                    description: old_entry.description,
                    allow_override: true,
                };
                if let Err(restore_err) = self.add_personal(restore).await {
                    log::error!("Could not restore '{}': {}", old_shortcut, restore_err);
                }
                Err(e)
            }
        }
    }

    pub fn has_shortcut(&self, shortcut: &str) -> bool {
        self.store.contains(shortcut)
    }

    pub fn get_shortcut(&self, shortcut: &str) -> Option<&ShortcutEntry> {
        self.store.get(shortcut)
    }

    pub fn quota(&self) -> UserQuota {
        self.store.quota()
    }

    pub fn categories(&self) -> &[ShortcutCategory] {
        self.store.categories()
    }

    pub fn personal_shortcuts(&self) -> BTreeMap<String, ShortcutEntry> {
        self.store.by_source(ShortcutSource::User)
    }

    pub fn system_shortcuts(&self) -> BTreeMap<String, ShortcutEntry> {
        self.store.by_source(ShortcutSource::System)
    }

    pub fn shortcuts_by_category(&self) -> Vec<(String, Vec<(String, ShortcutEntry)>)> {
        self.store.by_category()
    }

    pub fn search(&self, query: &str) -> Vec<(String, ShortcutEntry)> {
        self.store.search(query)
    }

    /// Cached shortcuts starting with `prefix`, for the suggestion popup
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<(String, ShortcutEntry)> {
        self.cache
            .find_by_prefix(prefix, limit)
            .into_iter()
            .map(|e| (e.shortcut.clone(), e.entry.clone()))
            .collect()
    }

    /// Mark frequently used keys as recent so eviction spares them
    pub fn warm_up<S: AsRef<str>>(&mut self, shortcuts: &[S]) {
        self.cache.warm_up(shortcuts);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
