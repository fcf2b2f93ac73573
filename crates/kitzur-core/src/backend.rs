use crate::error::Result;
use crate::models::{AddShortcutRequest, Session, ShortcutEntry, ShortcutSnapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of shortcut snapshots and the place personal shortcuts are persisted.
///
/// The matching engine never calls into a backend; only
/// [`ShortcutManager`](crate::manager::ShortcutManager) does, on load and on
/// explicit mutations.
#[async_trait]
pub trait ShortcutBackend: Send + Sync {
    /// System shortcuts only, no credentials needed
    async fn load_public(&self) -> Result<ShortcutSnapshot>;

    /// System shortcuts merged with the user's personal ones
    async fn load_user(&self, session: &Session) -> Result<ShortcutSnapshot>;

    /// Persist a personal shortcut and return the stored entry
    async fn add_personal(
        &self,
        session: &Session,
        request: &AddShortcutRequest,
    ) -> Result<ShortcutEntry>;

    async fn delete_personal(&self, session: &Session, shortcut: &str) -> Result<()>;
}

#[async_trait]
impl<B: ShortcutBackend + ?Sized> ShortcutBackend for Arc<B> {
    async fn load_public(&self) -> Result<ShortcutSnapshot> {
        (**self).load_public().await
    }

    async fn load_user(&self, session: &Session) -> Result<ShortcutSnapshot> {
        (**self).load_user(session).await
    }

    async fn add_personal(
        &self,
        session: &Session,
        request: &AddShortcutRequest,
    ) -> Result<ShortcutEntry> {
        (**self).add_personal(session, request).await
    }

    async fn delete_personal(&self, session: &Session, shortcut: &str) -> Result<()> {
        (**self).delete_personal(session, shortcut).await
    }
}
