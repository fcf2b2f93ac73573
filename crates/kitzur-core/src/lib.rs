pub mod backend;
pub mod cache;
pub mod compound;
pub mod config;
pub mod editor;
pub mod error;
pub mod expansion;
pub mod manager;
pub mod models;
pub mod numbers;
pub mod storage;
pub mod store;
pub mod undo;

// Re-export common items for convenience
pub use backend::ShortcutBackend;
pub use cache::{CacheStats, ShortcutCache};
pub use compound::{CompoundTransformer, PendingCompound};
pub use config::{get_config_dir, get_db_file_path, EngineConfig};
pub use editor::{EditKind, EditOutcome, TextBlockSession};
pub use error::{KitzurError, Result};
pub use expansion::{find_expansion, process_text, HEBREW_PREFIXES};
pub use manager::ShortcutManager;
pub use models::{
    AddShortcutRequest, ProcessTextResult, Session, ShortcutCategory, ShortcutEntry,
    ShortcutSnapshot, ShortcutSource, UndoHistoryItem, UserQuota,
};
pub use storage::FileBackend;
pub use store::ShortcutStore;
pub use undo::UndoLedger;
