pub mod endpoints;
pub mod models;

pub use endpoints::{
    add_shortcut_handler, bearer_token, delete_shortcut_handler, get_public_shortcuts,
    get_user_shortcuts,
};
pub use models::{ApiResponse, ShortcutItem, ShortcutsPayload};
