pub mod api;
pub mod server;

// Re-export for convenience
pub use api::{ApiResponse, ShortcutItem, ShortcutsPayload};
pub use server::utils::{get_api_server_port, port_is_available, resolve_port};
pub use server::{check_api_server_health, routes, start_api_server};
