pub mod http_server;
pub mod utils;

pub use http_server::{check_api_server_health, routes, start_api_server};
