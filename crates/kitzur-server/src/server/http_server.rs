//! HTTP server implementation for the kitzur shortcut API.

use crate::api::endpoints::{
    add_shortcut_handler, bearer_token, delete_shortcut_handler, get_public_shortcuts,
    get_server_info, get_user_shortcuts, Handled,
};
use crate::api::models::DeleteShortcutRequest;
use crate::server::utils::{get_api_server_port, resolve_port, save_api_port};

use kitzur_core::{AddShortcutRequest, FileBackend, KitzurError, Result};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

fn with_backend(
    backend: Arc<FileBackend>,
) -> impl Filter<Extract = (Arc<FileBackend>,), Error = Infallible> + Clone {
    warp::any().map(move || backend.clone())
}

/// Bearer token from the Authorization header, if any
fn with_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").map(bearer_token)
}

fn reply<T: Serialize>((status, body): Handled<T>) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&body), status)
}

/// All API routes over the given backend
pub fn routes(
    backend: Arc<FileBackend>,
    port: u16,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type", "Authorization"])
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    let public_route = warp::path!("api" / "shortcuts" / "public")
        .and(warp::get())
        .and(with_backend(backend.clone()))
        .then(|backend: Arc<FileBackend>| async move {
            reply(get_public_shortcuts(backend).await)
        });

    let user_route = warp::path!("api" / "transcription" / "shortcuts")
        .and(warp::get())
        .and(with_backend(backend.clone()))
        .and(with_token())
        .then(|backend: Arc<FileBackend>, token: Option<String>| async move {
            reply(get_user_shortcuts(backend, token).await)
        });

    let add_route = warp::path!("api" / "transcription" / "shortcuts")
        .and(warp::post())
        .and(with_backend(backend.clone()))
        .and(with_token())
        .and(warp::body::json())
        .then(
            |backend: Arc<FileBackend>, token: Option<String>, body: AddShortcutRequest| async move {
                reply(add_shortcut_handler(backend, token, body).await)
            },
        );

    let delete_route = warp::path!("api" / "transcription" / "shortcuts")
        .and(warp::delete())
        .and(with_backend(backend.clone()))
        .and(with_token())
        .and(warp::query::<DeleteShortcutRequest>())
        .then(
            |backend: Arc<FileBackend>, token: Option<String>, query: DeleteShortcutRequest| async move {
                reply(delete_shortcut_handler(backend, token, query.shortcut).await)
            },
        );

    let info_route = warp::path!("api" / "info")
        .and(warp::get())
        .and(with_backend(backend))
        .map(move |backend: Arc<FileBackend>| {
            warp::reply::json(&get_server_info(&backend, port))
        });

    // Health check endpoint
    let health_route = warp::path!("health").map(|| "kitzur API is running");

    public_route
        .or(user_route)
        .or(add_route)
        .or(delete_route)
        .or(info_route)
        .or(health_route)
        .with(cors)
        .with(warp::log("kitzur::api"))
}

/// Start the HTTP API server on the specified port, or the next free one
/// after it when that port is taken
pub async fn start_api_server(port: u16, db_path: PathBuf) -> Result<()> {
    let port = resolve_port(port)?;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let backend = Arc::new(FileBackend::new(db_path));

    // Save the port so `kitzur api-status` can find the server later
    save_api_port(port)?;

    let server = warp::serve(routes(backend.clone(), port)).try_bind_with_graceful_shutdown(
        addr,
        async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Received shutdown signal, stopping API server...");
        },
    );

    match server {
        Ok((addr, server)) => {
            log::info!(
                "kitzur API server listening on http://{} (database: {})",
                addr,
                backend.path().display()
            );
            server.await;
            Ok(())
        }
        Err(e) => Err(KitzurError::Other(format!(
            "Failed to bind to port {}: {}",
            port, e
        ))),
    }
}

/// Check that a previously started API server still accepts connections
pub fn check_api_server_health() -> Result<u16> {
    let port = get_api_server_port()?;
    match std::net::TcpStream::connect(format!("127.0.0.1:{}", port)) {
        Ok(_) => Ok(port),
        Err(e) => Err(KitzurError::Other(format!(
            "Failed to connect to API server on port {}: {}",
            port, e
        ))),
    }
}
