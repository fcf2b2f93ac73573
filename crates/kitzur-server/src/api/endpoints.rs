use crate::api::models::{ApiResponse, ApiServerInfo, ShortcutItem, ShortcutsPayload};
use kitzur_core::{
    AddShortcutRequest, FileBackend, KitzurError, Session, ShortcutBackend,
};
use std::sync::Arc;
use warp::http::StatusCode;

pub type Handled<T> = (StatusCode, ApiResponse<T>);

/// HTTP status for a failed call
pub fn status_for(error: &KitzurError) -> StatusCode {
    match error {
        KitzurError::Unauthorized => StatusCode::UNAUTHORIZED,
        KitzurError::NotFound(_) => StatusCode::NOT_FOUND,
        KitzurError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
        KitzurError::SystemShortcut(_) | KitzurError::DuplicateShortcut(_) => StatusCode::CONFLICT,
        KitzurError::InvalidShortcut(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failed<T>(error: KitzurError) -> Handled<T> {
    match status_for(&error) {
        StatusCode::INTERNAL_SERVER_ERROR => log::error!("Request failed: {}", error),
        _ => log::debug!("Request rejected: {}", error),
    }
    (status_for(&error), ApiResponse::from_error(&error))
}

/// Strip the `Bearer ` scheme from an Authorization header value
pub fn bearer_token(header: Option<String>) -> Option<String> {
    let value = header?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn authenticate(backend: &FileBackend, token: Option<String>) -> Result<Session, KitzurError> {
    let token = token.ok_or(KitzurError::Unauthorized)?;
    backend.session_for_token(&token)
}

/// System shortcuts for signed-out editors
pub async fn get_public_shortcuts(backend: Arc<FileBackend>) -> Handled<ShortcutsPayload> {
    match backend.load_public().await {
        Ok(snapshot) => (StatusCode::OK, ApiResponse::success(snapshot.into())),
        Err(e) => failed(e),
    }
}

/// System shortcuts merged with the caller's personal ones
pub async fn get_user_shortcuts(
    backend: Arc<FileBackend>,
    token: Option<String>,
) -> Handled<ShortcutsPayload> {
    let session = match authenticate(&backend, token) {
        Ok(session) => session,
        Err(e) => return failed(e),
    };
    match backend.load_user(&session).await {
        Ok(snapshot) => (StatusCode::OK, ApiResponse::success(snapshot.into())),
        Err(e) => failed(e),
    }
}

/// Add a personal shortcut
pub async fn add_shortcut_handler(
    backend: Arc<FileBackend>,
    token: Option<String>,
    request: AddShortcutRequest,
) -> Handled<ShortcutItem> {
    let session = match authenticate(&backend, token) {
        Ok(session) => session,
        Err(e) => return failed(e),
    };
    match backend.add_personal(&session, &request).await {
        Ok(entry) => (
            StatusCode::CREATED,
            ApiResponse::success(ShortcutItem::new(request.shortcut, entry)),
        ),
        Err(e) => failed(e),
    }
}

/// Delete a personal shortcut
pub async fn delete_shortcut_handler(
    backend: Arc<FileBackend>,
    token: Option<String>,
    shortcut: String,
) -> Handled<()> {
    let session = match authenticate(&backend, token) {
        Ok(session) => session,
        Err(e) => return failed(e),
    };
    match backend.delete_personal(&session, &shortcut).await {
        Ok(()) => (StatusCode::OK, ApiResponse::success(())),
        Err(e) => failed(e),
    }
}

/// Where this server listens and which database it serves
pub fn get_server_info(backend: &FileBackend, port: u16) -> ApiResponse<ApiServerInfo> {
    ApiResponse::success(ApiServerInfo {
        port,
        url: format!("http://localhost:{}", port),
        database: backend.path().to_string_lossy().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(
            bearer_token(Some("Bearer abc".to_string())).as_deref(),
            Some("abc")
        );
        assert_eq!(bearer_token(Some("Basic abc".to_string())), None);
        assert_eq!(bearer_token(Some("Bearer   ".to_string())), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            status_for(&KitzurError::QuotaExceeded { max: 100 }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&KitzurError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&KitzurError::SystemShortcut("בס".to_string())),
            StatusCode::CONFLICT
        );
    }
}
