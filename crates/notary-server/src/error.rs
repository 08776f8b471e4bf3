use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notary_service::NotaryError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("authorization denied: {action} for {actor}")]
    AuthorizationDenied { actor: String, action: String },

    #[error(transparent)]
    Notary(#[from] NotaryError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            Self::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            Self::Notary(e) => match e {
                NotaryError::Duplicate(_) => StatusCode::CONFLICT,
                NotaryError::InvalidRequest(_) | NotaryError::Io(_) => StatusCode::BAD_REQUEST,
                NotaryError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                NotaryError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::AuthFailed(_) => "unauthenticated",
            Self::AuthorizationDenied { .. } => "forbidden",
            Self::Notary(NotaryError::Duplicate(_)) => "duplicate",
            Self::Notary(NotaryError::InvalidRequest(_) | NotaryError::Io(_)) => "invalid_request",
            Self::Notary(NotaryError::StorageUnavailable(_)) => "storage_unavailable",
            Self::Notary(NotaryError::Integrity(_)) => "integrity",
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = json!({ "error": self.kind(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use notary_service::UniqueKey;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServerError::from(NotaryError::Duplicate(UniqueKey::Fingerprint)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServerError::from(NotaryError::StorageUnavailable("db locked".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServerError::from(NotaryError::InvalidRequest("filename".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServerError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::AuthorizationDenied { actor: "anonymous".into(), action: "submit".into() }
                .status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn duplicate_message_names_key() {
        let e = ServerError::from(NotaryError::Duplicate(UniqueKey::Fingerprint));
        assert!(e.to_string().contains("fingerprint"));
    }
}
