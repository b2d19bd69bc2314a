use axum::http::StatusCode;
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum RapportError {
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("timed out waiting for session lock '{0}'")]
    LockTimeout(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl RapportError {
    /// Storage error for undecodable persisted data. Corrupt records are
    /// surfaced, never silently replaced with a fresh default.
    pub fn corrupt(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("corrupt record for session '{key}': {err}"),
        ))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl axum::response::IntoResponse for RapportError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
