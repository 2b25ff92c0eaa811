use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain failures surfaced to clients. Every handler returns this; the
/// `IntoResponse` impl below is the only place statuses are assigned.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token type")]
    InvalidTokenType,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A valid token referenced a user that no longer exists. Stale tokens
    /// are an authentication problem, not a server fault.
    #[error("User not found")]
    UserNotFound,

    #[error("Username or email is required")]
    InsufficientIdentifier,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("{0}")]
    InvalidInput(String),

    #[error("User tokens not enough")]
    InsufficientBalance,

    /// The generation backend failed or was unreachable. Retryable; the
    /// caller's balance is never debited on this path.
    #[error("Generation service unavailable")]
    Upstream(#[source] anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated
            | ApiError::InvalidToken
            | ApiError::TokenExpired
            | ApiError::InvalidTokenType
            | ApiError::InvalidCredentials
            | ApiError::UserNotFound => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientIdentifier
            | ApiError::UserAlreadyExists
            | ApiError::InvalidInput(_)
            | ApiError::InsufficientBalance => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::NotAuthenticated => "not_authenticated",
            ApiError::InvalidToken => "invalid_token",
            ApiError::TokenExpired => "token_expired",
            ApiError::InvalidTokenType => "invalid_token_type",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::UserNotFound => "user_not_found",
            ApiError::InsufficientIdentifier => "insufficient_identifier",
            ApiError::UserAlreadyExists => "user_already_exists",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::InsufficientBalance => "insufficient_balance",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(anyhow::Error::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            // Do not leak internals; the full chain goes to the log.
            ApiError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            ApiError::Upstream(e) => {
                error!(error = ?e, "generation upstream failed");
                self.to_string()
            }
            _ => self.to_string(),
        };
        let body = Json(json!({ "error": self.reason(), "detail": detail }));
        (status, body).into_response()
    }
}
