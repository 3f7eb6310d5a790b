use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::ingest::IngestError;
use crate::refresh::{RefreshError, RefreshRejection};

/// The main error type for the dashboard service
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests: {message}")]
    TooManyRequests {
        message: String,
        retry_after_seconds: u64,
    },

    /// The upstream source could not be turned into a dataset.
    ///
    /// Only reachable from admin routes, so the message is shown verbatim.
    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard error response body for API errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    success: bool,
    error: String,
    error_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
}

impl DashboardError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::RefreshFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Seconds a client should wait before retrying, when the error carries one.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            Self::TooManyRequests {
                retry_after_seconds,
                ..
            } => Some(*retry_after_seconds),
            _ => None,
        }
    }

    /// Returns a message that is safe to send to clients.
    ///
    /// Client errors (4xx) and refresh failures carry their message. Other
    /// server errors are replaced by a generic message; the details are only
    /// logged server-side (CWE-209).
    fn safe_message(&self) -> String {
        match self {
            Self::BadRequest(_)
            | Self::Unauthorized(_)
            | Self::Conflict(_)
            | Self::TooManyRequests { .. }
            | Self::RefreshFailed(_) => self.to_string(),

            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();
        let retry_after = self.retry_after_seconds();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request rejected"
            );
        }

        let body = Json(ErrorResponse {
            success: false,
            error: self.safe_message(),
            error_id,
            retry_after_seconds: retry_after,
        });

        let mut response = (status, body).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

/// Result type alias for dashboard handlers and services
pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            DashboardError::BadRequest(format!("JSON error: {}", err))
        } else {
            DashboardError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Internal(format!("I/O error: {}", err))
    }
}

impl From<AuthError> for DashboardError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Credential(_) | AuthError::Store(_) => {
                DashboardError::Internal(err.to_string())
            }
            _ => DashboardError::Unauthorized(err.to_string()),
        }
    }
}

impl From<RefreshRejection> for DashboardError {
    fn from(err: RefreshRejection) -> Self {
        match err {
            RefreshRejection::AlreadyInFlight => DashboardError::Conflict(err.to_string()),
            RefreshRejection::Cooldown { remaining_secs } => DashboardError::TooManyRequests {
                message: err.to_string(),
                retry_after_seconds: remaining_secs,
            },
        }
    }
}

impl From<IngestError> for DashboardError {
    fn from(err: IngestError) -> Self {
        DashboardError::RefreshFailed(err.to_string())
    }
}

impl From<RefreshError> for DashboardError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Rejected(rejection) => rejection.into(),
            RefreshError::Failed(ingest) => ingest.into(),
            RefreshError::Interrupted(_) => DashboardError::Internal(err.to_string()),
        }
    }
}
