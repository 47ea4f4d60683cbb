// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::api::Envelope;
use crate::database::DataSourceError;
use crate::middleware::EnvelopeBypass;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Envelope body: `{ code, message, time }`
    pub fn to_envelope(&self) -> Envelope {
        Envelope::error(self.status_code(), self.message())
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DataSourceError> for ApiError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::UnknownResource(name) => {
                ApiError::not_found(format!("Resource '{}' not found", name))
            }
            DataSourceError::NotACollection(name) => {
                ApiError::bad_request(format!("Resource '{}' does not hold records", name))
            }
            DataSourceError::DuplicateId { id, .. } => {
                ApiError::conflict(format!("Record '{}' already exists", id))
            }
            DataSourceError::InvalidDocument(msg) => ApiError::bad_request(msg),
            DataSourceError::Poisoned => {
                tracing::error!("Data source lock poisoned");
                ApiError::service_unavailable("Data source temporarily unavailable")
            }
            DataSourceError::Io(e) => {
                // Don't expose filesystem details to clients
                tracing::error!("Data source I/O error: {}", e);
                ApiError::internal_server_error("Internal Server Error")
            }
            DataSourceError::Json(e) => {
                tracing::error!("Data source JSON error: {}", e);
                ApiError::internal_server_error("Internal Server Error")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Error envelopes are final; the response middleware leaves them alone
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code(), Json(self.to_envelope())).into_response();
        response.extensions_mut().insert(EnvelopeBypass);
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
