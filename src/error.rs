//! Error types and HTTP mapping for the house search backend

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the house search backend
#[derive(Error, Debug)]
pub enum HouseSearchError {
    /// Missing or malformed input from the caller
    #[error("Invalid input: {message}")]
    InvalidArgument { message: String },

    /// Request body exceeds the configured limit
    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    /// The requested resource does not exist upstream (e.g. no route)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// An upstream dependency failed or returned something unusable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl HouseSearchError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new payload too large error
    pub fn payload_too_large<S: Into<String>>(message: S) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new upstream failure error
    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            HouseSearchError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            HouseSearchError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HouseSearchError::NotFound { .. } => StatusCode::NOT_FOUND,
            HouseSearchError::ServiceUnavailable { .. } | HouseSearchError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message
    ///
    /// Upstream details stay in the logs; callers only see a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            HouseSearchError::InvalidArgument { message } => message.clone(),
            HouseSearchError::PayloadTooLarge { message } => message.clone(),
            HouseSearchError::NotFound { message } => message.clone(),
            HouseSearchError::ServiceUnavailable { .. } => {
                "Upstream service failed. Please try again later.".to_string()
            }
            HouseSearchError::Config { .. } => {
                "Server misconfigured. Please check the configuration file.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for HouseSearchError {
    fn from(err: reqwest::Error) -> Self {
        HouseSearchError::service_unavailable(format!("Upstream request failed: {err}"))
    }
}

impl From<JsonRejection> for HouseSearchError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HouseSearchError::payload_too_large(rejection.body_text())
        } else {
            HouseSearchError::invalid_argument(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for HouseSearchError {
    fn from(rejection: QueryRejection) -> Self {
        HouseSearchError::invalid_argument(rejection.body_text())
    }
}

impl IntoResponse for HouseSearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }

        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}
