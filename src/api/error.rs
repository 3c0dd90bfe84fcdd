// SPDX-License-Identifier: MPL-2.0

//! REST layer errors

use std::fmt;

/// Errors returned by [`super::ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, request not sent)
    Network(String),
    /// The server answered with a non-success status
    Status {
        status: u16,
        message: Option<String>,
    },
    /// The response body could not be decoded
    Decode(String),
    /// The endpoint needs a session and none was attached
    Unauthorized,
    /// A stored token could not be read as a JWT
    InvalidSession(String),
    /// The configured base URL is not usable
    InvalidUrl(String),
}

impl ApiError {
    /// Classify a reqwest failure
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ApiError::Network(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ApiError::Decode(err.to_string())
        } else if err.is_builder() {
            ApiError::InvalidUrl(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Status {
                status,
                message: Some(message),
            } => write!(f, "HTTP {}: {}", status, message),
            ApiError::Status {
                status,
                message: None,
            } => write!(f, "HTTP {}", status),
            ApiError::Decode(msg) => write!(f, "Invalid response: {}", msg),
            ApiError::Unauthorized => write!(f, "Not logged in"),
            ApiError::InvalidSession(msg) => write!(f, "Invalid session token: {}", msg),
            ApiError::InvalidUrl(msg) => write!(f, "Invalid API URL: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
