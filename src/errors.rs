// SPDX-License-Identifier: MPL-2.0

//! Error types for the check-in scanner

use crate::api::ApiError;
use crate::backends::camera::BackendError;
use crate::constants::messages;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Errors from loading or saving local settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Errors surfaced to the operator by the check-in flow
///
/// None of these are fatal to the process; the operator can always
/// restart the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The platform denied access to the camera
    PermissionDenied(String),
    /// No camera devices are available
    NoCameraFound,
    /// A code was decoded but its content is not a valid ticket
    MalformedPayload(String),
    /// The server answered and rejected the request with a message
    ServerRejected {
        status: Option<u16>,
        message: String,
    },
    /// The server answered with an error status and no usable message
    ServerError { status: u16 },
    /// No response was received from the server
    NetworkUnreachable,
    /// Start was requested without an event or camera selected
    MissingSelection,
    /// Anything else, carrying the raw error text
    Unknown(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::PermissionDenied(msg) => {
                write!(f, "Unable to access camera: {}", msg)
            }
            ScanError::NoCameraFound => write!(f, "{}", messages::NO_CAMERA_FOUND),
            ScanError::MalformedPayload(msg) => write!(f, "Invalid barcode format: {}", msg),
            ScanError::ServerRejected { message, .. } => write!(f, "{}", message),
            ScanError::ServerError { status } => write!(f, "Server error: {}", status),
            ScanError::NetworkUnreachable => write!(f, "{}", messages::NETWORK_UNREACHABLE),
            ScanError::MissingSelection => write!(f, "{}", messages::MISSING_SELECTION),
            ScanError::Unknown(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ScanError {}

impl From<BackendError> for ScanError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(msg) => ScanError::PermissionDenied(msg),
            BackendError::NoCameraFound | BackendError::DeviceNotFound(_) => {
                ScanError::NoCameraFound
            }
            other => ScanError::Unknown(other.to_string()),
        }
    }
}

impl From<ApiError> for ScanError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(_) => ScanError::NetworkUnreachable,
            ApiError::Status {
                status,
                message: Some(message),
            } => ScanError::ServerRejected {
                status: Some(status),
                message,
            },
            ApiError::Status { status, .. } => ScanError::ServerError { status },
            other => ScanError::Unknown(other.to_string()),
        }
    }
}
