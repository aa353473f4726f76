// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application

use crate::backends::camera::BackendError;
use crate::backends::library::LibraryError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera backend errors
    Camera(BackendError),
    /// Photo capture / save errors
    Photo(PhotoError),
    /// Photo library errors
    Library(LibraryError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Photo processing and save errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// Encoding failed
    EncodingFailed(String),
    /// Writing the scratch file failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Library(e) => write!(f, "Library error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for PhotoError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        AppError::Library(err)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_becomes_camera_error() {
        let err: AppError = BackendError::SessionNotRunning.into();
        assert!(matches!(err, AppError::Camera(BackendError::SessionNotRunning)));
        assert_eq!(err.to_string(), "Camera error: Capture session is not running");
    }

    #[test]
    fn test_io_error_becomes_storage_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert_eq!(err.to_string(), "Storage error: gone");
    }

    #[test]
    fn test_scratch_io_error_becomes_save_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PhotoError = io.into();
        assert_eq!(err, PhotoError::SaveFailed("read-only".to_string()));
    }
}
