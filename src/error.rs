//! Unified error types for the photo triage application.

use std::fmt;

/// Application-specific errors.
#[derive(Debug)]
pub enum AppError {
    /// Error loading or decoding an image file
    ImageLoad(String),
    /// Error scanning the library directory for image files
    LibraryScan(String),
    /// Library access was refused by the provider
    /// Error reading XMP metadata
    XmpRead(String),
    /// Error writing XMP metadata
    XmpWrite(String),
    /// Error moving a file to the trash
    Trash(String),
    /// Error reading or parsing settings
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ImageLoad(msg) => write!(f, "Image load error: {}", msg),
            AppError::LibraryScan(msg) => write!(f, "Library scan error: {}", msg),
            AppError::XmpRead(msg) => write!(f, "XMP read error: {}", msg),
            AppError::XmpWrite(msg) => write!(f, "XMP write error: {}", msg),
            AppError::Trash(msg) => write!(f, "Trash error: {}", msg),
            AppError::Config(msg) => write!(f, "Settings error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::ImageLoad(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::LibraryScan(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Type alias for Results in this application.
pub type Result<T> = std::result::Result<T, AppError>;
