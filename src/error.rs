// src/error.rs

//! Error types for the stevedore package manager.
//!
//! One crate-wide error enum. Install-pipeline failures abort the operation
//! with no visible partial state at the install path; supervision failures
//! are reported through `JobResult` instead of this type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for stevedore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during package management operations
#[derive(Error, Debug)]
pub enum Error {
    /// Package coordinate string did not have the expected shape
    #[error("invalid package coordinate '{0}': expected group:artifact:version")]
    CoordinateError(String),

    /// A required file or directory was missing
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Configuration was incomplete or unreadable
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Download failed at the transport level
    #[error("download error: {0}")]
    DownloadError(String),

    /// Archive could not be unpacked
    #[error("extraction error: {0}")]
    ExtractionError(String),

    /// Moving the unpacked tree into its final location failed
    #[error("placement error: {0}")]
    PlacementError(String),

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
