//! Error types for Crosspack
//!
//! Centralized error handling using thiserror. Component crates keep their
//! own error enums; this type is what crosses crate boundaries.

use thiserror::Error;

/// Main error type for Crosspack
#[derive(Error, Debug)]
pub enum CrosspackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Android SDK error: {0}")]
    AndroidSdk(String),

    #[error("Build error: {0}")]
    Build(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Version not available: {0}")]
    VersionNotAvailable(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Crosspack operations
pub type Result<T> = std::result::Result<T, CrosspackError>;

impl CrosspackError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CrosspackError::Io(e) => format!("File operation failed: {}", e),
            CrosspackError::Config(msg) => format!("Configuration error: {}", msg),
            CrosspackError::AndroidSdk(msg) => format!("Android SDK issue: {}", msg),
            CrosspackError::Build(msg) => format!("Build failed: {}", msg),
            CrosspackError::Network(msg) => {
                format!("Network error: {}. Please check your connection.", msg)
            }
            CrosspackError::Download(msg) => format!("Download failed: {}", msg),
            CrosspackError::VersionNotAvailable(msg) => msg.clone(),
            CrosspackError::NotFound(msg) => format!("Not found: {}", msg),
            _ => self.to_string(),
        }
    }
}
