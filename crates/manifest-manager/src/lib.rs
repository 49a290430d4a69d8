//! Manifest Manager
//!
//! Reading and editing of the files that describe an application and its
//! generated Android project: the app's `manifest.json`, the project's
//! AndroidManifest.xml and project.properties.

pub mod android_manifest;
pub mod app_manifest;
pub mod project_properties;

pub use android_manifest::{root_attribute, set_root_attributes, AndroidManifestFile};
pub use app_manifest::{validate_app_version, AppManifest};
pub use project_properties::{read_property, write_property, ProjectProperties, LIBRARY_PROJECTS};

/// Manifest errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid manifest structure: {0}")]
    InvalidStructure(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Invalid app version '{0}', must be [major.][minor.]micro with numbers only")]
    InvalidAppVersion(String),
    #[error("App version part '{part}' must be below {limit}")]
    AppVersionPart { part: String, limit: u64 },
    #[error("Missing manifest field '{0}'")]
    MissingField(&'static str),
    #[error("Invalid value '{value}' for '{key}'")]
    InvalidProperty { key: &'static str, value: String },
}
