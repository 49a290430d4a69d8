//! Application Manifest
//!
//! `manifest.json` in the application directory. Only the packaging
//! fields are interpreted; everything else is carried along untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::ManifestError;

const APP_VERSION_KEY: &str = "crosswalk_app_version";
const TARGET_PLATFORMS_KEY: &str = "crosswalk_target_platforms";
const PACKAGE_ID_KEY: &str = "crosswalk_package_id";

/// Validate an application version `[major.][minor.]micro`.
/// Major and minor must be below 100, micro below 1000.
pub fn validate_app_version(version: &str) -> Result<(), ManifestError> {
    let invalid = || ManifestError::InvalidAppVersion(version.to_string());

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid());
    }

    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        let limit = if i == last { 1000 } else { 100 };
        // Overflow means far above the limit
        let value: u64 = part.parse().unwrap_or(u64::MAX);
        if value >= limit {
            return Err(ManifestError::AppVersionPart {
                part: part.to_string(),
                limit,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawManifest {
    #[serde(default)]
    crosswalk_app_version: Option<Value>,
    #[serde(default)]
    crosswalk_target_platforms: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crosswalk_package_id: Option<String>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Validated application manifest
#[derive(Debug, Clone, PartialEq)]
pub struct AppManifest {
    app_version: String,
    target_platforms: String,
    package_id: Option<String>,
    other: Map<String, Value>,
}

impl AppManifest {
    /// Default manifest for a new project
    pub fn new(target_platforms: impl Into<String>) -> Self {
        Self {
            app_version: "1".to_string(),
            target_platforms: target_platforms.into(),
            package_id: None,
            other: Map::new(),
        }
    }

    /// Parse and validate manifest text
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(text)?;

        let app_version = match raw.crosswalk_app_version {
            Some(Value::String(version)) => {
                validate_app_version(&version)?;
                version
            }
            other => {
                return Err(ManifestError::InvalidAppVersion(
                    other.map(|v| v.to_string()).unwrap_or_default(),
                ))
            }
        };

        let target_platforms = match raw.crosswalk_target_platforms {
            Some(Value::String(platforms)) if !platforms.trim().is_empty() => platforms,
            _ => return Err(ManifestError::MissingField(TARGET_PLATFORMS_KEY)),
        };

        Ok(Self {
            app_version,
            target_platforms,
            package_id: raw.crosswalk_package_id,
            other: raw.other,
        })
    }

    /// Load from a file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        debug!("Loading manifest {:?}", path);
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    /// Write to a file as pretty JSON
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let raw = RawManifest {
            crosswalk_app_version: Some(Value::String(self.app_version.clone())),
            crosswalk_target_platforms: Some(Value::String(self.target_platforms.clone())),
            crosswalk_package_id: self.package_id.clone(),
            other: self.other.clone(),
        };
        let text = serde_json::to_string_pretty(&raw)?;
        tokio::fs::write(path.as_ref(), text).await?;
        Ok(())
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Platform ids, whitespace separated in the file
    pub fn target_platforms(&self) -> Vec<&str> {
        self.target_platforms.split_whitespace().collect()
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package_id.as_deref()
    }

    /// Untyped field, e.g. "name"
    pub fn field(&self, key: &str) -> Option<&Value> {
        match key {
            APP_VERSION_KEY | TARGET_PLATFORMS_KEY | PACKAGE_ID_KEY => None,
            _ => self.other.get(key),
        }
    }

    pub fn set_app_version(&mut self, version: impl Into<String>) -> Result<(), ManifestError> {
        let version = version.into();
        validate_app_version(&version)?;
        self.app_version = version;
        Ok(())
    }

    pub fn set_package_id(&mut self, package_id: impl Into<String>) {
        self.package_id = Some(package_id.into());
    }
}
