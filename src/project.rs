//! Application projects
//!
//! Creates and loads the directory an application is packaged from:
//! `app/` with the web app and its manifest.json, plus the shared
//! `log/`, `pkg/` and `prj/` directories.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crosspack_core::ProjectSkeleton;
use crosspack_manifest_manager::AppManifest;
use tracing::info;

const SAMPLE_INDEX: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Hello</title>
  </head>
  <body>
    <p>Hello world</p>
  </body>
</html>
"#;

/// Check a package id like `com.example.foo`: at least two dot separated
/// parts, each starting with a lower case letter followed by lower case
/// letters, digits or underscores
pub fn validate_package_id(package_id: &str) -> Result<()> {
    let parts: Vec<&str> = package_id.split('.').collect();
    let valid_part = |part: &&str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    };
    if parts.len() < 2 || !parts.iter().all(valid_part) {
        bail!(
            "Invalid package ID '{}', must be of the form com.example.foo",
            package_id
        );
    }
    Ok(())
}

/// A loaded application project
#[derive(Debug, Clone)]
pub struct Project {
    pub skeleton: ProjectSkeleton,
    pub manifest: AppManifest,
}

/// Project creation and lookup
#[derive(Debug, Default)]
pub struct ProjectManager;

impl ProjectManager {
    pub fn new() -> Self {
        Self
    }

    /// Create `<parent_dir>/<package_id>` with a sample app
    pub async fn create(
        &self,
        parent_dir: &Path,
        package_id: &str,
        platforms: &[String],
    ) -> Result<Project> {
        validate_package_id(package_id)?;

        let root = parent_dir.join(package_id);
        if root.exists() {
            bail!("Directory already exists: {}", root.display());
        }

        let skeleton = ProjectSkeleton::new(&root, package_id);
        skeleton
            .create_dirs()
            .with_context(|| format!("Failed to create project at {}", root.display()))?;

        let mut manifest = AppManifest::new(platforms.join(" "));
        manifest.set_package_id(package_id);
        manifest.save(skeleton.manifest_path()).await?;
        tokio::fs::write(skeleton.app_path().join("index.html"), SAMPLE_INDEX).await?;

        info!("Created project {:?}", root);
        Ok(Project { skeleton, manifest })
    }

    /// Load the project rooted at `dir`
    pub async fn load(&self, dir: &Path) -> Result<Project> {
        if !self.is_project(dir) {
            bail!("Not a project directory: {}", dir.display());
        }
        let root = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", dir.display()))?;

        let manifest_path = root.join("app").join("manifest.json");
        let manifest = AppManifest::load(&manifest_path)
            .await
            .with_context(|| format!("Failed to load {}", manifest_path.display()))?;

        let package_id = match manifest.package_id() {
            Some(id) => id.to_string(),
            None => root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        validate_package_id(&package_id)?;

        Ok(Project {
            skeleton: ProjectSkeleton::new(root, package_id),
            manifest,
        })
    }

    /// Whether `dir` looks like a project root
    pub fn is_project(&self, dir: &Path) -> bool {
        dir.join("app").join("manifest.json").is_file() && dir.join("prj").is_dir()
    }

    /// Walk up from `start` to the closest project root
    pub fn find_root(&self, start: &Path) -> Option<PathBuf> {
        start.ancestors().find(|dir| self.is_project(dir)).map(Path::to_path_buf)
    }
}
