//! Project Skeleton
//!
//! On-disk layout of one packaged application:
//!
//! ```text
//! <root>/
//!   app/             application assets and manifest.json
//!   log/             per-build logs
//!   pkg/             exported packages
//!   prj/<platform>/  generated platform project
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CrosspackError, Result};

/// Paths of a generated project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSkeleton {
    root: PathBuf,
    package_id: String,
}

impl ProjectSkeleton {
    pub fn new(root: impl Into<PathBuf>, package_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            package_id: package_id.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn app_path(&self) -> PathBuf {
        self.root.join("app")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.app_path().join("manifest.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("log")
    }

    pub fn pkg_path(&self) -> PathBuf {
        self.root.join("pkg")
    }

    pub fn prj_path(&self) -> PathBuf {
        self.root.join("prj")
    }

    /// Platform project directory
    pub fn platform_path(&self, platform_id: &str) -> PathBuf {
        self.prj_path().join(platform_id)
    }

    /// Create the shared directories; platform directories are left to
    /// the backend
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [self.app_path(), self.log_path(), self.pkg_path(), self.prj_path()] {
            debug!("Creating {:?}", dir);
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Move a produced package into `pkg/`, replacing an older one
    pub fn export_package(&self, package: &Path) -> Result<PathBuf> {
        if !package.is_file() {
            return Err(CrosspackError::NotFound(format!(
                "Package could not be found {}",
                package.display()
            )));
        }
        let pkg_dir = self.pkg_path();
        if !pkg_dir.is_dir() {
            return Err(CrosspackError::NotFound(format!(
                "Package directory could not be found {}",
                pkg_dir.display()
            )));
        }

        let name = package
            .file_name()
            .ok_or_else(|| CrosspackError::Project(format!("Invalid package path {}", package.display())))?;
        let target = pkg_dir.join(name);
        if std::fs::rename(package, &target).is_err() {
            // Different filesystems
            std::fs::copy(package, &target)?;
            std::fs::remove_file(package)?;
        }
        Ok(target)
    }
}
