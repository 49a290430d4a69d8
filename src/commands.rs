//! CLI commands for Crosspack
//!
//! Each command is a plain struct with an `execute` method, so scripts and
//! tests can drive them without going through argument parsing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use crosspack_android_toolchain::AndroidSdk;
use crosspack_core::{
    AppConfig, BackendContext, BuildRequest, CreateRequest, Output, PlatformBackend, PlatformRegistry,
};
use tracing::info;

use crate::project::{Project, ProjectManager};

/// Everything a command needs, resolved once by the entry point
pub struct Session {
    pub config: AppConfig,
    pub output: Arc<dyn Output>,
    pub registry: PlatformRegistry,
}

impl Session {
    pub fn new(config: AppConfig, output: Arc<dyn Output>, registry: PlatformRegistry) -> Self {
        Self {
            config,
            output,
            registry,
        }
    }

    fn backend(&self, project: &Project, platform: &str) -> Result<Box<dyn PlatformBackend>> {
        let context = BackendContext {
            skeleton: project.skeleton.clone(),
            config: self.config.clone(),
            output: self.output.clone(),
        };
        self.registry
            .instantiate(platform, context)
            .map_err(|e| anyhow::anyhow!(e.user_message()))
    }

    fn check_platforms(&self, platforms: &[String]) -> Result<()> {
        for platform in platforms {
            if !self.registry.contains(platform) {
                bail!(
                    "Unknown platform '{}', available: {}",
                    platform,
                    self.registry.platform_ids().join(", ")
                );
            }
        }
        Ok(())
    }
}

/// Load the project at `dir` or the closest one above it
async fn load_project(dir: &Path) -> Result<Project> {
    let manager = ProjectManager::new();
    let root = manager
        .find_root(dir)
        .with_context(|| format!("No project found at {}", dir.display()))?;
    manager.load(&root).await
}

/// Create command options
pub struct CreateCommand {
    pub parent_dir: PathBuf,
    pub package_id: String,
    pub platforms: Vec<String>,
    pub request: CreateRequest,
}

impl CreateCommand {
    /// Create the project and generate every platform project in it
    pub async fn execute(&self, session: &Session) -> Result<PathBuf> {
        session.check_platforms(&self.platforms)?;

        let project = ProjectManager::new()
            .create(&self.parent_dir, &self.package_id, &self.platforms)
            .await?;

        for platform in &self.platforms {
            info!("Generating {} project", platform);
            let mut backend = session.backend(&project, platform)?;
            backend
                .generate(&self.request)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Generating {} project failed", platform))?;
        }

        Ok(project.skeleton.root().to_path_buf())
    }
}

/// Update command options
pub struct UpdateCommand {
    pub project_dir: PathBuf,
    pub version_spec: Option<String>,
}

impl UpdateCommand {
    /// Re-import the runtime into every platform project
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let project = load_project(&self.project_dir).await?;
        for platform in project.manifest.target_platforms() {
            let mut backend = session.backend(&project, platform)?;
            backend
                .update(self.version_spec.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Updating {} project failed", platform))?;
        }
        Ok(())
    }
}

/// Build command options
pub struct BuildCommand {
    pub project_dir: PathBuf,
    pub request: BuildRequest,
}

impl BuildCommand {
    /// Build every target platform, returning the exported packages
    pub async fn execute(&self, session: &Session) -> Result<Vec<PathBuf>> {
        let project = load_project(&self.project_dir).await?;
        let platforms = project.manifest.target_platforms();
        if platforms.is_empty() {
            bail!("No target platforms in {}", project.skeleton.manifest_path().display());
        }

        let mut packages = Vec::new();
        for platform in platforms {
            info!("Building {} packages", platform);
            let mut backend = session.backend(&project, platform)?;
            let built = backend
                .build(&self.request)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Building {} failed", platform))?;
            packages.extend(built);
        }
        Ok(packages)
    }
}

/// Environment check results
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub android: Option<PathBuf>,
    pub ant: Option<PathBuf>,
    pub platforms: Vec<&'static str>,
}

impl CheckReport {
    pub fn is_complete(&self) -> bool {
        self.android.is_some() && self.ant.is_some()
    }
}

/// Check command
pub struct CheckCommand;

impl CheckCommand {
    /// Report the SDK tools found on the search path
    pub fn execute(&self, session: &Session) -> CheckReport {
        let report = CheckReport {
            android: AndroidSdk::find_android(),
            ant: AndroidSdk::find_ant(),
            platforms: session.registry.platform_ids(),
        };

        let output = session.output.as_ref();
        for (name, path) in [("android", &report.android), ("ant", &report.ant)] {
            match path {
                Some(path) => output.info(&format!("Checking for '{}'... {}", name, path.display())),
                None => output.error(&format!("Checking for '{}'... not found", name)),
            }
        }
        output.info(&format!("Platforms: {}", report.platforms.join(", ")));
        report
    }
}
