//! ABI Build Loop
//!
//! Builds one package per ABI from a single project. Before each build
//! only the current ABI's native libraries are enabled; the build output is
//! renamed to carry the ABI so the next round does not overwrite it.
//!
//! Every exit path, success or failure, leaves all ABIs enabled again so
//! the project keeps working with plain `ant` or an IDE.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use crosspack_core::Output;
use tracing::{debug, error, info};

use crate::apk::{self, PackageError};
use crate::toggle::{NativeLibs, ToggleError};

/// Error type of [`BuildTool`] implementations
pub type ToolError = Box<dyn std::error::Error + Send + Sync>;

/// The external build tool driven by the loop
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Called with the ABI about to be built, after toggling
    async fn prepare_abi(&self, _project: &Path, _abi: &str) -> Result<(), ToolError> {
        Ok(())
    }

    /// Build `project`, feeding each output line to `on_line`.
    /// Returns whether the build succeeded.
    async fn build(
        &self,
        project: &Path,
        release: bool,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<bool, ToolError>;

    /// Short progress label for an output line, if it carries one
    fn progress_tag<'a>(&self, _line: &'a str) -> Option<&'a str> {
        None
    }
}

/// Loop errors
#[derive(Debug, thiserror::Error)]
pub enum BuildLoopError {
    #[error("Enabling ABI '{abi}' failed: {source}")]
    Enable {
        abi: String,
        #[source]
        source: ToggleError,
    },
    #[error("Building ABI '{abi}' failed: {reason}")]
    Build { abi: String, reason: String },
    #[error("Building ABI '{abi}' failed: {source}")]
    Package {
        abi: String,
        #[source]
        source: PackageError,
    },
    #[error("Failed to restore all ABIs: {0}")]
    Restore(#[source] ToggleError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildLoopError {
    /// ABI the loop stopped at
    pub fn abi(&self) -> Option<&str> {
        match self {
            BuildLoopError::Enable { abi, .. }
            | BuildLoopError::Build { abi, .. }
            | BuildLoopError::Package { abi, .. } => Some(abi),
            _ => None,
        }
    }
}

/// Where the loop stands
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoopState {
    /// Next ABI to build
    Building(usize),
    Done,
}

/// Sequential per-ABI build of one project
pub struct AbiBuildLoop {
    project: PathBuf,
    libs: NativeLibs,
    log_dir: PathBuf,
    app_version: String,
    release: bool,
    output: Arc<dyn Output>,
}

impl AbiBuildLoop {
    pub fn new(
        project: impl Into<PathBuf>,
        libs: NativeLibs,
        log_dir: impl Into<PathBuf>,
        app_version: impl Into<String>,
        release: bool,
        output: Arc<dyn Output>,
    ) -> Self {
        Self {
            project: project.into(),
            libs,
            log_dir: log_dir.into(),
            app_version: app_version.into(),
            release,
            output,
        }
    }

    fn bin_dir(&self) -> PathBuf {
        self.project.join("bin")
    }

    /// Build every ABI in order, returning the renamed packages in `bin/`.
    /// Stops at the first failure.
    pub async fn run(&self, abis: &[String], tool: &dyn BuildTool) -> Result<Vec<PathBuf>, BuildLoopError> {
        let mut packages = Vec::with_capacity(abis.len());
        let result = self.drive(abis, tool, &mut packages).await;

        let restored = self.libs.enable_all();
        match (result, restored) {
            (Err(e), _) => {
                error!("{}", e);
                Err(e)
            }
            (Ok(()), Err(e)) => Err(BuildLoopError::Restore(e)),
            (Ok(()), Ok(())) => Ok(packages),
        }
    }

    async fn drive(
        &self,
        abis: &[String],
        tool: &dyn BuildTool,
        packages: &mut Vec<PathBuf>,
    ) -> Result<(), BuildLoopError> {
        let mut state = LoopState::Building(0);
        while let LoopState::Building(index) = state {
            let Some(abi) = abis.get(index) else {
                state = LoopState::Done;
                continue;
            };
            packages.push(self.build_abi(abi, tool).await?);
            state = LoopState::Building(index + 1);
        }
        debug!("Built {} ABIs", packages.len());
        Ok(())
    }

    async fn build_abi(&self, abi: &str, tool: &dyn BuildTool) -> Result<PathBuf, BuildLoopError> {
        self.libs
            .enable(Some(abi))
            .map_err(|source| BuildLoopError::Enable {
                abi: abi.to_string(),
                source,
            })?;

        let build_failed = |reason: String| BuildLoopError::Build {
            abi: abi.to_string(),
            reason,
        };

        tool.prepare_abi(&self.project, abi)
            .await
            .map_err(|e| build_failed(e.to_string()))?;

        info!("Building {} ({})", abi, if self.release { "release" } else { "debug" });
        let mut indicator = self.output.create_infinite_progress(&format!("Building {}", abi));
        let mut log = String::new();
        let status = {
            let mut on_line = |line: &str| {
                log.push_str(line);
                log.push('\n');
                if let Some(tag) = tool.progress_tag(line) {
                    indicator.update(tag);
                }
            };
            tool.build(&self.project, self.release, &mut on_line).await
        };

        tokio::fs::create_dir_all(&self.log_dir).await?;
        tokio::fs::write(self.log_dir.join(format!("build-{}.log", abi)), &log).await?;

        match status {
            Ok(true) => indicator.done(None),
            Ok(false) => {
                indicator.done(Some("error"));
                return Err(build_failed("build tool reported failure".to_string()));
            }
            Err(e) => {
                indicator.done(Some("error"));
                return Err(build_failed(e.to_string()));
            }
        }

        let bin = self.bin_dir();
        let package = apk::abify_apk_name(&bin, &self.app_version, abi, self.release).map_err(|source| {
            BuildLoopError::Package {
                abi: abi.to_string(),
                source,
            }
        })?;
        apk::remove_unaligned(&bin).map_err(|source| BuildLoopError::Package {
            abi: abi.to_string(),
            source,
        })?;

        Ok(package)
    }
}
