//! Android SDK Runner
//!
//! Wraps the legacy SDK executables: `android` to query API targets and
//! create project skeletons, `ant` to build them.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use crosspack_core::Output;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::targets::AndroidTargets;

/// Lowest API level the generated projects target
pub const MIN_API_LEVEL: u32 = 21;

/// JVM chatter on stderr that is not an error
const IGNORED_STDERR_PREFIXES: &[&str] = &["Picked up _JAVA_OPTIONS", "Picked up JAVA_TOOL_OPTIONS"];

/// SDK errors
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("Executable '{0}' not found in path")]
    ExecutableNotFound(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Command failed: {0}")]
    CommandFailed(String),
    #[error("No SDK API targets found")]
    NoTargets,
    #[error("No SDK API target with level {0} or higher installed")]
    NoSuitableTarget(u32),
}

/// Drop empty lines and known JVM notices from tool stderr
pub fn filter_error_log(buffer: &str) -> String {
    let mut filtered = String::new();
    for line in buffer.split('\n').map(str::trim) {
        if line.is_empty() || IGNORED_STDERR_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }
        filtered.push_str(line);
        filtered.push('\n');
    }
    filtered
}

/// Task name from an ant output line such as `     [javac] Compiling`.
/// The `[` must appear within the first 7 characters, after spaces only,
/// and the `]` within 15 characters after it.
pub fn scrape_tag(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate().take(7) {
        match b {
            b'[' => {
                let end = (i + 15).min(bytes.len());
                return bytes[i + 1..end]
                    .iter()
                    .position(|&c| c == b']')
                    .map(|offset| &line[i + 1..i + 1 + offset]);
            }
            b' ' => continue,
            _ => return None,
        }
    }
    None
}

/// Source directory of a Java package inside a project
pub fn java_package_dir(project: &Path, package_id: &str) -> PathBuf {
    package_id
        .split('.')
        .fold(project.join("src"), |dir, part| dir.join(part))
}

/// Feed every line of `reader` to `on_line` without its line ending.
/// Tool output is not always UTF-8, invalid bytes are replaced.
pub async fn forward_lines<R>(
    mut reader: R,
    on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(line.trim_end_matches(|c| c == '\n' || c == '\r'));
    }
}

/// External SDK tooling used by the Android backend
#[async_trait]
pub trait SdkRunner: Send + Sync {
    /// Name of the lowest installed API target at `min_api_level` or above
    async fn query_target(&self, min_api_level: u32) -> Result<String, SdkError>;

    /// Create a project skeleton at `path`, returning the tool's log.
    /// An existing `path` is reused as is.
    async fn generate_project_skeleton(
        &self,
        path: &Path,
        package_id: &str,
        api_target: &str,
    ) -> Result<String, SdkError>;

    /// Run the build in `project`, feeding every stdout line to `on_line`.
    /// Returns whether the tool exited successfully.
    async fn run_build(
        &self,
        project: &Path,
        release: bool,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<bool, SdkError>;
}

/// `android` and `ant` from the search path
pub struct AndroidSdk {
    android: PathBuf,
    output: Arc<dyn Output>,
}

impl AndroidSdk {
    /// Locate the `android` script
    pub fn locate(output: Arc<dyn Output>) -> Result<Self, SdkError> {
        let android = which::which("android").map_err(|_| SdkError::ExecutableNotFound("android"))?;
        debug!("Using android script {:?}", android);
        Ok(Self { android, output })
    }

    /// Path of `android`, if on the search path
    pub fn find_android() -> Option<PathBuf> {
        which::which("android").ok()
    }

    /// Path of `ant`, if on the search path
    pub fn find_ant() -> Option<PathBuf> {
        which::which("ant").ok()
    }
}

#[async_trait]
impl SdkRunner for AndroidSdk {
    async fn query_target(&self, min_api_level: u32) -> Result<String, SdkError> {
        let output = Command::new(&self.android)
            .args(["list", "target"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(SdkError::CommandFailed(filter_error_log(&String::from_utf8_lossy(
                &output.stderr,
            ))));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let targets = AndroidTargets::parse(&listing, false);
        if targets.is_empty() {
            return Err(SdkError::NoTargets);
        }

        targets
            .pick_lowest(min_api_level)
            .map(|t| t.name.clone())
            .ok_or(SdkError::NoSuitableTarget(min_api_level))
    }

    async fn generate_project_skeleton(
        &self,
        path: &Path,
        package_id: &str,
        api_target: &str,
    ) -> Result<String, SdkError> {
        // Valid when building 32 and 64 bit ABIs in one go
        if path.exists() {
            self.output
                .warning(&format!("Project dir '{}' already exists", path.display()));
            return Ok(String::new());
        }

        let mut indicator = self
            .output
            .create_infinite_progress(&format!("Creating {}", package_id));
        indicator.update("...");

        info!("android create project -t {} -p {:?} -k {}", api_target, path, package_id);
        let result = Command::new(&self.android)
            .args(["create", "project", "-t", api_target, "-p"])
            .arg(path)
            .args(["-k", package_id, "-a", "MainActivity"])
            .output()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                indicator.done(Some("error"));
                return Err(e.into());
            }
        };

        let errors = filter_error_log(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            indicator.done(Some("error"));
            return Err(SdkError::CommandFailed(errors));
        }
        indicator.done(None);

        // Replaced by the runtime's activity later on
        let stub = java_package_dir(path, package_id).join("MainActivity.java");
        if stub.is_file() {
            tokio::fs::remove_file(&stub).await?;
        } else {
            self.output
                .warning(&format!("File not found: {}", stub.display()));
        }

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&errors);
        Ok(log)
    }

    async fn run_build(
        &self,
        project: &Path,
        release: bool,
        on_line: &mut (dyn for<'l> FnMut(&'l str) + Send),
    ) -> Result<bool, SdkError> {
        let ant = Self::find_ant().ok_or(SdkError::ExecutableNotFound("ant"))?;
        let target = if release { "release" } else { "debug" };
        debug!("Running: ant {} in {:?}", target, project);

        let mut child = Command::new(ant)
            .arg(target)
            .current_dir(project)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Collect stderr concurrently so the pipe never fills up
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut collected = String::new();
                let mut collect = |line: &str| {
                    collected.push_str(line);
                    collected.push('\n');
                };
                if let Err(e) = forward_lines(BufReader::new(stderr), &mut collect).await {
                    debug!("Reading ant stderr failed: {}", e);
                }
                collected
            })
        });

        let read = match child.stdout.take() {
            Some(stdout) => forward_lines(BufReader::new(stdout), on_line).await,
            None => Ok(()),
        };

        // Reap the child even when reading its output failed
        let status = child.wait().await?;
        read?;

        if let Some(task) = stderr_task {
            let collected = task.await.unwrap_or_default();
            let errors = filter_error_log(&collected);
            if !errors.is_empty() {
                warn!("ant stderr: {}", errors.trim_end());
                self.output.warning(errors.trim_end());
            }
        }

        Ok(status.success())
    }
}
