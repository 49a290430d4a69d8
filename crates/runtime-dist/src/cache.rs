//! Artifact Cache
//!
//! Finds previously downloaded archives and downloads missing ones.
//! Downloads land in a temporary file next to their final location and
//! are renamed into place only after the transfer completed, so a
//! partial archive is never visible under its real name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crosspack_core::{Channel, Output};
use reqwest::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::downloader::{DownloadError, Downloader};
use crate::release::ReleaseSource;
use crate::version::Version;

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File already exists {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Download already started for {0}")]
    AlreadyStarted(String),
    #[error("No download was started for {0}")]
    NotStarted(String),
}

/// First existing `filename` in `search_dirs`, in order
pub fn locate(filename: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.join(filename))
        .find(|path| path.is_file())
}

/// One archive download into a destination directory
pub struct DownloadHandler {
    dest_dir: PathBuf,
    filename: String,
    temp: Option<NamedTempFile>,
}

impl DownloadHandler {
    pub fn new(dest_dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            filename: filename.into(),
            temp: None,
        }
    }

    pub fn final_path(&self) -> PathBuf {
        self.dest_dir.join(&self.filename)
    }

    /// Create the temporary download file. Only one per handler.
    pub fn create_temp_file(&mut self) -> Result<tokio::fs::File, CacheError> {
        if self.temp.is_some() {
            return Err(CacheError::AlreadyStarted(self.filename.clone()));
        }

        let temp = tempfile::Builder::new()
            .prefix(".crosspack-")
            .suffix(".part")
            .tempfile_in(&self.dest_dir)?;
        let file = tokio::fs::File::from_std(temp.as_file().try_clone()?);
        debug!("Downloading to {:?}", temp.path());
        self.temp = Some(temp);
        Ok(file)
    }

    /// Publish the download under its final name and copy it into
    /// `cache_dir` when that directory exists and is not the destination
    pub async fn finish(mut self, cache_dir: Option<&Path>) -> Result<PathBuf, CacheError> {
        let temp = self
            .temp
            .take()
            .ok_or_else(|| CacheError::NotStarted(self.filename.clone()))?;

        let final_path = self.final_path();
        if final_path.exists() {
            return Err(CacheError::AlreadyExists(final_path));
        }
        temp.persist_noclobber(&final_path).map_err(|e| e.error)?;

        if let Some(dir) = cache_dir.filter(|d| d.is_dir()) {
            if same_dir(dir, &self.dest_dir).await {
                debug!("Cache directory {:?} is the destination, not copying", dir);
                return Ok(final_path);
            }
            let cached = dir.join(&self.filename);
            // Best effort, the download itself succeeded
            if let Err(e) = tokio::fs::copy(&final_path, &cached).await {
                warn!("Failed to copy {:?} to cache {:?}: {}", final_path, dir, e);
            }
        }

        Ok(final_path)
    }
}

/// Whether `a` and `b` name the same directory
async fn same_dir(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Lookup and download of runtime archives for one release source
pub struct ArtifactCache {
    client: Client,
    source: ReleaseSource,
    cache_dir: Option<PathBuf>,
    output: Arc<dyn Output>,
}

impl ArtifactCache {
    pub fn new(
        client: Client,
        source: ReleaseSource,
        cache_dir: Option<PathBuf>,
        output: Arc<dyn Output>,
    ) -> Self {
        Self {
            client,
            source,
            cache_dir,
            output,
        }
    }

    pub fn source(&self) -> &ReleaseSource {
        &self.source
    }

    /// Directories checked for an existing archive: the destination, its
    /// parent, then the shared cache directory
    pub fn search_dirs(&self, dest_dir: &Path) -> Vec<PathBuf> {
        let mut dirs = vec![dest_dir.to_path_buf()];
        let parent = dest_dir.join("..");
        dirs.push(parent);
        if let Some(cache_dir) = &self.cache_dir {
            dirs.push(cache_dir.clone());
        }
        dirs
    }

    /// Path of the archive for `version`, downloading it from `channel`
    /// into `dest_dir` when no local copy exists
    pub async fn fetch(
        &self,
        version: &Version,
        channel: Channel,
        dest_dir: &Path,
    ) -> Result<PathBuf, CacheError> {
        let filename = self.source.filename(version);

        if let Some(path) = locate(&filename, &self.search_dirs(dest_dir)) {
            self.output.info(&format!("Using cached {}", path.display()));
            return Ok(path);
        }

        let url = self.source.archive_url(channel, version);
        info!("Fetching {}", url);

        let mut handler = DownloadHandler::new(dest_dir, filename);
        let mut file = handler.create_temp_file()?;

        let label = format!("Downloading '{}' {}", channel, version);
        let mut progress = self.output.create_finite_progress(&label);
        let result = Downloader::new(self.client.clone(), url)
            .get(&mut file, progress.as_mut())
            .await;
        progress.done(None);
        // Dropping the handler on error removes the temp file
        result?;
        drop(file);

        handler.finish(self.cache_dir.as_deref()).await
    }
}
