//! Native Library Toggling
//!
//! The runtime library project carries one `libs/<abi>/` directory per
//! ABI. A build only packages the ABIs whose libraries carry their real
//! names; disabled ones get a `.foo` suffix the packager ignores.

use std::path::{Path, PathBuf};

use crosspack_core::Output;
use tracing::debug;
use walkdir::WalkDir;

use crate::abi::SHARED_ABI;

/// Native libraries directory relative to the platform project
pub const LIBS_DIR: &str = "xwalk_core_library/libs";

/// Libraries renamed when toggling an ABI
pub const NATIVE_LIBS: &[&str] = &["libxwalkcore.so", "libxwalkcoreCompressed.so", "libxwalkdummy.so"];

const DISABLED_SUFFIX: &str = ".foo";

/// Toggle errors
#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error("This does not appear to be the root of a Crosswalk project: {0}")]
    NotAProject(PathBuf),
    #[error("No native libraries for ABI '{0}'")]
    UnknownAbi(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Per-ABI native libraries of one project
#[derive(Debug, Clone)]
pub struct NativeLibs {
    /// `None` for shared runtime projects, which have nothing to toggle
    libs_dir: Option<PathBuf>,
}

impl NativeLibs {
    /// Embedded runtime project at `project`
    pub fn embedded(project: &Path) -> Self {
        Self {
            libs_dir: Some(project.join(LIBS_DIR)),
        }
    }

    /// Shared runtime project
    pub fn shared() -> Self {
        Self { libs_dir: None }
    }

    pub fn is_shared(&self) -> bool {
        self.libs_dir.is_none()
    }

    pub fn libs_dir(&self) -> Option<&Path> {
        self.libs_dir.as_deref()
    }

    fn existing_libs_dir(&self) -> Result<Option<&Path>, ToggleError> {
        match self.libs_dir.as_deref() {
            Some(dir) if !dir.is_dir() => Err(ToggleError::NotAProject(dir.to_path_buf())),
            other => Ok(other),
        }
    }

    /// ABI directories present, sorted
    pub fn available(&self) -> Result<Vec<String>, ToggleError> {
        let Some(dir) = self.existing_libs_dir()? else {
            return Ok(vec![SHARED_ABI.to_string()]);
        };

        let mut abis = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                abis.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        abis.sort();
        Ok(abis)
    }

    /// ABIs to build: every available one when `requested` is empty,
    /// otherwise the requested ones that exist. Missing ones are
    /// reported and skipped.
    pub fn select(&self, requested: &[String], output: &dyn Output) -> Result<Vec<String>, ToggleError> {
        let available = self.available()?;
        if self.is_shared() || requested.is_empty() {
            return Ok(available);
        }

        let mut selected = Vec::new();
        for abi in requested {
            if available.contains(abi) {
                selected.push(abi.clone());
            } else {
                output.error(&format!("Failed to find libxwalkcore.so for {}, skipping", abi));
            }
        }
        Ok(selected)
    }

    /// Enable only `abi`, or every ABI when `None`
    pub fn enable(&self, abi: Option<&str>) -> Result<(), ToggleError> {
        let Some(dir) = self.existing_libs_dir()? else {
            return Ok(());
        };

        let mut matched = abi.is_none();
        for entry in self.available()? {
            let enable = abi.map_or(true, |wanted| wanted == entry);
            matched |= enable;
            set_enabled(&dir.join(&entry), enable)?;
        }

        match abi {
            Some(abi) if !matched => Err(ToggleError::UnknownAbi(abi.to_string())),
            _ => Ok(()),
        }
    }

    /// Restore the default state with every ABI enabled
    pub fn enable_all(&self) -> Result<(), ToggleError> {
        self.enable(None)
    }

    /// ABIs whose libraries are not disabled
    pub fn enabled(&self) -> Result<Vec<String>, ToggleError> {
        let Some(dir) = self.existing_libs_dir()? else {
            return Ok(vec![SHARED_ABI.to_string()]);
        };
        Ok(self
            .available()?
            .into_iter()
            .filter(|abi| {
                NATIVE_LIBS
                    .iter()
                    .all(|lib| !dir.join(abi).join(format!("{}{}", lib, DISABLED_SUFFIX)).exists())
            })
            .collect())
    }
}

fn set_enabled(abi_dir: &Path, enable: bool) -> Result<(), ToggleError> {
    for lib in NATIVE_LIBS {
        let enabled = abi_dir.join(lib);
        let disabled = abi_dir.join(format!("{}{}", lib, DISABLED_SUFFIX));
        let (from, to) = if enable { (disabled, enabled) } else { (enabled, disabled) };
        // Not every release ships every library
        if from.is_file() {
            debug!("Renaming {:?} -> {:?}", from, to);
            std::fs::rename(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crosspack_core::output::{MemoryOutput, MessageKind};

    /// Project with native libraries for `abis`
    pub(crate) fn project_with_abis(root: &Path, abis: &[&str]) {
        for abi in abis {
            let dir = root.join(LIBS_DIR).join(abi);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("libxwalkcore.so"), b"core").unwrap();
            std::fs::write(dir.join("libxwalkdummy.so"), b"dummy").unwrap();
        }
    }

    #[test]
    fn test_enable_single_abi() {
        let dir = tempfile::tempdir().unwrap();
        project_with_abis(dir.path(), &["armeabi-v7a", "x86"]);
        let libs = NativeLibs::embedded(dir.path());

        libs.enable(Some("x86")).unwrap();
        assert_eq!(libs.enabled().unwrap(), vec!["x86"]);
        let arm = dir.path().join(LIBS_DIR).join("armeabi-v7a");
        assert!(arm.join("libxwalkcore.so.foo").is_file());
        assert!(!arm.join("libxwalkcore.so").exists());

        // Switching is idempotent with respect to the other ABI
        libs.enable(Some("armeabi-v7a")).unwrap();
        assert_eq!(libs.enabled().unwrap(), vec!["armeabi-v7a"]);

        libs.enable_all().unwrap();
        assert_eq!(libs.enabled().unwrap(), vec!["armeabi-v7a", "x86"]);
        assert!(arm.join("libxwalkcore.so").is_file());
    }

    #[test]
    fn test_enable_unknown_abi() {
        let dir = tempfile::tempdir().unwrap();
        project_with_abis(dir.path(), &["x86"]);
        let libs = NativeLibs::embedded(dir.path());

        assert!(matches!(
            libs.enable(Some("arm64-v8a")),
            Err(ToggleError::UnknownAbi(abi)) if abi == "arm64-v8a"
        ));

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            NativeLibs::embedded(empty.path()).enable_all(),
            Err(ToggleError::NotAProject(_))
        ));
    }

    #[test]
    fn test_select() {
        let dir = tempfile::tempdir().unwrap();
        project_with_abis(dir.path(), &["x86", "armeabi-v7a"]);
        let libs = NativeLibs::embedded(dir.path());
        let output = MemoryOutput::new();

        assert_eq!(libs.select(&[], &output).unwrap(), vec!["armeabi-v7a", "x86"]);

        let requested = vec!["x86".to_string(), "arm64-v8a".to_string()];
        assert_eq!(libs.select(&requested, &output).unwrap(), vec!["x86"]);
        assert!(output.contains(MessageKind::Error, "arm64-v8a, skipping"));
    }

    #[test]
    fn test_shared_has_nothing_to_toggle() {
        let libs = NativeLibs::shared();
        let output = MemoryOutput::new();
        assert_eq!(libs.select(&["x86".to_string()], &output).unwrap(), vec![SHARED_ABI]);
        libs.enable(Some(SHARED_ABI)).unwrap();
        libs.enable_all().unwrap();
    }
}
