//! Build Output Naming
//!
//! `ant` always writes `bin/<base>-debug.apk` or
//! `bin/<base>-release-unsigned.apk`. Each ABI's package is renamed right
//! after its build so the next ABI does not overwrite it.

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::{debug, warn};

/// Package errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("APK {0} not found")]
    NotFound(String),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Suffix of the package `ant` produces
pub fn output_suffix(release: bool) -> &'static str {
    if release {
        "-release-unsigned.apk"
    } else {
        "-debug.apk"
    }
}

/// First file in `bin_dir` matching `*<suffix>`
pub fn find_output(bin_dir: &Path, release: bool) -> Result<Option<PathBuf>, PackageError> {
    let pattern = bin_dir.join(format!("*{}", output_suffix(release)));
    let pattern = pattern.to_string_lossy();
    let mut matches: Vec<PathBuf> = glob(&pattern)?.filter_map(|entry| entry.ok()).collect();
    matches.sort();
    Ok(matches.into_iter().find(|path| path.is_file()))
}

/// Rename the freshly built package to
/// `<base>-<app_version>-<debug|release-unsigned>.<abi>.apk`
pub fn abify_apk_name(
    bin_dir: &Path,
    app_version: &str,
    abi: &str,
    release: bool,
) -> Result<PathBuf, PackageError> {
    let suffix = output_suffix(release);
    let input = find_output(bin_dir, release)?.ok_or_else(|| {
        PackageError::NotFound(bin_dir.join(format!("*{}", suffix)).display().to_string())
    })?;

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(suffix).unwrap_or(&name);
    let kind = if release { "release-unsigned" } else { "debug" };
    let output = bin_dir.join(format!("{}-{}-{}.{}.apk", base, app_version, kind, abi));

    debug!("Renaming {:?} -> {:?}", input, output);
    std::fs::rename(&input, &output)?;
    if !output.is_file() {
        return Err(PackageError::NotFound(output.display().to_string()));
    }
    Ok(output)
}

/// Delete `*-debug-unaligned.apk` leftovers so only usable packages remain
pub fn remove_unaligned(bin_dir: &Path) -> Result<usize, PackageError> {
    let pattern = bin_dir.join("*-debug-unaligned.apk");
    let mut removed = 0;
    for path in glob(&pattern.to_string_lossy())?.filter_map(|entry| entry.ok()) {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not delete {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abify_debug() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path();
        std::fs::write(bin.join("Foo-debug.apk"), b"apk").unwrap();
        std::fs::write(bin.join("Foo-debug-unaligned.apk"), b"apk").unwrap();

        let renamed = abify_apk_name(bin, "1.2.3", "x86", false).unwrap();
        assert_eq!(renamed, bin.join("Foo-1.2.3-debug.x86.apk"));
        assert!(!bin.join("Foo-debug.apk").exists());

        // The renamed package no longer matches the build output pattern
        assert!(find_output(bin, false).unwrap().is_none());

        assert_eq!(remove_unaligned(bin).unwrap(), 1);
        assert!(!bin.join("Foo-debug-unaligned.apk").exists());
    }

    #[test]
    fn test_abify_release() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path();
        std::fs::write(bin.join("Foo-release-unsigned.apk"), b"apk").unwrap();

        let renamed = abify_apk_name(bin, "2", "arm64-v8a", true).unwrap();
        assert_eq!(renamed, bin.join("Foo-2-release-unsigned.arm64-v8a.apk"));
    }

    #[test]
    fn test_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            abify_apk_name(dir.path(), "1", "x86", true),
            Err(PackageError::NotFound(_))
        ));
    }
}
