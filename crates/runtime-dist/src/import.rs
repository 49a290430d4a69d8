//! Archive Importer
//!
//! Copies the parts of a runtime release a platform project needs. What
//! is needed is described by an [`ImportPlan`] built by the platform
//! backend; the importer only checks versions and entries and extracts.
//!
//! A failed import is not rolled back. Entries extracted before the
//! failure stay on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crosspack_core::{FiniteProgress, Output};
use tracing::{debug, info};

use crate::archive::{self, ArchiveError, ArchiveSource};
use crate::version::Version;

/// Longest archive path shown in the progress label
const MAX_LABEL_PATH: usize = 47;

/// Import errors
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: ArchiveError,
    },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("Failed to find root entry {0}")]
    MissingRoot(String),
    #[error("Failed to find entry {0}")]
    MissingEntry(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Whether the archive file itself is unusable and should be fetched
    /// again
    pub fn is_corrupt_archive(&self) -> bool {
        matches!(self, ImportError::Open { .. } | ImportError::MissingRoot(_))
    }
}

/// Result of an import that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(Version),
    /// The release is outside the supported range, nothing was extracted
    Unsupported { version: Version, reason: String },
}

/// Rewrites a text file on its way into the project
pub type TextTransform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// What to do with one required entry
pub enum EntryAction {
    /// Extract into this directory
    ExtractTo(PathBuf),
    /// Read as text, transform and write to this file
    Rewrite { dest: PathBuf, transform: TextTransform },
}

/// One required entry, named relative to the release root
pub struct PlanEntry {
    pub name: String,
    pub action: EntryAction,
}

/// Supported release majors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MajorBounds {
    /// Older releases are not supported at all
    pub min_supported: u32,
    /// Older releases need a previous version of this tool
    pub min_current: u32,
    /// Newer releases import with a warning
    pub max_tested: u32,
}

impl MajorBounds {
    fn check(&self, major: u32) -> Result<Option<String>, String> {
        if major < self.min_supported {
            Err(format!(
                "Crosswalk version {} not supported. Use {}+.",
                major, self.min_supported
            ))
        } else if major < self.min_current {
            Err(format!(
                "This version can't support Crosswalk {}. Please use previous version of this tool.",
                major
            ))
        } else if major > self.max_tested {
            Ok(Some(format!(
                "This tool has not been tested with Crosswalk {}.",
                major
            )))
        } else {
            Ok(None)
        }
    }
}

/// Required entries and version bounds for one project
pub struct ImportPlan {
    pub bounds: MajorBounds,
    pub entries: Vec<PlanEntry>,
}

impl ImportPlan {
    pub fn new(bounds: MajorBounds) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
        }
    }

    /// Extract `name` into the directory `dest`
    pub fn extract(mut self, name: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        self.entries.push(PlanEntry {
            name: name.into(),
            action: EntryAction::ExtractTo(dest.into()),
        });
        self
    }

    /// Rewrite the text file `name` into the file `dest`
    pub fn rewrite<F>(mut self, name: impl Into<String>, dest: impl Into<PathBuf>, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.entries.push(PlanEntry {
            name: name.into(),
            action: EntryAction::Rewrite {
                dest: dest.into(),
                transform: Box::new(transform),
            },
        });
        self
    }
}

/// Imports runtime releases into platform projects
pub struct ArchiveImporter {
    output: Arc<dyn Output>,
}

impl ArchiveImporter {
    pub fn new(output: Arc<dyn Output>) -> Self {
        Self { output }
    }

    /// Open the release at `path` and import it. An archive that cannot be
    /// read or lacks its root entry is deleted so the next run fetches it
    /// again.
    pub fn import_path(&self, path: &Path, plan: &ImportPlan) -> Result<ImportOutcome, ImportError> {
        let display = path.display().to_string();
        let label = if display.len() > MAX_LABEL_PATH {
            let mut start = display.len() - MAX_LABEL_PATH;
            while !display.is_char_boundary(start) {
                start += 1;
            }
            format!("Extracting ...{}", &display[start..])
        } else {
            format!("Extracting {}", display)
        };
        let mut progress = self.output.create_finite_progress(&label);

        let result = archive::open(path)
            .map_err(|source| ImportError::Open {
                path: display.clone(),
                source,
            })
            .and_then(|mut release| self.import_into(release.as_mut(), plan, progress.as_mut()));
        progress.done(None);

        if let Err(err) = &result {
            if err.is_corrupt_archive() && path.is_file() {
                self.output.error(&err.to_string());
                std::fs::remove_file(path)?;
                self.output.error("Invalid file has been deleted, please try again");
            }
        }
        result
    }

    /// Check `release` against the plan and extract every required entry
    pub fn import_into(
        &self,
        release: &mut dyn ArchiveSource,
        plan: &ImportPlan,
        progress: &mut dyn FiniteProgress,
    ) -> Result<ImportOutcome, ImportError> {
        let version = release.version();
        progress.update(0.2);

        match plan.bounds.check(version.major()) {
            Err(reason) => {
                self.output.error(&reason);
                return Ok(ImportOutcome::Unsupported { version, reason });
            }
            Ok(Some(warning)) => self.output.warning(&warning),
            Ok(None) => {}
        }

        let root = release.root().to_string();
        if !root.is_empty() && release.get_entry(&root).is_none() {
            return Err(ImportError::MissingRoot(root));
        }
        progress.update(0.4);

        let count = plan.entries.len().max(1) as f64;
        for (i, planned) in plan.entries.iter().enumerate() {
            let name = format!("{}{}", root, planned.name);
            let entry = release
                .get_entry(&name)
                .ok_or_else(|| ImportError::MissingEntry(name.clone()))?;

            match &planned.action {
                EntryAction::ExtractTo(dest) => {
                    debug!("Extracting {} to {:?}", name, dest);
                    release.extract_entry_to(&entry, dest)?;
                }
                EntryAction::Rewrite { dest, transform } => {
                    debug!("Rewriting {} to {:?}", name, dest);
                    let contents = release.read_entry(&entry)?;
                    if let Some(parent) = dest.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(dest, transform(&contents))?;
                }
            }
            progress.update(0.4 + 0.6 * (i + 1) as f64 / count);
        }

        progress.update(1.0);
        info!("Imported Crosswalk {}", version);
        Ok(ImportOutcome::Imported(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::write_zip;
    use crosspack_core::output::MessageKind;
    use crosspack_core::MemoryOutput;

    const BOUNDS: MajorBounds = MajorBounds {
        min_supported: 9,
        min_current: 17,
        max_tested: 19,
    };

    fn release_zip(dir: &Path, version: &str, with_library: bool) -> PathBuf {
        let root = format!("crosswalk-{}/", version);
        let mut files = vec![
            (root.clone(), String::new()),
            (
                format!("{}template/libs/xwalk_app_runtime_java.jar", root),
                "jar".to_string(),
            ),
            (
                format!("{}template/src/org/xwalk/app/template/AppTemplateActivity.java", root),
                "package org.xwalk.app.template;\nclass AppTemplateActivity {}\n".to_string(),
            ),
        ];
        if with_library {
            files.insert(
                1,
                (
                    format!("{}xwalk_core_library/libs/x86/libxwalkcore.so", root),
                    "so".to_string(),
                ),
            );
        }
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();

        let path = dir.join(format!("crosswalk-{}.zip", version));
        write_zip(&path, &borrowed);
        path
    }

    fn plan(project: &Path) -> ImportPlan {
        ImportPlan::new(BOUNDS)
            .extract("xwalk_core_library/", project.join("xwalk_core_library"))
            .extract("template/libs/xwalk_app_runtime_java.jar", project.join("libs"))
            .rewrite(
                "template/src/org/xwalk/app/template/AppTemplateActivity.java",
                project.join("src/com/example/foo/FooActivity.java"),
                |text| {
                    text.replace("org.xwalk.app.template", "com.example.foo")
                        .replace("AppTemplateActivity", "FooActivity")
                },
            )
    }

    #[test]
    fn test_import_release() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("prj");
        let path = release_zip(dir.path(), "18.48.477.13", true);

        let output = Arc::new(MemoryOutput::new());
        let importer = ArchiveImporter::new(output.clone());
        let outcome = importer.import_path(&path, &plan(&project)).unwrap();

        assert_eq!(outcome, ImportOutcome::Imported(Version::new(18, 48, 477, 13)));
        assert!(project.join("xwalk_core_library/libs/x86/libxwalkcore.so").is_file());
        assert!(project.join("libs/xwalk_app_runtime_java.jar").is_file());
        let activity =
            std::fs::read_to_string(project.join("src/com/example/foo/FooActivity.java")).unwrap();
        assert!(activity.contains("package com.example.foo;"));
        assert!(activity.contains("class FooActivity"));
        assert_eq!(output.fractions().last(), Some(&1.0));
    }

    #[test]
    fn test_missing_entry_keeps_earlier_extractions() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("prj");
        let path = release_zip(dir.path(), "18.48.477.13", false);

        // The jar comes first here, the library is missing
        let plan = ImportPlan::new(BOUNDS)
            .extract("template/libs/xwalk_app_runtime_java.jar", project.join("libs"))
            .extract("xwalk_core_library/", project.join("xwalk_core_library"))
            .extract("template/res/", project.join("res"));

        let importer = ArchiveImporter::new(Arc::new(MemoryOutput::new()));
        let err = importer.import_path(&path, &plan).unwrap_err();

        match err {
            ImportError::MissingEntry(name) => {
                assert_eq!(name, "crosswalk-18.48.477.13/xwalk_core_library/")
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(project.join("libs/xwalk_app_runtime_java.jar").is_file());
        assert!(!project.join("res").exists());
        // Structurally valid archive, kept
        assert!(path.is_file());
    }

    #[test]
    fn test_unsupported_versions() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("prj");
        let output = Arc::new(MemoryOutput::new());
        let importer = ArchiveImporter::new(output.clone());

        let old = release_zip(dir.path(), "8.37.189.14", true);
        match importer.import_path(&old, &plan(&project)).unwrap() {
            ImportOutcome::Unsupported { version, reason } => {
                assert_eq!(version.major(), 8);
                assert_eq!(reason, "Crosswalk version 8 not supported. Use 9+.");
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let legacy = release_zip(dir.path(), "16.45.421.19", true);
        assert!(matches!(
            importer.import_path(&legacy, &plan(&project)).unwrap(),
            ImportOutcome::Unsupported { .. }
        ));
        assert!(!project.exists());

        let newer = release_zip(dir.path(), "21.51.546.7", true);
        assert!(matches!(
            importer.import_path(&newer, &plan(&project)).unwrap(),
            ImportOutcome::Imported(_)
        ));
        assert!(output.contains(MessageKind::Warning, "not been tested with Crosswalk 21"));
    }

    #[test]
    fn test_missing_root_deletes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswalk-18.48.477.13.zip");
        write_zip(&path, &[("something-else/file.txt", "x")]);

        let output = Arc::new(MemoryOutput::new());
        let importer = ArchiveImporter::new(output.clone());
        let err = importer.import_path(&path, &plan(&dir.path().join("prj"))).unwrap_err();

        assert!(matches!(err, ImportError::MissingRoot(_)));
        assert!(!path.exists());
        assert!(output.contains(MessageKind::Error, "Invalid file has been deleted"));
    }

    #[test]
    fn test_corrupt_archive_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswalk-18.48.477.13.zip");
        std::fs::write(&path, b"truncated").unwrap();

        let importer = ArchiveImporter::new(Arc::new(MemoryOutput::new()));
        let err = importer.import_path(&path, &plan(&dir.path().join("prj"))).unwrap_err();

        assert!(err.is_corrupt_archive());
        assert!(!path.exists());
    }
}
