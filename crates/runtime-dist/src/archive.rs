//! Runtime Archives
//!
//! A runtime release is read either from its zip archive or from an
//! unpacked release directory. Both expose entries by their path relative
//! to the release, directories ending in `/`.

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::version::{Version, VersionError};

/// Archive errors
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("Unsafe entry name {0}")]
    UnsafeEntry(String),
}

/// `dest/relative`, or `None` when `relative` could leave `dest`
fn join_contained(dest: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| dest.join(relative))
}

/// Whether an entry is a single file or a directory tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// An entry found in a runtime archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    kind: EntryKind,
}

impl Entry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// Last path component
    pub fn file_name(&self) -> &str {
        self.name
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Source of runtime release files
pub trait ArchiveSource: Send {
    /// Version of the release
    fn version(&self) -> Version;

    /// Prefix of every entry, `""` or ending in `/`
    fn root(&self) -> &str;

    /// Look up an entry, names ending in `/` denote directories
    fn get_entry(&mut self, name: &str) -> Option<Entry>;

    /// Contents of a file entry
    fn read_entry(&mut self, entry: &Entry) -> Result<String, ArchiveError>;

    /// Extract `entry` into the directory `dest`, creating it if needed.
    /// A directory's contents land directly in `dest`, a file is written
    /// as `dest/<file name>`.
    fn extract_entry_to(&mut self, entry: &Entry, dest: &Path) -> Result<(), ArchiveError>;
}

/// Open a zip archive or an unpacked release directory
pub fn open(path: &Path) -> Result<Box<dyn ArchiveSource>, ArchiveError> {
    if path.is_dir() {
        Ok(Box::new(ReleaseDir::open(path)?))
    } else {
        Ok(Box::new(ZipRelease::open(path)?))
    }
}

/// Release zip, entries prefixed by the archive's base name
pub struct ZipRelease {
    zip: ZipArchive<File>,
    root: String,
    version: Version,
}

impl ZipRelease {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        // Validate the name before touching the file
        let version = Version::from_filename(path)?;
        let base = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let zip = ZipArchive::new(File::open(path)?)?;
        debug!("Opened {:?} with {} entries", path, zip.len());

        Ok(Self {
            zip,
            root: format!("{}/", base),
            version,
        })
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.zip.file_names()
    }

    fn write_file(&mut self, name: &str, target: &Path) -> Result<(), ArchiveError> {
        let mut file = self.zip.by_name(name)?;
        if file.enclosed_name().is_none() {
            return Err(ArchiveError::UnsafeEntry(name.to_string()));
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(target)?;
        io::copy(&mut file, &mut out)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(target, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
        Ok(())
    }
}

impl ArchiveSource for ZipRelease {
    fn version(&self) -> Version {
        self.version
    }

    fn root(&self) -> &str {
        &self.root
    }

    fn get_entry(&mut self, name: &str) -> Option<Entry> {
        if name.ends_with('/') {
            // Directory records are optional in zip files
            self.names()
                .any(|n| n.starts_with(name))
                .then(|| Entry {
                    name: name.to_string(),
                    kind: EntryKind::Dir,
                })
        } else {
            self.names().any(|n| n == name).then(|| Entry {
                name: name.to_string(),
                kind: EntryKind::File,
            })
        }
    }

    fn read_entry(&mut self, entry: &Entry) -> Result<String, ArchiveError> {
        let mut file = self.zip.by_name(entry.name())?;
        let mut contents = String::new();
        io::Read::read_to_string(&mut file, &mut contents)?;
        Ok(contents)
    }

    fn extract_entry_to(&mut self, entry: &Entry, dest: &Path) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dest)?;

        if !entry.is_dir() {
            let target = dest.join(entry.file_name());
            return self.write_file(entry.name(), &target);
        }

        let prefix = entry.name().to_string();
        let children: Vec<String> = self
            .names()
            .filter(|n| n.starts_with(&prefix) && n.len() > prefix.len())
            .map(str::to_string)
            .collect();

        for name in children {
            let target = join_contained(dest, &name[prefix.len()..])
                .ok_or_else(|| ArchiveError::UnsafeEntry(name.clone()))?;
            if name.ends_with('/') {
                std::fs::create_dir_all(&target)?;
            } else {
                self.write_file(&name, &target)?;
            }
        }
        Ok(())
    }
}

/// Unpacked release directory with a `VERSION` file
pub struct ReleaseDir {
    path: PathBuf,
    version: Version,
}

impl ReleaseDir {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let contents = std::fs::read_to_string(path.join("VERSION"))?;
        let version = Version::from_version_file(&contents)?;
        Ok(Self {
            path: path.to_path_buf(),
            version,
        })
    }
}

impl ArchiveSource for ReleaseDir {
    fn version(&self) -> Version {
        self.version
    }

    fn root(&self) -> &str {
        ""
    }

    fn get_entry(&mut self, name: &str) -> Option<Entry> {
        let path = self.path.join(name);
        if path.is_dir() {
            Some(Entry {
                name: name.to_string(),
                kind: EntryKind::Dir,
            })
        } else if path.is_file() {
            Some(Entry {
                name: name.to_string(),
                kind: EntryKind::File,
            })
        } else {
            None
        }
    }

    fn read_entry(&mut self, entry: &Entry) -> Result<String, ArchiveError> {
        Ok(std::fs::read_to_string(self.path.join(entry.name()))?)
    }

    fn extract_entry_to(&mut self, entry: &Entry, dest: &Path) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dest)?;
        let source = self.path.join(entry.name());

        if !entry.is_dir() {
            std::fs::copy(&source, dest.join(entry.file_name()))?;
            return Ok(());
        }

        for item in WalkDir::new(&source).min_depth(1) {
            let item = item.map_err(io::Error::from)?;
            let relative = item
                .path()
                .strip_prefix(&source)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let target = dest.join(relative);
            if item.file_type().is_dir() {
                std::fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(item.path(), &target)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    /// Write a zip at `path` holding `files` as (name, contents)
    pub(crate) fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default();
        for (name, contents) in files {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(contents.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_zip_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswalk-18.48.477.13.zip");
        write_zip(
            &path,
            &[
                ("crosswalk-18.48.477.13/", ""),
                ("crosswalk-18.48.477.13/xwalk_core_library/libs/x86/libxwalkcore.so", "x86"),
                ("crosswalk-18.48.477.13/xwalk_core_library/libs/armeabi-v7a/libxwalkcore.so", "arm"),
                ("crosswalk-18.48.477.13/template/libs/xwalk_app_runtime_java.jar", "jar"),
            ],
        );

        let mut release = open(&path).unwrap();
        assert_eq!(release.version(), Version::new(18, 48, 477, 13));
        assert_eq!(release.root(), "crosswalk-18.48.477.13/");
        assert!(release.get_entry("crosswalk-18.48.477.13/").is_some());
        assert!(release.get_entry("crosswalk-18.48.477.13/missing/").is_none());

        // No explicit directory record for the library
        let library = release
            .get_entry("crosswalk-18.48.477.13/xwalk_core_library/")
            .unwrap();
        let out = dir.path().join("prj").join("xwalk_core_library");
        release.extract_entry_to(&library, &out).unwrap();
        assert_eq!(
            std::fs::read_to_string(out.join("libs/x86/libxwalkcore.so")).unwrap(),
            "x86"
        );
        assert!(out.join("libs/armeabi-v7a/libxwalkcore.so").is_file());

        let jar = release
            .get_entry("crosswalk-18.48.477.13/template/libs/xwalk_app_runtime_java.jar")
            .unwrap();
        let libs = dir.path().join("prj").join("libs");
        release.extract_entry_to(&jar, &libs).unwrap();
        assert!(libs.join("xwalk_app_runtime_java.jar").is_file());
    }

    #[test]
    fn test_zip_requires_versioned_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswalk.zip");
        write_zip(&path, &[("crosswalk/", "")]);
        assert!(matches!(open(&path), Err(ArchiveError::Version(_))));
    }

    #[test]
    fn test_zip_entry_escaping_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswalk-18.48.477.13.zip");
        write_zip(
            &path,
            &[
                ("crosswalk-18.48.477.13/", ""),
                ("crosswalk-18.48.477.13/xwalk_core_library/libs/x86/libxwalkcore.so", "so"),
                ("crosswalk-18.48.477.13/xwalk_core_library/../../evil", "evil"),
            ],
        );

        let project = dir.path().join("prj").join("android");
        let mut release = open(&path).unwrap();
        let entry = release
            .get_entry("crosswalk-18.48.477.13/xwalk_core_library/")
            .unwrap();
        let err = release
            .extract_entry_to(&entry, &project.join("xwalk_core_library"))
            .unwrap_err();

        assert!(matches!(err, ArchiveError::UnsafeEntry(_)));
        assert!(!project.join("evil").exists());
        assert!(!dir.path().join("prj").join("evil").exists());
    }

    #[test]
    fn test_corrupt_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswalk-18.48.477.13.zip");
        std::fs::write(&path, b"this is not a zip").unwrap();
        assert!(matches!(open(&path), Err(ArchiveError::Zip(_))));
    }

    #[test]
    fn test_release_dir() {
        let dir = tempfile::tempdir().unwrap();
        let release_path = dir.path().join("xwalk_app_template");
        std::fs::create_dir_all(release_path.join("template/res/values")).unwrap();
        std::fs::write(
            release_path.join("VERSION"),
            "MAJOR=18\nMINOR=48\nBUILD=477\nPATCH=13\n",
        )
        .unwrap();
        std::fs::write(release_path.join("template/res/values/strings.xml"), "<resources/>").unwrap();

        let mut release = open(&release_path).unwrap();
        assert_eq!(release.version(), Version::new(18, 48, 477, 13));
        assert_eq!(release.root(), "");

        let res = release.get_entry("template/res/").unwrap();
        assert!(res.is_dir());
        let out = dir.path().join("prj").join("res");
        release.extract_entry_to(&res, &out).unwrap();
        assert!(out.join("values/strings.xml").is_file());
    }
}
