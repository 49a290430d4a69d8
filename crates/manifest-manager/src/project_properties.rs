//! project.properties Editing
//!
//! Line based `key=value` file written by the Android SDK tools.

use std::path::{Path, PathBuf};

use crate::ManifestError;

const LIBRARY_REFERENCE: &str = "android.library.reference.1";
const TARGET: &str = "target";

/// Native library projects a generated project may reference
pub const LIBRARY_PROJECTS: &[&str] = &["xwalk_core_library", "xwalk_shared_library"];

/// Value of `key` in properties text
pub fn read_property<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
}

/// Replace `key` in properties text, appending it when absent
pub fn write_property(text: &str, key: &str, value: &str) -> String {
    let mut out = String::with_capacity(text.len() + key.len() + value.len() + 2);
    let mut replaced = false;

    for line in text.lines() {
        let matches = line
            .strip_prefix(key)
            .map_or(false, |rest| rest.starts_with('='));
        if matches {
            out.push_str(&format!("{}={}\n", key, value));
            replaced = true;
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    if !replaced {
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}

/// A project.properties file
#[derive(Debug, Clone)]
pub struct ProjectProperties {
    path: PathBuf,
}

impl ProjectProperties {
    /// Open an existing file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let path = path.into();
        if !path.is_file() {
            return Err(ManifestError::FileNotFound(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self, key: &str) -> Result<Option<String>, ManifestError> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(read_property(&text, key).map(str::to_string))
    }

    pub fn write(&self, key: &str, value: &str) -> Result<(), ManifestError> {
        let text = std::fs::read_to_string(&self.path)?;
        std::fs::write(&self.path, write_property(&text, key, value))?;
        Ok(())
    }

    /// Reference the runtime library project
    pub fn set_library_reference(&self, library: &str) -> Result<(), ManifestError> {
        if !LIBRARY_PROJECTS.contains(&library) {
            return Err(ManifestError::InvalidProperty {
                key: LIBRARY_REFERENCE,
                value: library.to_string(),
            });
        }
        self.write(LIBRARY_REFERENCE, library)
    }

    pub fn library_reference(&self) -> Result<Option<String>, ManifestError> {
        self.read(LIBRARY_REFERENCE)
    }

    /// Set the API target, `android-N` with N above 14
    pub fn set_target(&self, target: &str) -> Result<(), ManifestError> {
        let valid = target
            .strip_prefix("android-")
            .and_then(|level| level.parse::<u32>().ok())
            .map_or(false, |level| level > 14);
        if !valid {
            return Err(ManifestError::InvalidProperty {
                key: TARGET,
                value: target.to_string(),
            });
        }
        self.write(TARGET, target)
    }

    pub fn target(&self) -> Result<Option<String>, ManifestError> {
        self.read(TARGET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPERTIES: &str = "# This file is automatically generated by Android Tools.\n\
        # Do not modify this file -- YOUR CHANGES WILL BE ERASED!\n\
        \n\
        # Project target.\n\
        target=android-19\n";

    #[test]
    fn test_read_write_text() {
        assert_eq!(read_property(PROPERTIES, "target"), Some("android-19"));
        assert_eq!(read_property(PROPERTIES, "targ"), None);

        let updated = write_property(PROPERTIES, "target", "android-21");
        assert_eq!(read_property(&updated, "target"), Some("android-21"));
        assert_eq!(updated.matches("target=").count(), 1);
        assert!(updated.starts_with("# This file is automatically generated"));

        let appended = write_property(PROPERTIES, LIBRARY_REFERENCE, "xwalk_core_library");
        assert!(appended.ends_with("android.library.reference.1=xwalk_core_library\n"));
    }

    #[test]
    fn test_project_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.properties");
        assert!(matches!(
            ProjectProperties::open(&path),
            Err(ManifestError::FileNotFound(_))
        ));

        std::fs::write(&path, PROPERTIES).unwrap();
        let props = ProjectProperties::open(&path).unwrap();

        props.set_library_reference("xwalk_shared_library").unwrap();
        assert_eq!(
            props.library_reference().unwrap().as_deref(),
            Some("xwalk_shared_library")
        );
        assert!(props.set_library_reference("other_library").is_err());

        props.set_target("android-21").unwrap();
        assert_eq!(props.target().unwrap().as_deref(), Some("android-21"));
        assert!(props.set_target("android-14").is_err());
        assert!(props.set_target("Google Inc.:Google APIs:21").is_err());
    }
}
