//! Runtime Versions
//!
//! Four part version numbers `major.minor.micro.build`. Ordering compares
//! components left to right, major being most significant.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Version errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,
    #[error("Invalid version '{text}': expected 4 components, got {count}")]
    ComponentCount { text: String, count: usize },
    #[error("Invalid version '{text}': component '{component}' is not a number")]
    NotNumeric { text: String, component: String },
    #[error("Invalid {name} version number '{value}'")]
    InvalidComponent { name: &'static str, value: i64 },
    #[error("Cannot derive a version from filename '{0}'")]
    InvalidFilename(String),
    #[error("Invalid VERSION file: {0}")]
    InvalidVersionFile(String),
}

const COMPONENT_NAMES: [&str; 4] = ["major", "minor", "micro", "build"];

/// Four part runtime version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Version {
    major: u32,
    minor: u32,
    micro: u32,
    build: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, micro: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            build,
        }
    }

    /// Construct from signed components, rejecting negative or
    /// out-of-range values
    pub fn from_components(components: [i64; 4]) -> Result<Self, VersionError> {
        let mut parts = [0u32; 4];
        for (i, value) in components.into_iter().enumerate() {
            parts[i] = u32::try_from(value).map_err(|_| VersionError::InvalidComponent {
                name: COMPONENT_NAMES[i],
                value,
            })?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn micro(&self) -> u32 {
        self.micro
    }

    pub fn build(&self) -> u32 {
        self.build
    }

    pub fn components(&self) -> [u32; 4] {
        [self.major, self.minor, self.micro, self.build]
    }

    /// Parse `a.b.c.d`
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 4 {
            return Err(VersionError::ComponentCount {
                text: text.to_string(),
                count: parts.len(),
            });
        }

        let mut numbers = [0u32; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            // u32::from_str would also take a leading '+'
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::NotNumeric {
                    text: text.to_string(),
                    component: part.to_string(),
                });
            }
            *slot = part.parse().map_err(|_| VersionError::NotNumeric {
                text: text.to_string(),
                component: part.to_string(),
            })?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2], numbers[3]))
    }

    /// Version encoded in an archive filename such as
    /// `crosswalk-15.44.384.12.zip` or `crosswalk-15.44.384.12-64bit.zip`
    pub fn from_filename(path: &Path) -> Result<Self, VersionError> {
        let invalid = || VersionError::InvalidFilename(path.display().to_string());

        let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
        let mut parts = stem.split('-');
        let _name = parts.next().ok_or_else(invalid)?;
        let version = parts.next().ok_or_else(invalid)?;
        Self::parse(version)
    }

    /// Version from the contents of an unpacked release's `VERSION` file,
    /// four `KEY=value` lines for MAJOR, MINOR, BUILD and PATCH
    pub fn from_version_file(contents: &str) -> Result<Self, VersionError> {
        let lines: Vec<&str> = contents.split('\n').collect();
        if lines.len() != 5 {
            return Err(VersionError::InvalidVersionFile(format!(
                "expected 4 lines, got {}",
                lines.len()
            )));
        }

        let mut values: [Option<i64>; 4] = [None; 4];
        for line in lines.iter().filter(|l| !l.is_empty()) {
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| VersionError::InvalidVersionFile(format!("malformed line '{}'", line)))?;
            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "major" => 0,
                "minor" => 1,
                "build" => 2,
                "patch" => 3,
                other => {
                    return Err(VersionError::InvalidVersionFile(format!(
                        "unknown key '{}'",
                        other
                    )))
                }
            };
            let number = value.trim().parse::<i64>().map_err(|_| {
                VersionError::InvalidVersionFile(format!("'{}' is not a number", value.trim()))
            })?;
            values[slot] = Some(number);
        }

        let mut components = [0i64; 4];
        for (i, value) in values.into_iter().enumerate() {
            components[i] = value.ok_or_else(|| {
                VersionError::InvalidVersionFile(format!("missing {}", COMPONENT_NAMES[i]))
            })?;
        }
        Self::from_components(components)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.micro, self.build)
    }
}
