//! Channel Index
//!
//! The release server publishes one directory per version in an Apache
//! style listing. Only directory entry lines are recognized; everything
//! else on the page is markup and gets ignored.

use crate::version::{Version, VersionError};

/// Start of a directory entry line in the listing
const DIR_PREFIX: &str = r#"<img src="/icons/folder.gif" alt="[DIR]"> <a href=""#;

/// Symlink to the newest release, not a version
const LATEST_LINK: &str = "latest";

/// Parse a listing page into version strings, in listing order
pub fn parse(page: &str) -> Vec<String> {
    let mut versions = Vec::new();

    for line in page.split('\n') {
        if line.to_ascii_lowercase().contains("parent directory") {
            continue;
        }

        let Some(rest) = line.strip_prefix(DIR_PREFIX) else {
            continue;
        };
        if rest.starts_with(LATEST_LINK) {
            continue;
        }

        if let Some(end) = rest.find("/\"") {
            versions.push(rest[..end].to_string());
        }
    }

    versions
}

/// Pick the greatest version. The listing is not sorted.
///
/// Returns `Ok(None)` for an empty list. Any entry that is not a valid
/// four part version fails the whole pick.
pub fn pick_latest<S: AsRef<str>>(versions: &[S]) -> Result<Option<Version>, VersionError> {
    let zero = Version::default();
    let mut best = zero;

    for candidate in versions {
        let candidate = Version::parse(candidate.as_ref())?;
        // Decided at the first differing component
        if candidate > best {
            best = candidate;
        }
    }

    Ok((best != zero).then_some(best))
}
