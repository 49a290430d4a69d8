//! Release Naming
//!
//! Where a runtime release lives on the server and what its archive is
//! called. Layout:
//!
//! ```text
//! <base>/<flavor>/<platform>/<channel>/                       index
//! <base>/<flavor>/<platform>/<channel>/<version>/<filename>   archive
//! ```

use std::fmt;

use crosspack_core::{AppConfig, Channel, Flavor, WordSize};

use crate::version::Version;

/// Platform a runtime release is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePlatform {
    Android,
    Windows,
}

impl RuntimePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimePlatform::Android => "android",
            RuntimePlatform::Windows => "windows",
        }
    }
}

impl fmt::Display for RuntimePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flavor/platform/word size combination on one release server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    base_url: String,
    flavor: Flavor,
    platform: RuntimePlatform,
    word_size: WordSize,
}

impl ReleaseSource {
    pub fn new(
        base_url: impl Into<String>,
        flavor: Flavor,
        platform: RuntimePlatform,
        word_size: WordSize,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            flavor,
            platform,
            word_size,
        }
    }

    /// Source described by the user configuration
    pub fn from_config(config: &AppConfig, platform: RuntimePlatform) -> Self {
        Self::new(
            config.download_base_url.clone(),
            config.flavor,
            platform,
            config.android_word_size,
        )
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn platform(&self) -> RuntimePlatform {
        self.platform
    }

    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    pub fn with_word_size(mut self, word_size: WordSize) -> Self {
        self.word_size = word_size;
        self
    }

    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Archive filename for `version`
    pub fn filename(&self, version: &Version) -> String {
        match (self.platform, self.word_size) {
            (RuntimePlatform::Windows, _) => format!("crosswalk64-{}.zip", version),
            (RuntimePlatform::Android, WordSize::Bits64) => {
                format!("crosswalk-{}-64bit.zip", version)
            }
            (RuntimePlatform::Android, WordSize::Bits32) => format!("crosswalk-{}.zip", version),
        }
    }

    /// Directory listing of a channel
    pub fn index_url(&self, channel: Channel) -> String {
        format!(
            "{}{}/{}/{}/",
            self.base_url,
            self.flavor.as_str(),
            self.platform,
            channel
        )
    }

    /// Download location of an archive
    pub fn archive_url(&self, channel: Channel, version: &Version) -> String {
        format!(
            "{}{}/{}",
            self.index_url(channel),
            version,
            self.filename(version)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspack_core::config::DEFAULT_BASE_URL;

    fn version() -> Version {
        Version::new(15, 44, 384, 12)
    }

    #[test]
    fn test_filenames() {
        let android = ReleaseSource::new(
            DEFAULT_BASE_URL,
            Flavor::Crosswalk,
            RuntimePlatform::Android,
            WordSize::Bits32,
        );
        assert_eq!(android.filename(&version()), "crosswalk-15.44.384.12.zip");

        let android64 = android.clone().with_word_size(WordSize::Bits64);
        assert_eq!(android64.filename(&version()), "crosswalk-15.44.384.12-64bit.zip");

        let windows = ReleaseSource::new(
            DEFAULT_BASE_URL,
            Flavor::Crosswalk,
            RuntimePlatform::Windows,
            WordSize::Bits64,
        );
        assert_eq!(windows.filename(&version()), "crosswalk64-15.44.384.12.zip");
    }

    #[test]
    fn test_urls() {
        let source = ReleaseSource::new(
            "https://download.01.org/crosswalk/releases",
            Flavor::CrosswalkLite,
            RuntimePlatform::Android,
            WordSize::Bits32,
        );
        assert_eq!(
            source.index_url(Channel::Canary),
            "https://download.01.org/crosswalk/releases/crosswalk-lite/android/canary/"
        );
        assert_eq!(
            source.archive_url(Channel::Canary, &version()),
            "https://download.01.org/crosswalk/releases/crosswalk-lite/android/canary/15.44.384.12/crosswalk-15.44.384.12.zip"
        );
    }
}
