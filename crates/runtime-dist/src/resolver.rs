//! Version Resolver
//!
//! Turns "a version or the latest one, in a channel or anywhere" into a
//! concrete version and the channel that carries it. Channels are searched
//! in preference order by an explicit driver loop; [`advance`] holds the
//! transition logic and does no I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crosspack_core::{Channel, Output};
use reqwest::Client;
use tracing::{debug, info};

use crate::downloader::{DownloadError, Downloader};
use crate::index;
use crate::release::ReleaseSource;
use crate::version::{Version, VersionError};

/// Resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to fetch '{channel}' versions index: {source}")]
    Fetch {
        channel: Channel,
        #[source]
        source: DownloadError,
    },
    #[error("Malformed '{channel}' versions index: {source}")]
    MalformedIndex {
        channel: Channel,
        #[source]
        source: VersionError,
    },
    #[error("No available Crosswalk versions found")]
    NoVersions,
    #[error("Version {0} seems not to be available on the server")]
    NotAvailable(Version),
    #[error("Invalid Crosswalk version '{0}'")]
    InvalidSpec(String),
}

/// Final outcome of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { version: Version, channel: Channel },
    /// The channel has no versions to pick the latest from
    NotFound { channel: Channel },
    /// No channel carries the requested version
    Exhausted { version: Version },
}

impl Resolution {
    /// Found pair, or the matching error
    pub fn into_found(self) -> Result<(Version, Channel), ResolveError> {
        match self {
            Resolution::Found { version, channel } => Ok((version, channel)),
            Resolution::NotFound { .. } => Err(ResolveError::NoVersions),
            Resolution::Exhausted { version } => Err(ResolveError::NotAvailable(version)),
        }
    }
}

/// Search state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Searching(Channel),
    Done(Resolution),
}

/// One transition: given the index of `channel`, decide the next state
pub fn advance(
    target: Option<&Version>,
    channel: Channel,
    versions: &[String],
) -> Result<SearchState, ResolveError> {
    let Some(target) = target else {
        let latest = index::pick_latest(versions)
            .map_err(|source| ResolveError::MalformedIndex { channel, source })?;
        return Ok(SearchState::Done(match latest {
            Some(version) => Resolution::Found { version, channel },
            None => Resolution::NotFound { channel },
        }));
    };

    let wanted = target.to_string();
    if versions.iter().any(|v| *v == wanted) {
        return Ok(SearchState::Done(Resolution::Found {
            version: *target,
            channel,
        }));
    }

    Ok(match channel.next() {
        Some(next) => SearchState::Searching(next),
        None => SearchState::Done(Resolution::Exhausted { version: *target }),
    })
}

/// What the user asked for on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Channel(Channel),
    Version(Version),
    /// Local archive or unpacked release
    Path(PathBuf),
}

impl VersionSpec {
    /// Interpret `text`: an existing path wins over a channel name, which
    /// wins over a version number
    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        Self::parse_with(text, |path| path.exists())
    }

    pub fn parse_with<F>(text: &str, exists: F) -> Result<Self, ResolveError>
    where
        F: Fn(&Path) -> bool,
    {
        if exists(Path::new(text)) {
            return Ok(VersionSpec::Path(PathBuf::from(text)));
        }
        if let Ok(channel) = text.parse::<Channel>() {
            return Ok(VersionSpec::Channel(channel));
        }
        Version::parse(text)
            .map(VersionSpec::Version)
            .map_err(|_| ResolveError::InvalidSpec(text.to_string()))
    }
}

/// Channel index lookups against one release source
pub struct VersionResolver {
    client: Client,
    source: ReleaseSource,
    output: Arc<dyn Output>,
}

impl VersionResolver {
    pub fn new(client: Client, source: ReleaseSource, output: Arc<dyn Output>) -> Self {
        Self {
            client,
            source,
            output,
        }
    }

    /// Versions listed in one channel, in listing order
    pub async fn fetch_versions(&self, channel: Channel) -> Result<Vec<String>, ResolveError> {
        let url = self.source.index_url(channel);
        debug!("Fetching index {}", url);

        let label = format!("Fetching '{}' versions index", channel);
        let mut progress = self.output.create_finite_progress(&label);
        let page = Downloader::new(self.client.clone(), url)
            .get_text(progress.as_mut())
            .await;
        progress.done(None);

        let page = page.map_err(|source| ResolveError::Fetch { channel, source })?;
        Ok(index::parse(&page))
    }

    /// Search for `target`, or the latest version when `None`, starting
    /// at `channel` or the most preferred channel
    pub async fn resolve(
        &self,
        target: Option<&Version>,
        channel: Option<Channel>,
    ) -> Result<Resolution, ResolveError> {
        let version_name = target
            .map(|v| v.to_string())
            .unwrap_or_else(|| "latest version".to_string());

        let mut state = SearchState::Searching(channel.unwrap_or(Channel::ALL[0]));
        loop {
            let channel = match state {
                SearchState::Searching(channel) => channel,
                SearchState::Done(resolution) => {
                    if let Resolution::Found { version, channel } = &resolution {
                        info!("Found version '{}' in channel '{}'", version, channel);
                    }
                    return Ok(resolution);
                }
            };

            self.output.info(&format!(
                "Looking for {} in {}/{}",
                version_name,
                self.source.flavor().as_str(),
                channel
            ));

            let versions = self.fetch_versions(channel).await?;
            state = advance(target, channel, &versions)?;

            match &state {
                SearchState::Searching(_) => self.output.info(&format!(
                    "Version {} not found in '{}', trying next channel",
                    version_name, channel
                )),
                SearchState::Done(Resolution::Exhausted { .. }) => self.output.info(&format!(
                    "Version {} not found in '{}', search failed",
                    version_name, channel
                )),
                SearchState::Done(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::http_client;
    use crate::release::RuntimePlatform;
    use crosspack_core::output::MessageKind;
    use crosspack_core::{AppConfig, Flavor, MemoryOutput, WordSize};

    fn listing(versions: &[&str]) -> String {
        let mut page = String::from("<html><body><pre>\n");
        page.push_str(
            "<img src=\"/icons/back.gif\" alt=\"[PARENTDIR]\"> <a href=\"/crosswalk/\">Parent Directory</a>\n",
        );
        for version in versions {
            page.push_str(&format!(
                "<img src=\"/icons/folder.gif\" alt=\"[DIR]\"> <a href=\"{0}/\">{0}/</a>   2016-01-01 00:00    -\n",
                version
            ));
        }
        page.push_str("</pre></body></html>\n");
        page
    }

    fn resolver(server_url: &str, output: Arc<MemoryOutput>) -> VersionResolver {
        let source = ReleaseSource::new(
            server_url,
            Flavor::Crosswalk,
            RuntimePlatform::Android,
            WordSize::Bits32,
        );
        VersionResolver::new(http_client(&AppConfig::default()).unwrap(), source, output)
    }

    fn strings(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_advance_latest() {
        let state = advance(None, Channel::Beta, &strings(&["1.2.3.4", "7.6.5.4", "5.9.7.8"])).unwrap();
        assert_eq!(
            state,
            SearchState::Done(Resolution::Found {
                version: Version::new(7, 6, 5, 4),
                channel: Channel::Beta
            })
        );

        let state = advance(None, Channel::Stable, &[]).unwrap();
        assert_eq!(
            state,
            SearchState::Done(Resolution::NotFound {
                channel: Channel::Stable
            })
        );
    }

    #[test]
    fn test_advance_specific_version() {
        let target = Version::new(2, 0, 0, 0);
        let listed = strings(&["1.0.0.0"]);

        assert_eq!(
            advance(Some(&target), Channel::Stable, &listed).unwrap(),
            SearchState::Searching(Channel::Beta)
        );
        assert_eq!(
            advance(Some(&target), Channel::Canary, &listed).unwrap(),
            SearchState::Done(Resolution::Exhausted { version: target })
        );
    }

    #[test]
    fn test_advance_malformed_index() {
        let err = advance(None, Channel::Stable, &strings(&["1.2.3.4", "latest-ish"])).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedIndex { .. }));
    }

    #[test]
    fn test_version_spec() {
        let no_files = |_: &Path| false;
        assert_eq!(
            VersionSpec::parse_with("beta", no_files).unwrap(),
            VersionSpec::Channel(Channel::Beta)
        );
        assert_eq!(
            VersionSpec::parse_with("18.48.477.13", no_files).unwrap(),
            VersionSpec::Version(Version::new(18, 48, 477, 13))
        );
        assert!(matches!(
            VersionSpec::parse_with("18.48", no_files),
            Err(ResolveError::InvalidSpec(_))
        ));
        assert_eq!(
            VersionSpec::parse_with("stable", |_| true).unwrap(),
            VersionSpec::Path(PathBuf::from("stable"))
        );
    }

    #[tokio::test]
    async fn test_resolve_latest_in_channel() {
        let mut server = mockito::Server::new_async().await;
        let _canary = server
            .mock("GET", "/crosswalk/android/canary/")
            .with_status(200)
            .with_body(listing(&["19.49.514.0", "20.50.533.0", "20.50.530.0"]))
            .create_async()
            .await;

        let output = Arc::new(MemoryOutput::new());
        let resolution = resolver(&server.url(), output.clone())
            .resolve(None, Some(Channel::Canary))
            .await
            .unwrap();

        assert_eq!(
            resolution,
            Resolution::Found {
                version: Version::new(20, 50, 533, 0),
                channel: Channel::Canary
            }
        );
        assert!(output.contains(MessageKind::Info, "Looking for latest version in crosswalk/canary"));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_beta() {
        let mut server = mockito::Server::new_async().await;
        let stable = server
            .mock("GET", "/crosswalk/android/stable/")
            .with_status(200)
            .with_body(listing(&["17.46.448.10", "18.48.477.13"]))
            .expect(1)
            .create_async()
            .await;
        let beta = server
            .mock("GET", "/crosswalk/android/beta/")
            .with_status(200)
            .with_body(listing(&["19.49.514.5"]))
            .expect(1)
            .create_async()
            .await;
        let canary = server
            .mock("GET", "/crosswalk/android/canary/")
            .expect(0)
            .create_async()
            .await;

        let output = Arc::new(MemoryOutput::new());
        let target = Version::new(19, 49, 514, 5);
        let resolution = resolver(&server.url(), output.clone())
            .resolve(Some(&target), None)
            .await
            .unwrap();

        assert_eq!(
            resolution,
            Resolution::Found {
                version: target,
                channel: Channel::Beta
            }
        );
        assert!(output.contains(
            MessageKind::Info,
            "Version 19.49.514.5 not found in 'stable', trying next channel"
        ));
        stable.assert_async().await;
        beta.assert_async().await;
        canary.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for channel in ["stable", "beta", "canary"] {
            let mock = server
                .mock("GET", format!("/crosswalk/android/{}/", channel).as_str())
                .with_status(200)
                .with_body(listing(&["1.0.0.0"]))
                .expect(1)
                .create_async()
                .await;
            mocks.push(mock);
        }

        let output = Arc::new(MemoryOutput::new());
        let target = Version::new(0, 0, 0, 1);
        let resolution = resolver(&server.url(), output)
            .resolve(Some(&target), None)
            .await
            .unwrap();

        assert_eq!(resolution, Resolution::Exhausted { version: target });
        let err = resolution.into_found().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Version 0.0.0.1 seems not to be available on the server"
        );
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _stable = server
            .mock("GET", "/crosswalk/android/stable/")
            .with_status(503)
            .create_async()
            .await;
        let beta = server
            .mock("GET", "/crosswalk/android/beta/")
            .with_status(200)
            .with_body(listing(&["19.49.514.5"]))
            .expect(0)
            .create_async()
            .await;

        let output = Arc::new(MemoryOutput::new());
        let target = Version::new(19, 49, 514, 5);
        let err = resolver(&server.url(), output)
            .resolve(Some(&target), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Fetch {
                channel: Channel::Stable,
                source: DownloadError::HttpStatus(503)
            }
        ));
        beta.assert_async().await;
    }
}
