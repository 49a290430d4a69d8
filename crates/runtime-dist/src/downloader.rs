//! HTTP Downloader
//!
//! Streams one URL into a writer while reporting progress. A
//! [`Downloader`] is consumed by [`Downloader::get`], so it can only ever
//! perform a single transfer.

use std::time::Duration;

use crosspack_core::{AppConfig, FiniteProgress};
use futures::StreamExt;
use reqwest::{Client, Proxy, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Progress reported while the total size is unknown
const UNKNOWN_LENGTH_PROGRESS: f64 = 0.5;

/// Download error types
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Download failed: HTTP Status {0}")]
    HttpStatus(u16),
    #[error("Proxy URL is missing protocol portion (http: and https: are supported): {0}")]
    InvalidProxy(String),
}

fn checked_proxy(url: &str) -> Result<&str, DownloadError> {
    if url.starts_with("http:") || url.starts_with("https:") {
        Ok(url)
    } else {
        Err(DownloadError::InvalidProxy(url.to_string()))
    }
}

/// Build the HTTP client used for index and archive requests.
///
/// Proxies come from the resolved configuration only; the client does not
/// read the environment by itself.
pub fn http_client(config: &AppConfig) -> Result<Client, DownloadError> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .no_proxy();

    if let Some(proxy) = config.http_proxy.as_deref() {
        debug!("Using HTTP proxy {}", proxy);
        builder = builder.proxy(Proxy::http(checked_proxy(proxy)?)?);
    }
    if let Some(proxy) = config.https_proxy.as_deref() {
        debug!("Using HTTPS proxy {}", proxy);
        builder = builder.proxy(Proxy::https(checked_proxy(proxy)?)?);
    }

    Ok(builder.build()?)
}

/// Single-use streaming GET
pub struct Downloader {
    client: Client,
    url: String,
}

impl Downloader {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the URL into `sink`, returning the number of bytes written.
    ///
    /// Progress is `received / content-length`, or a constant midpoint
    /// while the length is unknown, and always ends at 1.0 on success.
    pub async fn get<W>(
        self,
        sink: &mut W,
        progress: &mut dyn FiniteProgress,
    ) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        debug!("GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::HttpStatus(response.status().as_u16()));
        }

        let total_size = response.content_length().filter(|len| *len > 0);
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            match total_size {
                Some(total) => progress.update(downloaded as f64 / total as f64),
                None => progress.update(UNKNOWN_LENGTH_PROGRESS),
            }
        }

        sink.flush().await?;
        progress.update(1.0);

        info!("Downloaded {} bytes from {}", downloaded, self.url);
        Ok(downloaded)
    }

    /// Fetch the URL as text, used for index pages
    pub async fn get_text(self, progress: &mut dyn FiniteProgress) -> Result<String, DownloadError> {
        let mut buffer: Vec<u8> = Vec::new();
        self.get(&mut buffer, progress).await?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspack_core::{MemoryOutput, Output};

    fn client() -> Client {
        http_client(&AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_get_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/file.zip")
            .with_status(200)
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;

        let output = MemoryOutput::new();
        let mut progress = output.create_finite_progress("Downloading");
        let mut sink: Vec<u8> = Vec::new();

        let downloader = Downloader::new(client(), format!("{}/file.zip", server.url()));
        let written = downloader.get(&mut sink, progress.as_mut()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(written, 4096);
        assert_eq!(sink.len(), 4096);

        let fractions = output.fractions();
        assert_eq!(fractions.last(), Some(&1.0));
        assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .create_async()
            .await;

        let output = MemoryOutput::new();
        let mut progress = output.create_finite_progress("Downloading");
        let mut sink: Vec<u8> = Vec::new();

        let downloader = Downloader::new(client(), format!("{}/missing.zip", server.url()));
        let err = downloader.get(&mut sink, progress.as_mut()).await.unwrap_err();

        assert!(matches!(err, DownloadError::HttpStatus(404)));
        assert_eq!(err.to_string(), "Download failed: HTTP Status 404");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_proxy_requires_scheme() {
        let mut config = AppConfig::default();
        config.http_proxy = Some("proxy.example.com:3128".into());
        assert!(matches!(http_client(&config), Err(DownloadError::InvalidProxy(_))));

        config.http_proxy = Some("http://proxy.example.com:3128".into());
        config.https_proxy = Some("http://proxy.example.com:3128".into());
        assert!(http_client(&config).is_ok());
    }
}
