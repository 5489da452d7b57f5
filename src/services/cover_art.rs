use crate::config::CoverArtConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CoverArtError {
    #[error("Artwork request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Artwork responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Artwork exceeds the configured size limit")]
    TooLarge,
    #[error("Artwork fetch timed out")]
    TimedOut,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Downloads cover images with a hard size cap and wall-clock timeout.
/// Every failure removes whatever partial file was written; callers treat
/// all errors as "no artwork".
pub(crate) struct CoverArtFetcher {
    client: reqwest::Client,
    config: CoverArtConfig,
}

impl CoverArtFetcher {
    pub(crate) fn new(config: CoverArtConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub(crate) async fn fetch(
        &self,
        art_url: Option<&str>,
        destination: &Path,
    ) -> Result<Option<PathBuf>, CoverArtError> {
        if !self.config.enabled {
            return Ok(None);
        }

        let url = match art_url {
            Some(url) => url,
            None => return Ok(None),
        };

        let deadline = Duration::from_millis(self.config.timeout_ms);

        let result = match tokio::time::timeout(deadline, self.fetch_inner(url, destination)).await
        {
            Ok(result) => result,
            Err(_) => Err(CoverArtError::TimedOut),
        };

        if result.is_err() {
            Self::remove_partial(destination).await;
        }

        result.map(|_| Some(destination.to_path_buf()))
    }

    async fn fetch_inner(&self, url: &str, destination: &Path) -> Result<(), CoverArtError> {
        let mut response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CoverArtError::Status(response.status()));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.config.max_bytes {
                return Err(CoverArtError::TooLarge);
            }
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            written += chunk.len() as u64;
            if written > self.config.max_bytes {
                return Err(CoverArtError::TooLarge);
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        debug!(url, bytes = written, "Cover art downloaded");

        Ok(())
    }

    async fn remove_partial(destination: &Path) {
        let _ = tokio::fs::remove_file(destination).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{CoverArtError, CoverArtFetcher};
    use crate::config::CoverArtConfig;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config(enabled: bool) -> CoverArtConfig {
        CoverArtConfig {
            enabled,
            max_bytes: 1024,
            timeout_ms: 1000,
        }
    }

    /// Serves one HTTP response on a local port and returns its URL.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        actix_rt::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/cover.jpg", addr)
    }

    async fn fresh_destination(name: &str) -> PathBuf {
        let destination = std::env::temp_dir().join(format!("{}.artwork", name));
        let _ = tokio::fs::remove_file(&destination).await;
        destination
    }

    #[actix_rt::test]
    async fn should_yield_no_artwork_when_disabled() {
        let fetcher = CoverArtFetcher::new(config(false));

        let result = fetcher
            .fetch(
                Some("http://example.invalid/cover.jpg"),
                std::env::temp_dir().join("disabled.artwork").as_path(),
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[actix_rt::test]
    async fn should_yield_no_artwork_when_url_is_absent() {
        let fetcher = CoverArtFetcher::new(config(true));

        let result = fetcher
            .fetch(None, std::env::temp_dir().join("absent.artwork").as_path())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[actix_rt::test]
    async fn should_abort_on_declared_length_exceeding_the_cap() {
        let body = vec![0u8; 5000];
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(&body);

        let url = serve_once(response).await;
        let destination = fresh_destination("declared-overage").await;
        let fetcher = CoverArtFetcher::new(config(true));

        let result = fetcher.fetch(Some(&url), &destination).await;

        assert!(matches!(result, Err(CoverArtError::TooLarge)));
        assert!(!destination.exists());
    }

    #[actix_rt::test]
    async fn should_abort_streamed_overage_and_delete_the_partial_file() {
        // No Content-Length, so the cap can only trip while streaming.
        let body = vec![0u8; 5000];
        let mut response =
            b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(&body);

        let url = serve_once(response).await;
        let destination = fresh_destination("streamed-overage").await;
        let fetcher = CoverArtFetcher::new(config(true));

        let result = fetcher.fetch(Some(&url), &destination).await;

        assert!(matches!(result, Err(CoverArtError::TooLarge)));
        assert!(!destination.exists());
    }

    #[actix_rt::test]
    async fn should_fail_and_leave_no_file_for_unreachable_host() {
        let destination = std::env::temp_dir().join("unreachable.artwork");
        let fetcher = CoverArtFetcher::new(config(true));

        let result = fetcher
            .fetch(Some("http://127.0.0.1:1/cover.jpg"), &destination)
            .await;

        assert!(result.is_err());
        assert!(!destination.exists());
    }
}
