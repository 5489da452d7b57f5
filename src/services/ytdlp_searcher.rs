use crate::services::batch_downloader::{MediaSearcher, SearchError};
use crate::types::MediaRef;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchHit {
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Locates one best-effort media source by running a `ytsearch1:` query
/// through yt-dlp. Exactly one candidate is requested; there is no ranking
/// or retry across results.
pub(crate) struct YtDlpSearcher;

#[async_trait]
impl MediaSearcher for YtDlpSearcher {
    async fn locate(&self, query: &str) -> Result<Option<MediaRef>, SearchError> {
        let output = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--flat-playlist")
            .arg(format!("ytsearch1:{}", query))
            .output()
            .await
            .map_err(SearchError::Launch)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                "yt-dlp search failed".to_string()
            } else {
                stderr
            };
            return Err(SearchError::Failed(message));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();

        // An empty result set exits successfully with no output.
        if trimmed.is_empty() {
            return Ok(None);
        }

        let hit = serde_json::from_str::<SearchHit>(trimmed)?;

        debug!(query, title = ?hit.title, "Search finished");

        Ok(hit.url.map(MediaRef))
    }
}
