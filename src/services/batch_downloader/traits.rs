use crate::services::transcode::QualityPreset;
use crate::types::{MediaRef, TrackDescriptor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub(crate) enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected catalog response: {0}")]
    UnexpectedResponse(String),
}

/// Playlist/album container metadata, fetched before the tracks themselves.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PlaylistMeta {
    pub(crate) name: String,
    pub(crate) total_tracks: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AlbumTracks {
    pub(crate) name: String,
    pub(crate) artist: String,
    pub(crate) tracks: Vec<TrackDescriptor>,
}

/// Read access to the third-party catalog. Playlist tracks are paginated;
/// a page entry is `None` when the underlying track is deleted/unavailable.
#[async_trait]
pub(crate) trait CatalogProvider: Send + Sync {
    async fn get_track(&self, track_id: &str) -> Result<TrackDescriptor, CatalogError>;
    async fn get_playlist_meta(&self, playlist_id: &str) -> Result<PlaylistMeta, CatalogError>;
    async fn get_playlist_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Option<TrackDescriptor>>, CatalogError>;
    async fn get_album(&self, album_id: &str) -> Result<AlbumTracks, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SearchError {
    #[error("Unable to launch search process: {0}")]
    Launch(std::io::Error),
    #[error("Search process failed: {0}")]
    Failed(String),
    #[error("Unable to parse search output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

/// Resolves a free-text query to at most one fetchable media reference.
/// Zero results is `Ok(None)`, not an error.
#[async_trait]
pub(crate) trait MediaSearcher: Send + Sync {
    async fn locate(&self, query: &str) -> Result<Option<MediaRef>, SearchError>;
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    #[error("Download process failed: {0}")]
    DownloadFailed(String),
    #[error("Downloaded file not found under the expected temporary name")]
    DownloadedFileNotFound,
    #[error("Transcoding failed: {0}")]
    TranscodeFailed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns a raw media reference into a finished, tagged audio file at
/// `output_path`. Cover-art handling happens inside the pipeline and never
/// fails the track.
#[async_trait]
pub(crate) trait TrackPipeline: Send + Sync {
    async fn produce(
        &self,
        media: &MediaRef,
        track: &TrackDescriptor,
        preset: &QualityPreset,
        output_path: &Path,
    ) -> Result<PathBuf, PipelineError>;
}
