use serde::Serialize;

/// Opaque identifier of a batch download job. Ids are timestamp-derived and
/// strictly increasing within one process (see `job_store::next_job_id`).
#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize)]
pub(crate) struct JobId(pub(crate) String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Fetchable locator for raw audio, resolved from a text search.
#[derive(Eq, PartialEq, Clone, Debug, Serialize)]
pub(crate) struct MediaRef(pub(crate) String);

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable result of catalog metadata resolution for one track.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub(crate) struct TrackDescriptor {
    pub(crate) title: String,
    /// Joined display string of one or more performers.
    pub(crate) artist: String,
    pub(crate) album: String,
    /// 4-digit release year, possibly empty.
    pub(crate) year: String,
    pub(crate) track_number: Option<u32>,
    pub(crate) duration_ms: u64,
    pub(crate) isrc: Option<String>,
    pub(crate) preview_url: Option<String>,
    #[serde(rename = "spotify_url")]
    pub(crate) source_url: String,
    pub(crate) art_url: Option<String>,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CollectionKind {
    Track,
    Playlist,
    Album,
}

/// Describes the container a batch of tracks came from.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub(crate) struct CollectionInfo {
    #[serde(rename = "type")]
    pub(crate) kind: CollectionKind,
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) total_tracks: Option<usize>,
}

/// A successfully produced output file, as exposed to pollers.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub(crate) struct DownloadedFile {
    pub(crate) filename: String,
    #[serde(rename = "downloadUrl")]
    pub(crate) download_url: String,
    pub(crate) track: TrackDescriptor,
}
