use crate::services::batch_downloader::traits::{CatalogError, CatalogProvider};
use crate::types::{CollectionInfo, CollectionKind, TrackDescriptor};
use tracing::debug;

pub(crate) const PLAYLIST_PAGE_SIZE: usize = 50;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ResolveError {
    #[error("Link is not a recognized catalog URL: {0}")]
    InvalidLink(String),
    #[error("Unable to fetch catalog metadata: {0}")]
    Fetch(#[from] CatalogError),
}

/// A parsed catalog link: `.../track/<id>`, `.../playlist/<id>` or
/// `.../album/<id>` with an opaque alphanumeric id.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum CatalogLink {
    Track(String),
    Playlist(String),
    Album(String),
}

impl CatalogLink {
    pub(crate) fn parse(link: &str) -> Option<Self> {
        let rest = link.split_once("spotify.com/")?.1;
        let (kind, rest) = rest.split_once('/')?;

        let id = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>();

        if id.is_empty() {
            return None;
        }

        match kind {
            "track" => Some(CatalogLink::Track(id)),
            "playlist" => Some(CatalogLink::Playlist(id)),
            "album" => Some(CatalogLink::Album(id)),
            _ => None,
        }
    }
}

/// Everything a batch needs to start: the container description and the
/// track descriptors in provider order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResolvedBatch {
    pub(crate) collection_info: CollectionInfo,
    pub(crate) tracks: Vec<TrackDescriptor>,
}

/// Resolves a catalog link into track descriptors. Playlists are fetched
/// page by page; entries whose track reference is gone are skipped without
/// error, while any failed page fails the whole resolution.
pub(crate) async fn resolve_link(
    catalog: &dyn CatalogProvider,
    link: &str,
) -> Result<ResolvedBatch, ResolveError> {
    let parsed =
        CatalogLink::parse(link).ok_or_else(|| ResolveError::InvalidLink(link.to_string()))?;

    match parsed {
        CatalogLink::Track(id) => {
            let track = catalog.get_track(&id).await?;

            Ok(ResolvedBatch {
                collection_info: CollectionInfo {
                    kind: CollectionKind::Track,
                    name: track.title.clone(),
                    artist: None,
                    total_tracks: None,
                },
                tracks: vec![track],
            })
        }
        CatalogLink::Playlist(id) => {
            let meta = catalog.get_playlist_meta(&id).await?;

            let mut tracks = Vec::with_capacity(meta.total_tracks);
            let mut offset = 0;

            while offset < meta.total_tracks {
                let page = catalog
                    .get_playlist_page(&id, offset, PLAYLIST_PAGE_SIZE)
                    .await?;

                tracks.extend(page.into_iter().flatten());

                offset += PLAYLIST_PAGE_SIZE;
            }

            debug!(playlist = meta.name, tracks = tracks.len(), "Playlist resolved");

            Ok(ResolvedBatch {
                collection_info: CollectionInfo {
                    kind: CollectionKind::Playlist,
                    name: meta.name,
                    artist: None,
                    total_tracks: Some(tracks.len()),
                },
                tracks,
            })
        }
        CatalogLink::Album(id) => {
            let album = catalog.get_album(&id).await?;

            Ok(ResolvedBatch {
                collection_info: CollectionInfo {
                    kind: CollectionKind::Album,
                    name: album.name,
                    artist: Some(album.artist),
                    total_tracks: Some(album.tracks.len()),
                },
                tracks: album.tracks,
            })
        }
    }
}

#[cfg(test)]
mod link_tests {
    use super::CatalogLink;

    #[test]
    fn should_parse_track_playlist_and_album_links() {
        assert_eq!(
            CatalogLink::parse("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
            Some(CatalogLink::Track("4uLU6hMCjMI75M1A2tKUQC".into()))
        );
        assert_eq!(
            CatalogLink::parse("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"),
            Some(CatalogLink::Playlist("37i9dQZF1DXcBWIGoYBM5M".into()))
        );
        assert_eq!(
            CatalogLink::parse("https://open.spotify.com/album/4m2880jivSbbyEGAKfITCa"),
            Some(CatalogLink::Album("4m2880jivSbbyEGAKfITCa".into()))
        );
    }

    #[test]
    fn should_ignore_query_parameters_after_the_id() {
        assert_eq!(
            CatalogLink::parse("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc123"),
            Some(CatalogLink::Track("4uLU6hMCjMI75M1A2tKUQC".into()))
        );
    }

    #[test]
    fn should_reject_unrecognized_links() {
        assert_eq!(CatalogLink::parse("https://example.com/track/abc"), None);
        assert_eq!(CatalogLink::parse("https://open.spotify.com/artist/abc"), None);
        assert_eq!(CatalogLink::parse("https://open.spotify.com/track/"), None);
        assert_eq!(CatalogLink::parse("not a link at all"), None);
    }
}
