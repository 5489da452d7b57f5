use crate::services::batch_downloader::{
    AlbumTracks, CatalogError, CatalogProvider, PlaylistMeta,
};
use crate::types::TrackDescriptor;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Tokens are typically valid for an hour; refreshing every 50 minutes
/// keeps a safe margin.
const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
    width: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbumRef {
    name: String,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
struct ApiExternalIds {
    isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    name: String,
    artists: Vec<ApiArtist>,
    album: ApiAlbumRef,
    track_number: Option<u32>,
    duration_ms: u64,
    external_ids: Option<ApiExternalIds>,
    preview_url: Option<String>,
    external_urls: Option<ApiExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistTracksField {
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    name: String,
    tracks: ApiPlaylistTracksField,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistItem {
    track: Option<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylistPage {
    items: Vec<ApiPlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbumTrack {
    name: String,
    artists: Vec<ApiArtist>,
    track_number: Option<u32>,
    duration_ms: u64,
    preview_url: Option<String>,
    external_urls: Option<ApiExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbumTracksField {
    items: Vec<ApiAlbumTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    name: String,
    artists: Vec<ApiArtist>,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<ApiImage>,
    tracks: ApiAlbumTracksField,
}

fn join_artists(artists: &[ApiArtist]) -> String {
    artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn leading_year(release_date: Option<&str>) -> String {
    release_date
        .and_then(|date| date.split('-').next())
        .unwrap_or_default()
        .to_string()
}

fn largest_image(images: &[ApiImage]) -> Option<String> {
    images
        .iter()
        .max_by_key(|image| image.width.unwrap_or(0))
        .map(|image| image.url.clone())
}

fn descriptor_from_track(track: ApiTrack) -> TrackDescriptor {
    TrackDescriptor {
        title: track.name,
        artist: join_artists(&track.artists),
        album: track.album.name.clone(),
        year: leading_year(track.album.release_date.as_deref()),
        track_number: track.track_number,
        duration_ms: track.duration_ms,
        isrc: track.external_ids.and_then(|ids| ids.isrc),
        preview_url: track.preview_url,
        source_url: track
            .external_urls
            .and_then(|urls| urls.spotify)
            .unwrap_or_default(),
        art_url: largest_image(&track.album.images),
    }
}

/// Spotify Web API client with a client-credentials token kept fresh by a
/// background task (see `start_token_refresh`).
pub(crate) struct SpotifyClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    access_token: RwLock<String>,
}

impl SpotifyClient {
    pub(crate) async fn create(
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, CatalogError> {
        let client = Self {
            http: reqwest::Client::new(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            access_token: RwLock::new(String::new()),
        };

        client.refresh_access_token().await?;

        Ok(client)
    }

    pub(crate) async fn refresh_access_token(&self) -> Result<(), CatalogError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::UnexpectedResponse(format!(
                "token endpoint responded with status {}",
                response.status()
            )));
        }

        let token = response.json::<TokenResponse>().await?;

        *self.access_token.write().await = token.access_token;

        info!("Catalog access token obtained");

        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let token = self.access_token.read().await.clone();

        let response = self
            .http
            .get(format!("{}{}", API_BASE, path))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::UnexpectedResponse(format!(
                "{} responded with status {}",
                path,
                response.status()
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CatalogProvider for SpotifyClient {
    async fn get_track(&self, track_id: &str) -> Result<TrackDescriptor, CatalogError> {
        let track = self.get_json::<ApiTrack>(&format!("/tracks/{}", track_id)).await?;

        Ok(descriptor_from_track(track))
    }

    async fn get_playlist_meta(&self, playlist_id: &str) -> Result<PlaylistMeta, CatalogError> {
        let playlist = self
            .get_json::<ApiPlaylist>(&format!(
                "/playlists/{}?fields=name,tracks.total",
                playlist_id
            ))
            .await?;

        Ok(PlaylistMeta {
            name: playlist.name,
            total_tracks: playlist.tracks.total,
        })
    }

    async fn get_playlist_page(
        &self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Option<TrackDescriptor>>, CatalogError> {
        let page = self
            .get_json::<ApiPlaylistPage>(&format!(
                "/playlists/{}/tracks?offset={}&limit={}",
                playlist_id, offset, limit
            ))
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|item| item.track.map(descriptor_from_track))
            .collect())
    }

    async fn get_album(&self, album_id: &str) -> Result<AlbumTracks, CatalogError> {
        let album = self.get_json::<ApiAlbum>(&format!("/albums/{}", album_id)).await?;

        let album_artist = join_artists(&album.artists);
        let year = leading_year(album.release_date.as_deref());
        let art_url = largest_image(&album.images);

        let tracks = album
            .tracks
            .items
            .into_iter()
            .map(|track| TrackDescriptor {
                title: track.name,
                artist: join_artists(&track.artists),
                album: album.name.clone(),
                year: year.clone(),
                track_number: track.track_number,
                duration_ms: track.duration_ms,
                isrc: None,
                preview_url: track.preview_url,
                source_url: track
                    .external_urls
                    .and_then(|urls| urls.spotify)
                    .unwrap_or_default(),
                art_url: art_url.clone(),
            })
            .collect();

        Ok(AlbumTracks {
            name: album.name,
            artist: album_artist,
            tracks,
        })
    }
}

/// Keeps the client-credentials token fresh for the process lifetime.
pub(crate) fn start_token_refresh(client: Arc<SpotifyClient>) {
    actix_rt::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_REFRESH_INTERVAL);
        interval.tick().await;

        loop {
            interval.tick().await;

            if let Err(error) = client.refresh_access_token().await {
                error!(?error, "Unable to refresh catalog access token");
            }
        }
    });
}
