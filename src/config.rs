use serde::Deserialize;

fn default_bind_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_downloads_directory() -> String {
    "downloads".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30u64
}

fn default_enable_cover_art() -> bool {
    true
}

fn default_max_cover_art_size() -> u64 {
    10 * 1024 * 1024
}

fn default_cover_art_timeout() -> u64 {
    30_000u64
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SpotifyCredentials {
    #[serde(rename = "spotify_client_id")]
    pub(crate) client_id: String,
    #[serde(rename = "spotify_client_secret")]
    pub(crate) client_secret: String,
}

/// Settings handed to the cover-art fetcher.
#[derive(Clone, Debug)]
pub(crate) struct CoverArtConfig {
    pub(crate) enabled: bool,
    pub(crate) max_bytes: u64,
    pub(crate) timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_bind_address")]
    pub(crate) bind_address: String,
    #[serde(default = "default_downloads_directory")]
    pub(crate) downloads_directory: String,
    #[serde(default = "default_shutdown_timeout")]
    pub(crate) shutdown_timeout: u64,
    #[serde(default = "default_enable_cover_art")]
    pub(crate) enable_cover_art: bool,
    #[serde(default = "default_max_cover_art_size")]
    pub(crate) max_cover_art_size: u64,
    #[serde(default = "default_cover_art_timeout")]
    pub(crate) cover_art_timeout: u64,
    #[serde(flatten)]
    pub(crate) spotify: SpotifyCredentials,
}

impl Config {
    pub(crate) fn from_env() -> Self {
        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(error) => panic!("Missing environment variable: {:#?}", error),
        }
    }

    pub(crate) fn cover_art(&self) -> CoverArtConfig {
        CoverArtConfig {
            enabled: self.enable_cover_art,
            max_bytes: self.max_cover_art_size,
            timeout_ms: self.cover_art_timeout,
        }
    }
}
