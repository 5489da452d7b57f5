pub(crate) mod batch_downloader;
pub(crate) mod cover_art;
pub(crate) mod job_store;
pub(crate) mod spotify_client;
pub(crate) mod transcode;
pub(crate) mod ytdlp_searcher;

pub(crate) use batch_downloader::BatchDownloader;
pub(crate) use cover_art::CoverArtFetcher;
pub(crate) use job_store::{InMemoryJobStore, JobStore};
pub(crate) use spotify_client::SpotifyClient;
pub(crate) use transcode::TranscodePipeline;
pub(crate) use ytdlp_searcher::YtDlpSearcher;
