use crate::services::batch_downloader::resolver::{resolve_link, ResolveError};
use crate::services::batch_downloader::traits::{
    CatalogProvider, MediaSearcher, PipelineError, SearchError, TrackPipeline,
};
use crate::services::job_store::{JobStore, TrackOutcome};
use crate::services::transcode::QualityPreset;
use crate::types::{CollectionInfo, DownloadedFile, JobId, TrackDescriptor};
use crate::utils::sanitize_for_filesystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const MAX_FILENAME_LENGTH: usize = 120;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DownloadRequestError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("No tracks found")]
    NoTracks,
    #[error("Could not find a matching source for the track")]
    NoMatchFound,
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What the caller gets back from a download request: a finished file for a
/// single track, or a registered job id for a batch whose sweep has been
/// spawned in the background.
#[derive(Debug)]
pub(crate) enum DownloadOutcome {
    Single {
        filename: String,
        download_url: String,
        track: TrackDescriptor,
    },
    Batch {
        job_id: JobId,
        collection_info: CollectionInfo,
        total_tracks: usize,
    },
}

#[derive(Debug, thiserror::Error)]
enum TrackError {
    #[error("No matching source found")]
    NoMatch,
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Drives resolve → search → transcode per track. Batch sweeps isolate
/// per-track failures; a failed track is recorded and the sweep moves on.
pub(crate) struct BatchDownloader {
    catalog: Arc<dyn CatalogProvider>,
    searcher: Arc<dyn MediaSearcher>,
    pipeline: Arc<dyn TrackPipeline>,
    job_store: Arc<dyn JobStore>,
    downloads_dir: PathBuf,
}

impl BatchDownloader {
    pub(crate) fn new(
        catalog: Arc<dyn CatalogProvider>,
        searcher: Arc<dyn MediaSearcher>,
        pipeline: Arc<dyn TrackPipeline>,
        job_store: Arc<dyn JobStore>,
        downloads_dir: PathBuf,
    ) -> Self {
        Self {
            catalog,
            searcher,
            pipeline,
            job_store,
            downloads_dir,
        }
    }

    pub(crate) async fn handle_request(
        self: &Arc<Self>,
        link: &str,
        preset: &'static QualityPreset,
    ) -> Result<DownloadOutcome, DownloadRequestError> {
        let resolved = resolve_link(self.catalog.as_ref(), link).await?;

        if resolved.tracks.is_empty() {
            return Err(DownloadRequestError::NoTracks);
        }

        if resolved.tracks.len() == 1 {
            let track = resolved.tracks.into_iter().next().unwrap();
            return self.download_single(track, preset).await;
        }

        let total = resolved.tracks.len();
        let job_id = self
            .job_store
            .create_job(total, resolved.collection_info.clone())
            .await;

        info!(%job_id, total, collection = resolved.collection_info.name, "Batch job registered");

        self.spawn_sweep(job_id.clone(), resolved.tracks, preset);

        Ok(DownloadOutcome::Batch {
            job_id,
            collection_info: resolved.collection_info.clone(),
            total_tracks: total,
        })
    }

    async fn download_single(
        self: &Arc<Self>,
        track: TrackDescriptor,
        preset: &'static QualityPreset,
    ) -> Result<DownloadOutcome, DownloadRequestError> {
        let query = format!("{} {}", track.artist, track.title);
        let media = self
            .searcher
            .locate(&query)
            .await?
            .ok_or(DownloadRequestError::NoMatchFound)?;

        let stem = sanitize_for_filesystem(
            &format!("{} - {}", track.artist, track.title),
            MAX_FILENAME_LENGTH,
        );
        let filename = format!("{}.{}", stem, preset.format);

        tokio::fs::create_dir_all(&self.downloads_dir).await?;

        let output_path = self.downloads_dir.join(&filename);
        self.pipeline
            .produce(&media, &track, preset, &output_path)
            .await?;

        info!(filename, "Single track produced");

        Ok(DownloadOutcome::Single {
            download_url: format!("/downloads/{}", filename),
            filename,
            track,
        })
    }

    /// The handler returns as soon as the sweep is spawned; a watcher task
    /// awaits the join handle so a panicked sweep still stamps the job.
    fn spawn_sweep(
        self: &Arc<Self>,
        job_id: JobId,
        tracks: Vec<TrackDescriptor>,
        preset: &'static QualityPreset,
    ) {
        let handle = actix_rt::spawn(Arc::clone(self).run_sweep(
            job_id.clone(),
            tracks,
            preset,
        ));

        actix_rt::spawn({
            let job_store = Arc::clone(&self.job_store);
            async move {
                if let Err(join_error) = handle.await {
                    error!(%job_id, ?join_error, "Batch sweep crashed");
                    if let Err(error) = job_store
                        .set_status(&job_id, "Failed: internal error")
                        .await
                    {
                        error!(%job_id, ?error, "Unable to mark crashed job");
                    }
                }
            }
        });
    }

    async fn run_sweep(
        self: Arc<Self>,
        job_id: JobId,
        tracks: Vec<TrackDescriptor>,
        preset: &'static QualityPreset,
    ) {
        let total = tracks.len();

        let folder = {
            let collection_name = self
                .job_store
                .get_job(&job_id)
                .await
                .map(|job| job.collection_info.name)
                .unwrap_or_else(|| job_id.to_string());

            let folder = sanitize_for_filesystem(&collection_name, MAX_FILENAME_LENGTH);
            if folder.is_empty() {
                job_id.to_string()
            } else {
                folder
            }
        };
        let target_dir = self.downloads_dir.join(&folder);

        if let Err(error) = tokio::fs::create_dir_all(&target_dir).await {
            error!(%job_id, ?error, "Unable to create batch target directory");
            let _ = self
                .job_store
                .set_status(&job_id, "Failed: internal error")
                .await;
            return;
        }

        for (index, track) in tracks.into_iter().enumerate() {
            let status = format!(
                "Downloading track {}/{}: {}",
                index + 1,
                total,
                track.title
            );
            if let Err(error) = self.job_store.set_status(&job_id, &status).await {
                error!(%job_id, ?error, "Unable to update job status");
            }

            match self
                .process_track(&track, index + 1, preset, &target_dir, &folder)
                .await
            {
                Ok(file) => {
                    if let Err(error) = self
                        .job_store
                        .record_attempt(&job_id, track, TrackOutcome::Completed, Some(file))
                        .await
                    {
                        error!(%job_id, ?error, "Unable to record completed track");
                    }
                }
                Err(track_error) => {
                    warn!(
                        %job_id,
                        title = track.title,
                        artist = track.artist,
                        ?track_error,
                        "Track failed, continuing with the rest of the batch"
                    );
                    if let Err(error) = self
                        .job_store
                        .record_attempt(&job_id, track, TrackOutcome::Failed, None)
                        .await
                    {
                        error!(%job_id, ?error, "Unable to record failed track");
                    }
                }
            }
        }

        let failed = self
            .job_store
            .get_job(&job_id)
            .await
            .map(|job| job.failed)
            .unwrap_or_default();

        let final_status = if failed > 0 {
            format!("Completed with {} failures", failed)
        } else {
            "All downloads completed successfully".to_string()
        };

        if let Err(error) = self.job_store.set_status(&job_id, &final_status).await {
            error!(%job_id, ?error, "Unable to set final job status");
        }

        info!(%job_id, failed, "Batch sweep finished");
    }

    async fn process_track(
        &self,
        track: &TrackDescriptor,
        position: usize,
        preset: &'static QualityPreset,
        target_dir: &Path,
        folder: &str,
    ) -> Result<DownloadedFile, TrackError> {
        let query = format!("{} {}", track.artist, track.title);
        let media = self
            .searcher
            .locate(&query)
            .await?
            .ok_or(TrackError::NoMatch)?;

        let stem = sanitize_for_filesystem(
            &format!("{:02} - {} - {}", position, track.artist, track.title),
            MAX_FILENAME_LENGTH,
        );
        let filename = format!("{}.{}", stem, preset.format);
        let output_path = target_dir.join(&filename);

        self.pipeline
            .produce(&media, track, preset, &output_path)
            .await?;

        Ok(DownloadedFile {
            download_url: format!("/downloads/{}/{}", folder, filename),
            filename,
            track: track.clone(),
        })
    }
}
