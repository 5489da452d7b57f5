use crate::services::batch_downloader::{DownloadOutcome, DownloadRequestError, ResolveError};
use crate::services::transcode::{find_preset, DEFAULT_PRESET_NAME};
use crate::services::BatchDownloader;
use actix_web::web::{Data, Json};
use actix_web::HttpResponse;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadRequest {
    link: Option<String>,
    quality: Option<String>,
}

pub(crate) async fn download(
    downloader: Data<Arc<BatchDownloader>>,
    body: Json<DownloadRequest>,
) -> HttpResponse {
    let link = match body.link.as_deref().filter(|link| !link.is_empty()) {
        Some(link) => link,
        None => {
            return HttpResponse::BadRequest().json(json!({ "error": "Link is required" }));
        }
    };

    // Preset validation happens before any resolution or external call.
    let preset_name = body.quality.as_deref().unwrap_or(DEFAULT_PRESET_NAME);
    let preset = match find_preset(preset_name) {
        Some(preset) => preset,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": format!("Unknown quality preset: {}", preset_name) }));
        }
    };

    match downloader.handle_request(link, preset).await {
        Ok(DownloadOutcome::Single {
            filename,
            download_url,
            track,
        }) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Download completed",
            "filename": filename,
            "downloadUrl": download_url,
            "trackInfo": track,
            "type": "single",
        })),
        Ok(DownloadOutcome::Batch {
            job_id,
            collection_info,
            total_tracks,
        }) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Starting download of {} tracks", total_tracks),
            "jobId": job_id,
            "collectionInfo": collection_info,
            "totalTracks": total_tracks,
            "type": "batch",
        })),
        Err(error) => error_response(error),
    }
}

fn error_response(error: DownloadRequestError) -> HttpResponse {
    match &error {
        DownloadRequestError::Resolve(ResolveError::InvalidLink(_)) => {
            HttpResponse::BadRequest().json(json!({ "error": "Invalid catalog URL" }))
        }
        DownloadRequestError::NoTracks | DownloadRequestError::NoMatchFound => {
            HttpResponse::NotFound().json(json!({ "error": error.to_string() }))
        }
        _ => {
            error!(?error, "Download request failed");
            HttpResponse::InternalServerError().json(json!({ "error": error.to_string() }))
        }
    }
}
