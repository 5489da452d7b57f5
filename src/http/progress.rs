use crate::services::JobStore;
use crate::types::JobId;
use actix_web::web::{Data, Path};
use actix_web::HttpResponse;
use serde_json::json;
use std::sync::Arc;

pub(crate) async fn get_progress(
    job_store: Data<Arc<dyn JobStore>>,
    path: Path<String>,
) -> HttpResponse {
    let job_id = JobId(path.into_inner());

    match job_store.get_job(&job_id).await {
        Some(job) => HttpResponse::Ok().json(json!({
            "jobId": job.id,
            "status": job.status,
            "total": job.total,
            "completed": job.completed,
            "failed": job.failed,
            "progress": job.progress_percent(),
            "downloadedFiles": job.downloaded_files,
            "collectionInfo": job.collection_info,
        })),
        None => HttpResponse::NotFound().json(json!({ "error": "Job not found" })),
    }
}

/// No real archive is produced; the endpoint reports the files that would
/// go into one.
pub(crate) async fn download_zip(
    job_store: Data<Arc<dyn JobStore>>,
    path: Path<String>,
) -> HttpResponse {
    let job_id = JobId(path.into_inner());

    match job_store.get_job(&job_id).await {
        Some(job) if !job.downloaded_files.is_empty() => HttpResponse::Ok().json(json!({
            "message": "Batch download ready",
            "files": job.downloaded_files,
        })),
        _ => HttpResponse::NotFound().json(json!({ "error": "No files to download" })),
    }
}
