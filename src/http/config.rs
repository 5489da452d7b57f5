use crate::config::Config;
use crate::services::transcode::preset_summaries;
use actix_web::web::Data;
use actix_web::HttpResponse;
use serde_json::json;
use std::sync::Arc;

pub(crate) async fn get_config(config: Data<Arc<Config>>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "config": {
            "enableCoverArt": config.enable_cover_art,
            "maxCoverArtSize": config.max_cover_art_size,
            "coverArtTimeout": config.cover_art_timeout,
            "supportedFormats": preset_summaries(),
            "version": crate::VERSION,
        },
    }))
}
