use crate::config::Config;
use crate::services::spotify_client::start_token_refresh;
use crate::services::{
    BatchDownloader, CoverArtFetcher, InMemoryJobStore, JobStore, SpotifyClient,
    TranscodePipeline, YtDlpSearcher,
};
use actix_rt::signal::unix;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use futures_lite::FutureExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod http;
mod services;
mod types;
mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let mut terminate = unix::signal(unix::SignalKind::terminate())?;
    let mut interrupt = unix::signal(unix::SignalKind::interrupt())?;

    dotenv::dotenv().ok();
    env_logger::init();

    let config = Arc::new(Config::from_env());

    info!("Starting application...");

    tokio::fs::create_dir_all(&config.downloads_directory).await?;

    let spotify_client = Arc::new(
        SpotifyClient::create(&config.spotify.client_id, &config.spotify.client_secret)
            .await
            .expect("Unable to initialize Spotify client"),
    );
    start_token_refresh(Arc::clone(&spotify_client));

    let job_store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let pipeline = Arc::new(TranscodePipeline::new(CoverArtFetcher::new(
        config.cover_art(),
    )));

    let batch_downloader = Arc::new(BatchDownloader::new(
        spotify_client,
        Arc::new(YtDlpSearcher),
        pipeline,
        Arc::clone(&job_store),
        PathBuf::from(&config.downloads_directory),
    ));

    let shutdown_timeout = config.shutdown_timeout;
    let bind_address = config.bind_address.clone();
    let downloads_directory = config.downloads_directory.clone();

    let server = HttpServer::new({
        let config = Arc::clone(&config);
        move || {
            App::new()
                .app_data(Data::new(Arc::clone(&batch_downloader)))
                .app_data(Data::new(Arc::clone(&job_store)))
                .app_data(Data::new(Arc::clone(&config)))
                .service(web::resource("/download").route(web::post().to(http::download)))
                .service(
                    web::resource("/progress/{job_id}").route(web::get().to(http::get_progress)),
                )
                .service(
                    web::resource("/download-zip/{job_id}")
                        .route(web::get().to(http::download_zip)),
                )
                .service(
                    web::resource("/downloads-list").route(web::get().to(http::downloads_list)),
                )
                .service(web::resource("/config").route(web::get().to(http::get_config)))
                .service(web::resource("/health").route(web::get().to(http::health_check)))
                .service(actix_files::Files::new("/downloads", &downloads_directory))
        }
    })
    .shutdown_timeout(shutdown_timeout)
    .bind(bind_address)?
    .run();

    let server_handle = server.handle();

    actix_rt::spawn({
        async move {
            if let Err(error) = server.await {
                error!(?error, "Error on http server");
            }
        }
    });

    info!("Application started");

    interrupt.recv().or(terminate.recv()).await;

    info!("Received shutdown signal. Shutting down gracefully...");

    server_handle.stop(true).await;

    Ok(())
}
