mod config;
mod download;
mod health;
mod library;
mod progress;

pub(crate) use config::get_config;
pub(crate) use download::download;
pub(crate) use health::health_check;
pub(crate) use library::downloads_list;
pub(crate) use progress::{download_zip, get_progress};
