mod config;
mod http;
mod job;
mod state;
mod store;

use std::sync::Arc;

use actix_web::web;
use config::Settings;
use env_logger::Env;
use http::start_http;
use log::{error, info};
use state::AppState;
use store::DocumentStore;
use tokio::fs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("jobboard=info,actix_web=info"))
        .init();
    info!("starting jobboard");

    let settings = Settings::from_env()?;
    info!(
        "uploads go to {} (max {} bytes per logo)",
        settings.upload_dir.display(),
        settings.max_logo_bytes
    );

    fs::create_dir_all(&settings.upload_dir).await?;

    let store = Arc::new(DocumentStore::connect(settings.store_path.clone()).await?);
    let state = web::Data::new(AppState::new(store.clone(), settings.upload_config()));

    let served = start_http(state, &settings).await;

    if let Err(e) = store.disconnect().await {
        error!("failed to flush document store on shutdown: {}", e);
    }
    served
}
