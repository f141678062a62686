use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use services::{
    jobs::{create_job, delete_job, get_job, list_jobs, update_job},
    uploads::serve_upload,
};

use crate::{config::Settings, state::AppState};

pub mod response;
mod services;
pub mod upload;

/// Registers the job API under `/api` and uploaded assets under `/uploads`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(list_jobs)
            .service(get_job)
            .service(create_job)
            .service(update_job)
            .service(delete_job),
    )
    .service(serve_upload);
}

pub async fn start_http(state: web::Data<AppState>, settings: &Settings) -> anyhow::Result<()> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .configure(configure)
    });
    let addr = settings.listen_addr();
    info!("http server listening on {}", addr);
    server.bind(addr)?.run().await?;
    Ok(())
}
