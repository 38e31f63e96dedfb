mod config;
mod db;
mod error;
mod ingest;
mod schema;
mod services;

use crate::config::Config;
use crate::db::Database;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let database = Database::new(&config.database_path);
    database.initialize().map_err(io::Error::other)?;
    info!("Using database {}", database.path().display());

    let url = config.url();
    let bind = (config.host.clone(), config.port);
    let payload_limit = config.payload_limit;
    let config = web::Data::new(config);
    let database = web::Data::new(database);

    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .wrap(services::sheets::cors_headers())
            .wrap(Logger::default())
            .app_data(web::PayloadConfig::default().limit(payload_limit))
            .app_data(config.clone())
            .app_data(database.clone())
            .service(services::sheets::configure_routes())
    })
        .bind(bind)?
        .run()
        .await
}
