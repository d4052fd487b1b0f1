mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;
#[cfg(test)]
mod test_support;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        std::io::Error::other(e)
    })?;

    info!("connecting to database");
    let db = db::establish_connection(&config)
        .await
        .map_err(std::io::Error::other)?;
    db::sync_schema(&db).await.map_err(|e| {
        error!(error = %e, "schema synchronization failed");
        std::io::Error::other(e)
    })?;

    let bind = (config.host.clone(), config.port);
    info!(host = %bind.0, port = bind.1, "starting server");

    let db = web::Data::new(db);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .configure(|cfg| routes::configure_routes(cfg, &config))
    })
        .bind(bind)?
        .run()
        .await
}
