pub mod auth;
pub mod categories;
pub mod health;
pub mod recipes;
pub mod search;
pub mod stats;
pub mod upload;

use actix_web::{web, HttpRequest};

use crate::config::AppConfig;
use crate::error::ApiError;

pub fn configure_routes(cfg: &mut web::ServiceConfig, config: &AppConfig) {
    cfg.service(
        web::scope("/api")
            // Payload JSON / query string invalides → 400 { error }
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(recipes::recipes_routes)
            .configure(categories::categories_routes)
            .configure(search::search_routes)
            .configure(stats::stats_routes)
            .configure(|cfg| upload::upload_routes(cfg, config))
    );
}

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(err.to_string()).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(err.to_string()).into()
}

fn path_error(_err: actix_web::error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation("Identifiant invalide").into()
}
