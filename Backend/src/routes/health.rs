use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::models::dto::HealthResponse;

#[get("/health")]
pub async fn health_check(db: web::Data<DatabaseConnection>) -> HttpResponse {
    let (status, database) = match db.ping().await {
        Ok(()) => ("ok", "up"),
        Err(_) => ("degraded", "down"),
    };

    HttpResponse::Ok().json(HealthResponse {
        status,
        database,
        time: Utc::now(),
    })
}
