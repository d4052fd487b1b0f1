use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::services::stats_service::StatsService;

/// GET /api/stats - Statistiques globales (ADMIN)
#[get("")]
pub async fn global_stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    auth_user.require_admin()?;
    Ok(HttpResponse::Ok().json(StatsService::global_stats(db.get_ref()).await?))
}

/// GET /api/stats/personal - Statistiques de l'utilisateur connecté
#[get("/personal")]
pub async fn personal_stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let stats = StatsService::personal_stats(db.get_ref(), auth_user.id()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub fn stats_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stats")
            .service(global_stats)
            .service(personal_stats)
    );
}
