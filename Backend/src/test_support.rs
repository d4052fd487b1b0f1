// Outils de test partagés: BD SQLite en mémoire + application complète

use std::path::PathBuf;

use actix_http::Request;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{test, web, App};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::db;
use crate::models::users;
use crate::routes;

pub const TEST_SECRET: &str = "test-secret";

/// Une seule connexion: chaque connexion SQLite :memory: a sa propre base
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.expect("sqlite connection");
    db::sync_schema(&db).await.expect("schema sync");
    db
}

pub fn test_config(upload_dir: PathBuf) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        upload_dir,
        upload_url_prefix: "/uploads".to_string(),
        upload_max_bytes: 1024,
    }
}

pub fn test_app(
    db: DatabaseConnection,
    config: AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .configure(|cfg| routes::configure_routes(cfg, &config))
        .app_data(web::Data::new(db))
        .app_data(web::Data::new(config))
}

/// Inscrit un utilisateur et retourne (user JSON, token)
pub async fn register<S>(app: &S, name: &str, email: &str, password: &str) -> (Value, String)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, request).await;

    let token = body["token"].as_str().expect("token in response").to_string();
    (body["user"].clone(), token)
}

pub async fn make_admin(db: &DatabaseConnection, user_id: i64) {
    users::Entity::update_many()
        .col_expr(users::Column::IsAdmin, Expr::value(true))
        .filter(users::Column::Id.eq(user_id as i32))
        .exec(db)
        .await
        .expect("promote admin");
}

/// POST /api/recipes, vérifie le 201 et retourne la recette JSON
pub async fn create_recipe<S>(app: &S, token: &str, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri("/api/recipes")
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    let response = test::call_service(app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
    test::read_body_json(response).await
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn recipe_payload(title: &str, duration: i32) -> Value {
    json!({
        "title": title,
        "description": format!("Description de {}", title),
        "duration": duration,
    })
}
