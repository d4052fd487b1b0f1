use actix_web::{get, patch, post, web, HttpResponse};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::users::{self, ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users};
use crate::services::stats_service::StatsService;
use crate::utils::{jwt, password};

// DTO pour l'inscription (isAdmin n'est pas accepté)
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub name: String,
    #[validate(email(message = "Email invalide"))]
    pub email: String,
    #[validate(length(min = 6, message = "Le mot de passe doit faire au moins 6 caractères"))]
    pub password: String,
    pub avatar: Option<String>,
}

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// DTO pour la mise à jour du profil: seuls ces champs sont modifiables,
// tout autre champ (isAdmin, is_active...) est refusé
#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub name: Option<String>,
    #[validate(email(message = "Email invalide"))]
    pub email: Option<String>,
    pub avatar: Option<String>,
    #[validate(length(min = 6, message = "Le mot de passe doit faire au moins 6 caractères"))]
    pub password: Option<String>,
}

// Réponse après login/register
#[derive(Serialize)]
pub struct AuthResponse {
    pub user: users::Model,
    pub token: String,
}

async fn email_taken(
    db: &DatabaseConnection,
    email: &str,
    except_user: Option<i32>,
) -> ApiResult<bool> {
    let mut query = Users::find().filter(UserColumn::Email.eq(email));
    if let Some(id) = except_user {
        query = query.filter(UserColumn::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// POST /auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    body.validate()?;
    let email = body.email.trim().to_string();

    // 1. Vérifier si l'email est déjà utilisé
    if email_taken(db.get_ref(), &email, None).await? {
        return Err(ApiError::validation("Cet email est déjà utilisé"));
    }

    // 2. Créer l'utilisateur (le mot de passe est hashé dans before_save)
    let user = UserActiveModel {
        name: Set(body.name.trim().to_string()),
        email: Set(email),
        password: Set(body.password),
        avatar: Set(body.avatar),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    // 3. Générer le JWT
    let token = jwt::generate_token(user.id, &config.jwt_secret).map_err(ApiError::Internal)?;

    info!(user_id = user.id, "user registered");
    Ok(HttpResponse::Created().json(AuthResponse { user, token }))
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> ApiResult<HttpResponse> {
    // 1. Trouver l'utilisateur
    let user = Users::find()
        .filter(UserColumn::Email.eq(body.email.trim()))
        .one(db.get_ref())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // 2. Vérifier le mot de passe (hash stocké illisible = identifiants invalides)
    let is_valid = password::verify_password(&body.password, &user.password).unwrap_or(false);
    if !is_valid {
        return Err(ApiError::InvalidCredentials);
    }

    // 3. Mise à jour du last_login
    let mut active_model: UserActiveModel = user.into();
    active_model.last_login = Set(Some(chrono::Utc::now()));
    let user = active_model.update(db.get_ref()).await?;

    // 4. Générer le JWT
    let token = jwt::generate_token(user.id, &config.jwt_secret).map_err(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(AuthResponse { user, token }))
}

/// GET /auth/profile - Profil de l'utilisateur connecté (PROTÉGÉE)
#[get("/profile")]
pub async fn profile(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth_user.user)
}

/// PATCH /auth/profile - Mise à jour du profil (PROTÉGÉE)
#[patch("/profile")]
pub async fn update_profile(
    auth_user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    body.validate()?;

    let user_id = auth_user.id();
    let mut active_model: UserActiveModel = auth_user.user.into();

    if let Some(name) = body.name {
        active_model.name = Set(name.trim().to_string());
    }
    if let Some(email) = body.email {
        let email = email.trim().to_string();
        if email_taken(db.get_ref(), &email, Some(user_id)).await? {
            return Err(ApiError::validation("Cet email est déjà utilisé"));
        }
        active_model.email = Set(email);
    }
    if let Some(avatar) = body.avatar {
        active_model.avatar = Set(Some(avatar));
    }
    if let Some(new_password) = body.password {
        // Re-hashé par before_save
        active_model.password = Set(new_password);
    }

    let user = active_model.update(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /auth/stats - Statistiques des utilisateurs (ADMIN)
#[get("/stats")]
pub async fn user_stats(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> ApiResult<HttpResponse> {
    auth_user.require_admin()?;

    let stats = StatsService::user_stats(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(profile)
            .service(update_profile)
            .service(user_stats)
    );
}
