use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::users::{self, Entity as Users};
use crate::utils::jwt;

/// Utilisateur authentifié (rechargé depuis la BD) + token brut
/// Utilisé comme extracteur dans les routes protégées
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: users::Model,
    pub token: String,
}

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.user.id
    }

    /// Refuse l'accès (403) si l'utilisateur n'est pas admin
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

/// Implémentation de FromRequest pour AuthUser
/// Vérifie le Bearer token, charge l'utilisateur, met à jour last_login
impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { authenticate(&req).await })
    }
}

/// Extrait le token d'un header "Bearer <token>"
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let db = req
        .app_data::<web::Data<DatabaseConnection>>()
        .ok_or_else(|| ApiError::internal("Database connection not configured"))?;
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| ApiError::internal("Configuration not registered"))?;

    // 1. Extraire le token
    let token = bearer_token(req).ok_or(ApiError::Unauthenticated)?;

    // 2. Vérifier la signature
    let claims = jwt::verify_token(token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "rejected bearer token");
        ApiError::Unauthenticated
    })?;

    // 3. Charger l'utilisateur
    let mut user = Users::find_by_id(claims.id)
        .one(db.get_ref())
        .await?
        .ok_or_else(|| {
            debug!(user_id = claims.id, "token refers to unknown user");
            ApiError::Unauthenticated
        })?;

    // 4. Mise à jour du last_login (colonne seule, sans toucher updated_at)
    let now = Utc::now();
    Users::update_many()
        .col_expr(users::Column::LastLogin, Expr::value(now))
        .filter(users::Column::Id.eq(user.id))
        .exec(db.get_ref())
        .await?;
    user.last_login = Some(now);

    Ok(AuthUser {
        user,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use sea_orm::{ActiveModelTrait, Set};

    use crate::test_support::{test_config, test_db, TEST_SECRET};

    async fn extract(db: DatabaseConnection, authorization: Option<String>) -> Result<AuthUser, ApiError> {
        let dir = tempfile::tempdir().unwrap();
        let mut request = TestRequest::default()
            .app_data(web::Data::new(db))
            .app_data(web::Data::new(test_config(dir.path().into())));
        if let Some(value) = authorization {
            request = request.insert_header(("Authorization", value));
        }
        AuthUser::extract(&request.to_http_request()).await
    }

    #[actix_web::test]
    async fn test_extractor_keeps_user_and_raw_token() {
        let db = test_db().await;
        let user = users::ActiveModel {
            name: Set("Alice".to_string()),
            email: Set("alice@example.com".to_string()),
            password: Set("secret1".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let token = jwt::generate_token(user.id, TEST_SECRET).unwrap();

        let auth_user = extract(db, Some(format!("Bearer {}", token))).await.unwrap();
        assert_eq!(auth_user.id(), user.id);
        assert_eq!(auth_user.token, token);
        assert!(auth_user.user.last_login.is_some());
        assert!(auth_user.require_admin().is_err());
    }

    #[actix_web::test]
    async fn test_extractor_rejects_missing_or_unknown_user() {
        let missing = extract(test_db().await, None).await;
        assert!(matches!(missing, Err(ApiError::Unauthenticated)));

        let orphan = jwt::generate_token(42, TEST_SECRET).unwrap();
        let unknown = extract(test_db().await, Some(format!("Bearer {}", orphan))).await;
        assert!(matches!(unknown, Err(ApiError::Unauthenticated)));
    }
}
