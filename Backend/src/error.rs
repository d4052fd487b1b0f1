// Erreurs HTTP de l'API
//
// Chaque route retourne ApiResult<T>; la conversion en réponse JSON
// { "error": message } se fait ici, au bord de l'application.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

const INTERNAL_MESSAGE: &str = "Une erreur est survenue sur le serveur";
const DUPLICATE_MESSAGE: &str = "Valeur déjà utilisée";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Identifiants invalides")]
    InvalidCredentials,

    #[error("Veuillez vous authentifier.")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Accès non autorisé".to_string())
    }

    pub fn not_owner() -> Self {
        Self::Forbidden("Non autorisé".to_string())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        // Contrainte d'unicité (email, nom d'ingrédient) = erreur de validation
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            warn!(%detail, "unique constraint violation");
            return Self::Validation(DUPLICATE_MESSAGE.to_string());
        }
        Self::Internal(format!("Database error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        match self {
            Self::Internal(cause) => {
                error!(error = %cause, "internal error");
                // Le détail n'est exposé qu'en build de développement
                if cfg!(debug_assertions) {
                    builder.json(serde_json::json!({
                        "error": INTERNAL_MESSAGE,
                        "details": cause
                    }))
                } else {
                    builder.json(serde_json::json!({ "error": INTERNAL_MESSAGE }))
                }
            }
            other => builder.json(serde_json::json!({ "error": other.to_string() })),
        }
    }
}
