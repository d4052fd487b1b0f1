use std::path::Path;

use actix_multipart::form::{tempfile::TempFile, MultipartForm, MultipartFormConfig};
use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;

/// Formulaire multipart: un seul fichier sous le champ "image"
#[derive(MultipartForm)]
#[multipart(duplicate_field = "deny")]
pub struct ImageUploadForm {
    image: Option<TempFile>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/upload/image - Stocke une image et retourne son URL (PROTÉGÉE)
#[post("/image")]
pub async fn upload_image(
    auth_user: AuthUser,
    MultipartForm(form): MultipartForm<ImageUploadForm>,
    config: web::Data<AppConfig>,
) -> ApiResult<HttpResponse> {
    let image = form
        .image
        .ok_or_else(|| ApiError::validation("Aucun fichier uploadé"))?;

    if image.size > config.upload_max_bytes {
        return Err(ApiError::validation(format!(
            "Fichier trop volumineux (max {} octets)",
            config.upload_max_bytes
        )));
    }

    // Nom généré côté serveur: uuid + extension d'origine si elle est sûre
    let file_name = match image.file_name.as_deref().and_then(safe_extension) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {}", e)))?;

    let destination = config.upload_dir.join(&file_name);
    tokio::fs::copy(image.file.path(), &destination)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {}", e)))?;

    info!(user_id = auth_user.id(), file = %file_name, size = image.size, "image uploaded");

    Ok(HttpResponse::Ok().json(UploadResponse {
        url: format!("{}/{}", config.upload_url_prefix, file_name),
    }))
}

/// Extension en minuscules, alphanumérique et courte, sinon None
fn safe_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
}

fn multipart_error(err: actix_multipart::MultipartError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("Formulaire invalide: {}", err)).into()
}

// Le corps multipart est borné à upload_max_bytes pendant la lecture
pub fn upload_routes(cfg: &mut web::ServiceConfig, config: &AppConfig) {
    cfg.service(
        web::scope("/upload")
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(config.upload_max_bytes)
                    .error_handler(multipart_error),
            )
            .service(upload_image)
    );
}
