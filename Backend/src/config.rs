// Configuration de l'application
//
// Chargée une seule fois au démarrage puis partagée en lecture seule
// (web::Data<AppConfig>) avec le middleware d'auth et les routes.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPLOAD_DIR: &str = "public/uploads";
const DEFAULT_UPLOAD_URL_PREFIX: &str = "/uploads";
const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub upload_url_prefix: String,
    pub upload_max_bytes: usize,
}

impl AppConfig {
    /// Lit le fichier .env (s'il existe) puis les variables d'environnement
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de lookup clé → valeur
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;

        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));
        let upload_url_prefix = lookup("UPLOAD_URL_PREFIX")
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_UPLOAD_URL_PREFIX.to_string());
        let upload_max_bytes =
            parse_or("UPLOAD_MAX_BYTES", lookup("UPLOAD_MAX_BYTES"), DEFAULT_UPLOAD_MAX_BYTES)?;

        Ok(Self {
            database_url,
            jwt_secret,
            host,
            port,
            upload_dir,
            upload_url_prefix,
            upload_max_bytes,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
