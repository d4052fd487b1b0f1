use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

// Pas d'expiration: le token reste valide tant que le secret ne change pas
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,  // user_id
    pub iat: i64, // émis à (timestamp)
}

/// Génère un JWT token signé (HS256) pour un utilisateur
pub fn generate_token(user_id: i32, secret: &str) -> Result<String, String> {
    let claims = Claims {
        id: user_id,
        iat: Utc::now().timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie et décode un JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}
