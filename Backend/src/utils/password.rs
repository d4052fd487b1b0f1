use base64::{Engine, engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD}};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[cfg(not(test))]
const ITERATIONS: u32 = 260000;
// Les tests hashent beaucoup de mots de passe en build debug
#[cfg(test)]
const ITERATIONS: u32 = 1000;

const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;
const PREFIX: &str = "pbkdf2:sha256:";

/// Hash un mot de passe au format Werkzeug
/// PBKDF2-HMAC-SHA256, salt aléatoire de 16 bytes
/// Format: pbkdf2:sha256:iterations$salt$hash
pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill(&mut salt);

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, ITERATIONS, &mut key)
        .map_err(|e| format!("PBKDF2 hash generation failed: {}", e))?;

    Ok(format!(
        "{}{}${}${}",
        PREFIX,
        ITERATIONS,
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(key)
    ))
}

/// Vérifie un mot de passe contre un hash stocké (comparaison à sens unique)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let (header, rest) = stored_hash
        .split_once('$')
        .ok_or_else(|| "Invalid hash format".to_string())?;
    let (salt_str, hash_str) = rest
        .split_once('$')
        .ok_or_else(|| "Invalid hash format".to_string())?;

    let iterations = header
        .strip_prefix(PREFIX)
        .ok_or_else(|| "Invalid header".to_string())?
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;

    let salt = decode_b64(salt_str)?;
    let expected_hash = decode_b64(hash_str)?;

    let mut computed = vec![0u8; expected_hash.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| format!("PBKDF2 hash verification failed: {}", e))?;

    Ok(constant_time_eq(&computed, &expected_hash))
}

// Décode le base64 URL-safe (format actuel) ou standard (anciens hashs)
fn decode_b64(input: &str) -> Result<Vec<u8>, String> {
    URL_SAFE_NO_PAD
        .decode(input)
        .or_else(|_| STANDARD.decode(input))
        .map_err(|_| "Failed to decode".to_string())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
