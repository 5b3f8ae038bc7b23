//! Password hashing and signed session tokens.
//!
//! Tokens are `base64url(claims_json) "." hex(sha256(payload || secret))`.
//! The signature covers the encoded payload exactly as transmitted, so a
//! token is verified without re-serializing anything.

use crate::config::AuthConfig;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SALT_BYTES: usize = 16;
const SECRET_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided; sign in first")]
    MissingToken,
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    BadSignature,
    #[error("Token has expired; sign in again")]
    Expired,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token secret unavailable: {0}")]
    Secret(String),
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `salt$hex(sha256(salt || password))` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = to_hex(&salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", salt, digest)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    constant_time_eq(salted_digest(salt, password).as_bytes(), digest.as_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
}

/// Issues and checks tokens with one shared secret.
#[derive(Clone)]
pub struct TokenGate {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGate")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenGate {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Use the configured secret, or one persisted at `secret_path`
    /// (generated on first use, owner-only permissions on Unix).
    pub fn from_config(config: &AuthConfig, secret_path: &Path) -> Result<Self, AuthError> {
        let ttl = Duration::hours(config.token_ttl_hours);
        match config.token_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Ok(Self::new(secret.as_bytes().to_vec(), ttl)),
            None => Ok(Self::new(load_or_create_secret(secret_path)?, ttl)),
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(&self.secret);
        format!("{:x}", hasher.finalize())
    }

    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        self.issue_at(user_id, email, Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: &str, email: &str, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            exp: now + self.ttl.num_seconds(),
        };
        let json = serde_json::to_vec(&claims).map_err(|_| AuthError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload);
        Ok(format!("{}.{}", payload, signature))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        if !constant_time_eq(self.sign(payload).as_bytes(), signature.as_bytes()) {
            return Err(AuthError::BadSignature);
        }
        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// The user id a token asserts, or `None` if it does not check out.
    pub fn verify(&self, token: &str) -> Option<String> {
        match self.decode(token) {
            Ok(claims) => Some(claims.user_id),
            Err(e) => {
                debug!(error = %e, "Token rejected");
                None
            }
        }
    }
}

/// `~/.config/nexus/token_secret` (Unix) or `%APPDATA%\nexus\token_secret`.
pub fn default_secret_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nexus")
        .join("token_secret")
}

fn load_or_create_secret(path: &Path) -> Result<Vec<u8>, AuthError> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.as_bytes().to_vec());
        }
    }

    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let secret = to_hex(&bytes);

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| AuthError::Secret(e.to_string()))?;
    }
    std::fs::write(path, &secret).map_err(|e| AuthError::Secret(e.to_string()))?;

    // Owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .map_err(|e| AuthError::Secret(format!("chmod: {}", e)))?;
    }

    info!(path = %path.display(), "Generated token secret");
    Ok(secret.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> TokenGate {
        TokenGate::new("test-secret", Duration::days(7))
    }

    #[test]
    fn password_hash_round_trip() {
        let stored = hash_password("hunter22");
        let (salt, digest) = stored.split_once('$').unwrap();
        assert_eq!(salt.len(), SALT_BYTES * 2);
        assert_eq!(digest.len(), 64);
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
        assert!(!verify_password("hunter22", "no-separator"));
        assert_ne!(hash_password("hunter22"), stored);
    }

    #[test]
    fn token_round_trip() {
        let gate = gate();
        let token = gate.issue("user-1", "a@example.com").unwrap();
        let claims = gate.decode(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(gate.verify(&token), Some("user-1".to_string()));
    }

    #[test]
    fn tampered_and_foreign_tokens_are_rejected() {
        let gate = gate();
        let token = gate.issue("user-1", "a@example.com").unwrap();
        let (payload, signature) = token.split_once('.').unwrap();

        let forged_claims = Claims {
            user_id: "admin".into(),
            email: "a@example.com".into(),
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}", forged_payload, signature);
        assert!(matches!(gate.decode(&forged), Err(AuthError::BadSignature)));
        assert_eq!(gate.verify(&forged), None);

        let other = TokenGate::new("other-secret", Duration::days(7));
        assert_eq!(other.verify(&token), None);

        assert!(matches!(gate.decode(payload), Err(AuthError::Malformed)));
        assert!(matches!(gate.decode("  "), Err(AuthError::MissingToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let gate = gate();
        let issued_at = 1_700_000_000;
        let token = gate.issue_at("user-1", "a@example.com", issued_at).unwrap();
        assert!(gate.decode_at(&token, issued_at + 60).is_ok());
        assert!(matches!(
            gate.decode_at(&token, issued_at + Duration::days(8).num_seconds()),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn secret_is_generated_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexus").join("token_secret");
        let config = AuthConfig::default();

        let first = TokenGate::from_config(&config, &path).unwrap();
        let token = first.issue("u", "e@x.io").unwrap();
        let second = TokenGate::from_config(&config, &path).unwrap();
        assert_eq!(second.verify(&token), Some("u".to_string()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
