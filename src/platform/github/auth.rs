use std::path::Path;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// GitHub App identity used to mint installation tokens.
pub struct AppKey {
    app_id: u64,
    key: EncodingKey,
}

impl AppKey {
    pub fn load(app_id: u64, private_key_path: &Path) -> Result<Self> {
        let pem = std::fs::read(private_key_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read GitHub App private key at {}: {e}",
                private_key_path.display()
            ))
        })?;

        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| AppError::Config(format!("Invalid RSA private key: {e}")))?;

        Ok(Self { app_id, key })
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Short-lived app JWT, backdated a minute for clock drift.
    pub fn jwt(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AppClaims {
            iat: now - 60,
            exp: now + 9 * 60,
            iss: self.app_id.to_string(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AppError::Config(format!("Failed to sign app JWT: {e}")))
    }
}
