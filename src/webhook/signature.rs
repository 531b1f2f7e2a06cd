use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Check a delivery body against its `X-Hub-Signature-256` header (`sha256=<hex>`).
pub fn verify_signature(secret: &str, payload: &[u8], signature_header: &str) -> Result<()> {
    let Some(signature_hex) = signature_header.trim().strip_prefix("sha256=") else {
        return Err(AppError::WebhookVerification(
            "Missing sha256= prefix".to_string(),
        ));
    };

    let expected = hex::decode(signature_hex)
        .map_err(|e| AppError::WebhookVerification(format!("Invalid hex in signature: {e}")))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::WebhookVerification(format!("Invalid HMAC key: {e}")))?;
    mac.update(payload);

    // constant-time comparison
    mac.verify_slice(&expected)
        .map_err(|_| AppError::WebhookVerification("Signature mismatch".to_string()))
}
