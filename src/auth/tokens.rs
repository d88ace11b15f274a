use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::{AccountKind, EntityId};
use crate::error::{AppError, AppResult};

use super::CallerIdentity;

/// Bearer token claims: account id in `sub` plus the identity attributes the
/// services need without a store round trip
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub kind: AccountKind,
    pub iat: u64,
    pub exp: u64,
}

/// Issues and verifies signed bearer tokens (HS256)
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, account_id: EntityId, email: &str, kind: AccountKind) -> AppResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            kind,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> AppResult<CallerIdentity> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid or expired token: {}", e)))?;

        let claims = token_data.claims;
        let account_id = claims
            .sub
            .parse::<EntityId>()
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;

        Ok(CallerIdentity {
            account_id,
            email: claims.email,
            kind: claims.kind,
        })
    }
}
