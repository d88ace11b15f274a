// Caller identity extraction - handlers that take a CallerIdentity argument
// are bearer-protected; the extractor verifies the Authorization header
// against the application's token service

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::tokens::TokenService;
use super::CallerIdentity;

/// Trait for application state that can verify bearer tokens
pub trait HasTokenVerifier {
    fn token_service(&self) -> &TokenService;
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: HasTokenVerifier + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let identity = state.token_service().verify(token)?;

        let request_id = format!("req-{}", Uuid::new_v4());
        tracing::debug!(
            request_id = %request_id,
            account_id = identity.account_id,
            "Authenticated request"
        );

        Ok(identity)
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))
}
