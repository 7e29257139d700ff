use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use poolie_core::identity::{bearer_token, AuthError, CallerIdentity, TokenVerifier};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id of the caller.
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

// ============================================================================
// HS256 verifier
// ============================================================================

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(CallerIdentity {
            user_id: token_data.claims.sub,
        })
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from Authorization header
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidHeader)?),
        None => None,
    };
    let token = bearer_token(header_value)?.to_string();

    // 2. Resolve the caller
    let caller = state.verifier.verify(&token).await?;

    // 3. Caller must be a known account
    let known = state
        .users
        .get_user(&caller.user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if known.is_none() {
        tracing::debug!("Token subject {} has no account", caller.user_id);
        return Err(AppError::Unauthorized("Unknown user".to_string()));
    }

    // 4. Inject identity for handlers
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
