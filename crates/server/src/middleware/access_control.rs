use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use deployment::Deployment;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RequestId;
use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authorization header")]
    MissingAuthorization,
    #[error("Invalid token")]
    InvalidToken,
}

/// Claims carried by partner tokens. `id` is the partner id; `exp` is optional.
#[derive(Debug, Serialize, Deserialize)]
pub struct PartnerClaims {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Identity of the caller, inserted into request extensions by [`require_partner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartnerContext {
    pub partner_id: i64,
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // tokens from the partner login carry no exp; it is still checked when present
    validation.required_spec_claims.clear();
    validation
}

/// Verifies the `Authorization` header and returns the partner it identifies.
///
/// The token is the second space-separated segment of the header. The scheme
/// word in front of it is not inspected.
pub fn authorize(header: Option<&HeaderValue>, secret: &str) -> Result<PartnerContext, AuthError> {
    let header = header.ok_or(AuthError::MissingAuthorization)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.split(' ').nth(1))
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)?;

    let token_data = decode::<PartnerClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AuthError::InvalidToken
    })?;

    Ok(PartnerContext {
        partner_id: token_data.claims.id,
    })
}

/// Signs a partner token the way the partner login does.
pub fn issue_token(
    secret: &str,
    partner_id: i64,
    expires_at: Option<u64>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = PartnerClaims {
        id: partner_id,
        iat: Some(get_current_timestamp()),
        exp: expires_at,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Middleware guarding every partner route.
pub async fn require_partner(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = authorize(
        req.headers().get(AUTHORIZATION),
        &deployment.config().jwt_secret,
    )
    .inspect_err(|e| {
        let request_id = req.extensions().get::<RequestId>().map(RequestId::as_str);
        tracing::info!(request_id, uri = %req.uri(), "Rejected partner request: {}", e);
    })?;

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
