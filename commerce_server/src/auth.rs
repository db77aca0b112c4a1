//! JWT claims extraction.
//!
//! Tokens are issued by the external auth service with a shared HS256 secret; this server only validates them and
//! reads out the user id and roles. [`JwtClaims`] is an actix extractor, so any handler that names it in its
//! signature is authenticated, and the ACL middleware reuses the same verification for role checks.

use std::future::{ready, Ready};

use actix_web::{web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use commerce_engine::db_types::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use scg_common::Secret;
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id, as assigned by the auth service.
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user_id: &str, roles: Vec<Role>, expires_at: DateTime<Utc>) -> Self {
        Self { sub: user_id.to_string(), roles, exp: expires_at.timestamp() }
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Validates bearer tokens against the shared secret. Lives in app data so both the extractor and the ACL
/// middleware can reach it.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &Secret<String>) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { decoding_key, validation }
    }

    pub fn decode(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(data.claims)
    }
}

/// Issues tokens with the shared secret. The production issuer is the auth service; this exists for tests and for
/// minting service tokens from operator tooling.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &Secret<String>) -> Self {
        Self { encoding_key: EncodingKey::from_secret(secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, claims: JwtClaims) -> Result<String, ServerError> {
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServerError::Unspecified(format!("Could not serialize access token. {e}")))
    }
}

pub fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| ServerError::InitializeError("TokenVerifier is not configured".to_string()))?;
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let header = header
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::PoorlyFormattedToken("expected a Bearer token".to_string()))?;
    let claims = verifier.decode(token.trim())?;
    trace!("🔑️ Validated access token for user {}", claims.sub);
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}
