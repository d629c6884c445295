// ABOUTME: JWT token engine for RS256 access and ID token issuance and validation
// ABOUTME: Honors chaos flags by back-dating expiry or signing with a throwaway key
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

//! Token engine.
//!
//! Builds and signs the access/ID token pair for every grant, and parses
//! tokens back for introspection and revocation. Claims are assembled as a
//! dynamic JSON map so callers can attach custom claims; a custom claim with
//! a standard name wins (last write).
//!
//! Chaos hooks: `chaos_expired` back-dates `exp` by an hour on both tokens;
//! `chaos_invalid_signature` signs this one issuance with a freshly
//! generated throwaway keypair, so verification against the published JWKS
//! fails while the token still parses.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore as _;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::AppError;
use crate::keys::RsaKeyMaterial;

/// Inputs for one issuance.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    pub subject: String,
    pub audience: String,
    /// Space-delimited scope; omitted from claims when empty
    pub scope: String,
    pub expires_in: std::time::Duration,
    /// Extra claims merged into the access token; may override standard names
    pub custom_claims: Map<String, Value>,
    pub chaos_expired: bool,
    pub chaos_invalid_signature: bool,
}

/// The signed pair plus the advertised lifetime in seconds.
///
/// `expires_in` is negative when the issuance was chaos-expired; clients get
/// to see exactly what a stale token looks like.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub id_token: String,
    pub expires_in: i64,
}

/// RS256 token issuer/validator bound to the server key and issuer URL.
pub struct TokenEngine {
    key: Arc<RsaKeyMaterial>,
    issuer: String,
}

impl TokenEngine {
    #[must_use]
    pub fn new(key: Arc<RsaKeyMaterial>, issuer: impl Into<String>) -> Self {
        Self {
            key,
            issuer: issuer.into(),
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Build and sign the access/ID token pair.
    ///
    /// # Errors
    /// Returns an error if the system randomness source fails, the TTL is
    /// unrepresentable, or signing fails.
    pub fn issue(&self, request: &IssueRequest) -> Result<IssuedTokens, AppError> {
        let now = Utc::now();
        let ttl = Duration::from_std(request.expires_in)
            .map_err(|_| AppError::Config("token ttl out of range".to_owned()))?;
        let exp = if request.chaos_expired {
            now - Duration::hours(1)
        } else {
            now + ttl
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key.kid().to_owned());

        // The throwaway key is generated per issuance and dropped afterwards;
        // it must never reach the JWKS.
        let throwaway = if request.chaos_invalid_signature {
            Some(RsaKeyMaterial::generate()?)
        } else {
            None
        };
        let signing_key = throwaway
            .as_ref()
            .map_or_else(|| self.key.encoding_key(), RsaKeyMaterial::encoding_key);

        let mut access_claims = Map::new();
        access_claims.insert("iss".to_owned(), Value::from(self.issuer.clone()));
        access_claims.insert("sub".to_owned(), Value::from(request.subject.clone()));
        access_claims.insert("aud".to_owned(), Value::from(request.audience.clone()));
        access_claims.insert("iat".to_owned(), Value::from(now.timestamp()));
        access_claims.insert("exp".to_owned(), Value::from(exp.timestamp()));
        access_claims.insert("jti".to_owned(), Value::from(generate_jti()?));
        if !request.scope.is_empty() {
            access_claims.insert("scope".to_owned(), Value::from(request.scope.clone()));
        }
        for (name, value) in &request.custom_claims {
            access_claims.insert(name.clone(), value.clone());
        }

        let access_token = jsonwebtoken::encode(&header, &access_claims, signing_key)?;

        let mut id_claims = Map::new();
        id_claims.insert("iss".to_owned(), Value::from(self.issuer.clone()));
        id_claims.insert("sub".to_owned(), Value::from(request.subject.clone()));
        id_claims.insert("aud".to_owned(), Value::from(request.audience.clone()));
        id_claims.insert("iat".to_owned(), Value::from(now.timestamp()));
        id_claims.insert("exp".to_owned(), Value::from(exp.timestamp()));

        let id_token = jsonwebtoken::encode(&header, &id_claims, signing_key)?;

        Ok(IssuedTokens {
            access_token,
            id_token,
            expires_in: (exp - now).num_seconds(),
        })
    }

    /// Validate a token against the server's own public key.
    ///
    /// # Errors
    /// Returns an error for malformed tokens, non-RSA algorithms, bad
    /// signatures, or expired claims.
    pub fn validate(&self, token: &str) -> Result<Map<String, Value>, AppError> {
        parse_and_validate(token, self.key.decoding_key())
    }
}

/// Parse a compact JWS and verify it against `key`.
///
/// Accepts the RSA algorithm family only and enforces standard `exp`
/// validation with zero leeway; audience is not restricted.
///
/// # Errors
/// Returns an error for malformed, mis-signed, or expired tokens.
pub fn parse_and_validate(
    token: &str,
    key: &DecodingKey,
) -> Result<Map<String, Value>, AppError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.algorithms = vec![Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];
    validation.validate_aud = false;
    validation.leeway = 0;

    let data = jsonwebtoken::decode::<Map<String, Value>>(token, key, &validation)?;
    Ok(data.claims)
}

/// Random 128-bit token id, base64url without padding
pub fn generate_jti() -> Result<String, AppError> {
    random_urlsafe(16)
}

/// `len` random bytes from the OS, base64url without padding.
///
/// # Errors
/// Returns an error if the OS randomness source fails.
pub fn random_urlsafe(len: usize) -> Result<String, AppError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Random(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jti_is_unpadded_urlsafe_and_unique() {
        let a = generate_jti().unwrap();
        let b = generate_jti().unwrap();

        // 16 bytes encode to 22 characters without padding
        assert_eq!(a.len(), 22);
        assert!(!a.contains('='));
        assert_ne!(a, b);
    }

    #[test]
    fn random_urlsafe_length_scales_with_input() {
        assert_eq!(random_urlsafe(32).unwrap().len(), 43);
    }
}
