// ABOUTME: RSA signing key material and its JWK (JSON Web Key) representation
// ABOUTME: Generates the server keypair, derives the kid, and bridges into jsonwebtoken
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

//! Signing key material.
//!
//! The server generates a single RSA 2048 keypair at startup. The key id
//! (`kid`) is the base64url SHA-256 digest of the public key's
//! SubjectPublicKeyInfo DER, so it is stable for the lifetime of the key and
//! changes whenever the key does. The public half is published through
//! `/jwks.json`; the private half never leaves the process.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::AppError;

/// RSA key size in bits for RS256 signing
const RSA_KEY_SIZE: usize = 2048;

/// JWK representation of a single RSA public key (RFC 7517)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub alg: String,
    pub kid: String,
    /// RSA modulus, base64url without padding
    pub n: String,
    /// RSA public exponent, base64url without padding
    pub e: String,
}

/// JWKS container served at `/jwks.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

/// The server's RSA keypair together with everything derived from it.
///
/// The derived `jsonwebtoken` keys are computed once at construction so the
/// hot path never re-encodes PEM.
pub struct RsaKeyMaterial {
    kid: String,
    jwk: JsonWebKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl RsaKeyMaterial {
    /// Generate a fresh RSA keypair and derive kid, JWK, and signing keys.
    ///
    /// # Errors
    /// Returns an error if key generation or key serialization fails. Callers
    /// at startup treat this as fatal.
    pub fn generate() -> Result<Self, AppError> {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_SIZE)
            .map_err(|e| AppError::KeyMaterial(format!("generate RSA key: {e}")))?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self, AppError> {
        let public_key = RsaPublicKey::from(&private_key);

        let spki = public_key
            .to_public_key_der()
            .map_err(|e| AppError::KeyMaterial(format!("encode SubjectPublicKeyInfo: {e}")))?;
        let kid = URL_SAFE_NO_PAD.encode(Sha256::digest(spki.as_bytes()));

        let jwk = JsonWebKey {
            kty: "RSA".to_owned(),
            key_use: "sig".to_owned(),
            alg: "RS256".to_owned(),
            kid: kid.clone(),
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        };

        let private_pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| AppError::KeyMaterial(format!("encode private key PEM: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())?;

        let public_pem = public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .map_err(|e| AppError::KeyMaterial(format!("encode public key PEM: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())?;

        Ok(Self {
            kid,
            jwk,
            encoding_key,
            decoding_key,
        })
    }

    /// Key id carried in JWT headers and the published JWK
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The public JWK served through the JWKS endpoint
    #[must_use]
    pub fn jwk(&self) -> &JsonWebKey {
        &self.jwk
    }

    /// Signing key for RS256 issuance
    #[must_use]
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Verification key matching the published JWK
    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}
