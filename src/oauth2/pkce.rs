// ABOUTME: PKCE code challenge verification per RFC 7636
// ABOUTME: Supports the plain and S256 challenge methods with constant-time comparison
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq as _;

/// Verify a PKCE `code_verifier` against the challenge recorded at
/// authorization time.
///
/// `plain` compares the verifier directly; `S256` compares
/// `base64url(SHA-256(verifier))` without padding. Any other method fails.
#[must_use]
pub fn validate_pkce(verifier: &str, challenge: &str, method: &str) -> bool {
    match method {
        "plain" => verifier.as_bytes().ct_eq(challenge.as_bytes()).into(),
        "S256" => {
            let computed = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
            computed.as_bytes().ct_eq(challenge.as_bytes()).into()
        }
        _ => false,
    }
}
