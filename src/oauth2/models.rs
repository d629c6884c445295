// ABOUTME: OAuth 2.0 wire-level request and response types
// ABOUTME: Authorize/token/introspect/revoke forms, token response, discovery, error envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Query parameters of `GET /authorize`.
///
/// Everything is optional at the wire level; the handler enforces presence
/// so it can shape the error (redirect vs. JSON) per the protocol rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizeParams {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub login_hint: String,
}

/// Form body of `POST /oauth2/token`, shared by all three grants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenForm {
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    /// Form-level client credentials, used when no Basic header is present
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Form body of `POST /oauth2/introspect` (RFC 7662).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntrospectForm {
    pub token: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Form body of `POST /oauth2/revoke` (RFC 7009).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RevokeForm {
    pub token: String,
    pub token_type_hint: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Successful token-endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// OpenID Connect discovery document served at
/// `/.well-known/openid-configuration`.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grant_types_supported: Vec<String>,
    pub subject_types_supported: Vec<String>,
    pub id_token_signing_alg_values_supported: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub claims_supported: Vec<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint_auth_methods_supported: Option<Vec<String>>,
}

/// OAuth 2.0 error envelope (RFC 6749 section 5.2).
///
/// Serializes as `{"error": ..., "error_description": ...}`; the HTTP status
/// and optional `WWW-Authenticate` challenge ride along out of band.
#[derive(Debug, Clone, Serialize)]
pub struct OAuth2Error {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip)]
    pub status: StatusCode,
    #[serde(skip)]
    pub www_authenticate: Option<String>,
}

impl OAuth2Error {
    fn new(status: StatusCode, error: &str, description: &str) -> Self {
        Self {
            error: error.to_owned(),
            error_description: if description.is_empty() {
                None
            } else {
                Some(description.to_owned())
            },
            status,
            www_authenticate: None,
        }
    }

    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", description)
    }

    /// Client authentication failure; carries a Basic challenge for `realm`
    #[must_use]
    pub fn invalid_client(realm: &str) -> Self {
        let mut err = Self::new(
            StatusCode::UNAUTHORIZED,
            "invalid_client",
            "client authentication failed",
        );
        err.www_authenticate = Some(format!("Basic realm={realm}"));
        err
    }

    #[must_use]
    pub fn unauthorized_client(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "unauthorized_client", description)
    }

    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_grant", description)
    }

    #[must_use]
    pub fn invalid_scope(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_scope", description)
    }

    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            "grant type not supported",
        )
    }

    #[must_use]
    pub fn access_denied(description: &str) -> Self {
        Self::new(StatusCode::FORBIDDEN, "access_denied", description)
    }

    #[must_use]
    pub fn server_error(description: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "server_error", description)
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        let status = self.status;
        let challenge = self.www_authenticate.clone();
        let mut response = (status, Json(self)).into_response();
        if let Some(challenge) = challenge {
            if let Ok(value) = header::HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}
