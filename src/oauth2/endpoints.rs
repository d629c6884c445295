// ABOUTME: OAuth 2.0 grant handlers, client authentication, introspection, and revocation
// ABOUTME: Pure protocol logic over the shared resources; HTTP concerns live in routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

use chrono::Utc;
use serde_json::{json, Map, Value};
use subtle::ConstantTimeEq as _;
use tracing::{debug, warn};

use crate::config::FALLBACK_USER_ID;
use crate::models::{Client, RefreshToken};
use crate::oauth2::models::{OAuth2Error, TokenForm, TokenResponse};
use crate::oauth2::pkce::validate_pkce;
use crate::oauth2::scope::{has_scope, is_scope_subset};
use crate::resources::ServerResources;
use crate::token::{random_urlsafe, IssueRequest, IssuedTokens};

/// Authenticate the client for a token-endpoint style request.
///
/// Basic credentials win; the form fields are the fallback. A client
/// matches when it exists and either has no secret (public client) or the
/// presented secret is equal.
#[must_use]
pub fn authenticate_client(
    resources: &ServerResources,
    basic: Option<(String, String)>,
    form_id: Option<&str>,
    form_secret: Option<&str>,
) -> Option<Client> {
    let (client_id, client_secret) = match basic {
        Some(creds) => creds,
        None => (
            form_id.unwrap_or_default().to_owned(),
            form_secret.unwrap_or_default().to_owned(),
        ),
    };

    let client = resources.store.get_client(&client_id)?;
    if !client.secret.is_empty()
        && !bool::from(client.secret.as_bytes().ct_eq(client_secret.as_bytes()))
    {
        debug!(client_id = %client_id, "client secret mismatch");
        return None;
    }
    Some(client)
}

/// Pick the subject for a new authorization code.
///
/// A `login_hint` naming a known user wins; otherwise the first user in
/// email order; otherwise the fallback sentinel.
#[must_use]
pub fn resolve_user_id(resources: &ServerResources, login_hint: &str) -> String {
    if !login_hint.is_empty() && resources.store.get_user(login_hint).is_some() {
        return login_hint.to_owned();
    }

    let mut users = resources.store.list_users();
    users.sort_by(|a, b| a.email.cmp(&b.email));
    users
        .into_iter()
        .next()
        .map_or_else(|| FALLBACK_USER_ID.to_owned(), |user| user.email)
}

/// `grant_type=authorization_code`: consume the code, verify PKCE, issue the
/// token pair and optionally a refresh token.
pub fn exchange_authorization_code(
    resources: &ServerResources,
    client: &Client,
    form: &TokenForm,
) -> Result<TokenResponse, OAuth2Error> {
    let code = form.code.as_deref().unwrap_or_default();
    let redirect_uri = form.redirect_uri.as_deref().unwrap_or_default();
    if code.is_empty() || redirect_uri.is_empty() {
        return Err(OAuth2Error::invalid_request("code and redirect_uri required"));
    }

    // consume_code is the single-use gate; the binding checks afterwards
    // intentionally burn the code even on mismatch.
    let auth_code = resources.store.consume_code(code).ok_or_else(|| {
        OAuth2Error::invalid_grant("code invalid, expired, used, or mismatched")
    })?;
    if auth_code.client_id != client.id || auth_code.redirect_uri != redirect_uri {
        return Err(OAuth2Error::invalid_grant(
            "code invalid, expired, used, or mismatched",
        ));
    }

    if !auth_code.code_challenge.is_empty() {
        let verifier = form.code_verifier.as_deref().unwrap_or_default();
        if verifier.is_empty() {
            return Err(OAuth2Error::invalid_request("code_verifier required"));
        }
        if !validate_pkce(
            verifier,
            &auth_code.code_challenge,
            &auth_code.code_challenge_method,
        ) {
            return Err(OAuth2Error::invalid_grant("code_verifier invalid"));
        }
    }

    let issued = issue_tokens(resources, &auth_code.user_id, &client.id, &auth_code.scope)?;

    let refresh_token = if resources.config.tokens.issue_refresh_token
        || has_scope(&auth_code.scope, "offline_access")
    {
        let token = new_refresh_token(resources, &client.id, &auth_code.user_id, &auth_code.scope)?;
        resources.store.save_refresh_token(token.clone());
        Some(token.token)
    } else {
        None
    };

    Ok(TokenResponse {
        access_token: issued.access_token,
        token_type: "Bearer".to_owned(),
        expires_in: issued.expires_in,
        scope: auth_code.scope,
        id_token: Some(issued.id_token),
        refresh_token,
    })
}

/// `grant_type=client_credentials`: token for the client itself, falling
/// back to the configured default scopes.
pub fn client_credentials_grant(
    resources: &ServerResources,
    client: &Client,
    form: &TokenForm,
) -> Result<TokenResponse, OAuth2Error> {
    let scope = match form.scope.as_deref() {
        Some(scope) if !scope.is_empty() => scope.to_owned(),
        _ => resources.config.oauth.default_scopes.join(" "),
    };

    let issued = issue_tokens(resources, &client.id, &client.id, &scope)?;

    Ok(TokenResponse {
        access_token: issued.access_token,
        token_type: "Bearer".to_owned(),
        expires_in: issued.expires_in,
        scope,
        id_token: None,
        refresh_token: None,
    })
}

/// `grant_type=refresh_token`: validate the presented token, honor
/// downscoping, and rotate when configured.
pub fn refresh_token_grant(
    resources: &ServerResources,
    client: &Client,
    form: &TokenForm,
) -> Result<TokenResponse, OAuth2Error> {
    let presented = form.refresh_token.as_deref().unwrap_or_default();
    if presented.is_empty() {
        return Err(OAuth2Error::invalid_request("refresh_token required"));
    }

    let refresh = resources
        .store
        .get_refresh_token(presented)
        .filter(|rt| rt.client_id == client.id)
        .ok_or_else(|| OAuth2Error::invalid_grant("refresh token invalid or expired"))?;

    let scope = match form.scope.as_deref() {
        Some(requested) if !requested.is_empty() => {
            if !is_scope_subset(requested, &refresh.scope) {
                return Err(OAuth2Error::invalid_scope(
                    "requested scope exceeds original scope",
                ));
            }
            requested.to_owned()
        }
        _ => refresh.scope.clone(),
    };

    let issued = issue_tokens(resources, &refresh.user_id, &client.id, &scope)?;

    let rotated = if resources.config.tokens.refresh_token_rotation {
        // The replacement keeps the original grant scope: downscoping is a
        // property of this access token, not of the refresh chain.
        let replacement =
            new_refresh_token(resources, &client.id, &refresh.user_id, &refresh.scope)?;
        resources
            .store
            .rotate_refresh_token(presented, replacement.clone());
        Some(replacement.token)
    } else {
        None
    };

    Ok(TokenResponse {
        access_token: issued.access_token,
        token_type: "Bearer".to_owned(),
        expires_in: issued.expires_in,
        scope,
        id_token: None,
        refresh_token: rotated,
    })
}

/// RFC 7662 introspection body for `token`.
///
/// Anything that fails validation, or whose `jti` has been revoked, is
/// reported as `{"active": false}` with no further detail.
#[must_use]
pub fn introspect_token(resources: &ServerResources, token: &str) -> Value {
    let Ok(claims) = resources.token_engine.validate(token) else {
        return json!({ "active": false });
    };

    if let Some(jti) = claims.get("jti").and_then(Value::as_str) {
        if resources.store.is_access_token_revoked(jti) {
            return json!({ "active": false });
        }
    }

    let mut body = Map::new();
    body.insert("active".to_owned(), Value::from(true));
    body.insert("token_type".to_owned(), Value::from("Bearer"));
    if let Some(sub) = claims.get("sub").and_then(Value::as_str) {
        body.insert("sub".to_owned(), Value::from(sub));
    }
    if let Some(aud) = claims.get("aud").and_then(Value::as_str) {
        body.insert("client_id".to_owned(), Value::from(aud));
    }
    if let Some(scope) = claims.get("scope").and_then(Value::as_str) {
        body.insert("scope".to_owned(), Value::from(scope));
    }
    if let Some(iss) = claims.get("iss").and_then(Value::as_str) {
        body.insert("iss".to_owned(), Value::from(iss));
    }
    if let Some(exp) = claims.get("exp").and_then(Value::as_i64) {
        body.insert("exp".to_owned(), Value::from(exp));
    }
    if let Some(iat) = claims.get("iat").and_then(Value::as_i64) {
        body.insert("iat".to_owned(), Value::from(iat));
    }
    Value::Object(body)
}

/// RFC 7009 revocation for `token`.
///
/// Tries the refresh-token store first (unless hinted otherwise), then the
/// JWT path. Unknown tokens are ignored silently; the endpoint answers 200
/// either way.
pub fn revoke_token(
    resources: &ServerResources,
    token: &str,
    token_type_hint: &str,
    client_id: Option<&str>,
) {
    if token_type_hint == "refresh_token" || token_type_hint.is_empty() {
        if let Some(refresh) = resources.store.get_refresh_token(token) {
            if client_id.is_none() || client_id == Some(refresh.client_id.as_str()) {
                resources.store.revoke_refresh_token(token);
                debug!(client_id = %refresh.client_id, "refresh token revoked");
            }
            return;
        }
    }

    if token_type_hint == "access_token" || token_type_hint.is_empty() {
        let Ok(claims) = resources.token_engine.validate(token) else {
            return;
        };
        if let Some(expected) = client_id {
            if let Some(aud) = claims.get("aud").and_then(Value::as_str) {
                if aud != expected {
                    return;
                }
            }
        }
        match claims.get("jti").and_then(Value::as_str) {
            Some(jti) => resources.store.revoke_access_token(jti),
            // No jti to key on; fall back to the raw token string.
            None => resources.store.revoke_access_token(token),
        }
    }
}

fn issue_tokens(
    resources: &ServerResources,
    subject: &str,
    audience: &str,
    scope: &str,
) -> Result<IssuedTokens, OAuth2Error> {
    let request = IssueRequest {
        subject: subject.to_owned(),
        audience: audience.to_owned(),
        scope: scope.to_owned(),
        expires_in: resources.config.tokens.access_token_expiry,
        custom_claims: Map::new(),
        chaos_expired: resources.chaos.consume_next_token_expired(),
        chaos_invalid_signature: resources.chaos.invalid_signature(),
    };

    resources.token_engine.issue(&request).map_err(|error| {
        warn!(%error, "token generation failed");
        OAuth2Error::server_error("token generation failed")
    })
}

fn new_refresh_token(
    resources: &ServerResources,
    client_id: &str,
    user_id: &str,
    scope: &str,
) -> Result<RefreshToken, OAuth2Error> {
    let token = random_urlsafe(32).map_err(|error| {
        warn!(%error, "refresh token generation failed");
        OAuth2Error::server_error("refresh token generation failed")
    })?;

    let now = Utc::now();
    let ttl = chrono::Duration::from_std(resources.config.tokens.refresh_token_expiry)
        .unwrap_or_else(|_| chrono::Duration::hours(24));
    Ok(RefreshToken {
        token,
        client_id: client_id.to_owned(),
        user_id: user_id.to_owned(),
        scope: scope.to_owned(),
        issued_at: now,
        expires_at: now + ttl,
        revoked: false,
    })
}
