// ABOUTME: axum handlers for the OAuth 2.0 endpoints and their route registration
// ABOUTME: Maps HTTP requests onto the grant handlers and shapes redirect vs JSON errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::models::AuthCode;
use crate::oauth2::endpoints::{
    authenticate_client, client_credentials_grant, exchange_authorization_code, introspect_token,
    refresh_token_grant, resolve_user_id, revoke_token,
};
use crate::oauth2::models::{
    AuthorizeParams, IntrospectForm, OAuth2Error, RevokeForm, TokenForm,
};
use crate::resources::ServerResources;
use crate::token::random_urlsafe;

type BasicAuth = Option<TypedHeader<Authorization<Basic>>>;

/// Register the OAuth endpoints; introspection and revocation mount only
/// when enabled in the configuration.
pub fn routes(config: &Config) -> Router<Arc<ServerResources>> {
    let mut router = Router::new()
        .route("/authorize", get(authorize))
        .route("/oauth2/token", post(token));

    if config.introspection.enabled {
        router = router.route("/oauth2/introspect", post(introspect));
    }
    if config.revocation.enabled {
        router = router.route("/oauth2/revoke", post(revoke));
    }
    router
}

/// `GET /authorize`: validate the request, mint a single-use code, and
/// bounce back to the client's redirect URI.
async fn authorize(
    State(resources): State<Arc<ServerResources>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    if params.response_type != "code" || params.client_id.is_empty() || params.redirect_uri.is_empty()
    {
        return error_redirect(
            &params.redirect_uri,
            &params.state,
            "invalid_request",
            "missing or invalid parameters",
        );
    }
    if Url::parse(&params.redirect_uri).is_err() {
        return error_redirect(
            &params.redirect_uri,
            &params.state,
            "invalid_request",
            "invalid redirect_uri",
        );
    }

    let client = resources.store.get_client(&params.client_id);
    let Some(client) = client.filter(|c| c.allows_redirect(&params.redirect_uri)) else {
        return error_redirect(
            &params.redirect_uri,
            &params.state,
            "unauthorized_client",
            "client or redirect_uri not allowed",
        );
    };

    let pkce_required = resources.config.oauth.pkce_required
        || (resources.config.oauth.pkce_required_for_public && client.is_public());
    if pkce_required && params.code_challenge.is_empty() {
        return error_redirect(
            &params.redirect_uri,
            &params.state,
            "invalid_request",
            "code_challenge required",
        );
    }

    let mut code_challenge_method = params.code_challenge_method.clone();
    if !params.code_challenge.is_empty() {
        if code_challenge_method.is_empty() {
            code_challenge_method = "plain".to_owned();
        }
        if code_challenge_method != "plain" && code_challenge_method != "S256" {
            return error_redirect(
                &params.redirect_uri,
                &params.state,
                "invalid_request",
                "unsupported code_challenge_method",
            );
        }
    }

    let Ok(code) = random_urlsafe(32) else {
        return error_redirect(
            &params.redirect_uri,
            &params.state,
            "server_error",
            "code generation failed",
        );
    };

    let user_id = resolve_user_id(&resources, &params.login_hint);
    let ttl = chrono::Duration::from_std(resources.config.oauth.auth_code_expiry)
        .unwrap_or_else(|_| chrono::Duration::minutes(10));
    resources.store.save_code(AuthCode {
        code: code.clone(),
        client_id: client.id.clone(),
        redirect_uri: params.redirect_uri.clone(),
        scope: params.scope.clone(),
        state: params.state.clone(),
        user_id: user_id.clone(),
        expires_at: Utc::now() + ttl,
        used: false,
        code_challenge: params.code_challenge.clone(),
        code_challenge_method,
    });
    debug!(client_id = %client.id, user_id = %user_id, "authorization code issued");

    let mut pairs: Vec<(&str, &str)> = vec![("code", code.as_str())];
    if !params.state.is_empty() {
        pairs.push(("state", params.state.as_str()));
    }
    match append_query(&params.redirect_uri, &pairs) {
        Ok(location) => found_redirect(&location),
        Err(_) => OAuth2Error::invalid_request("invalid redirect_uri").into_response(),
    }
}

/// `POST /oauth2/token`: authenticate the client and dispatch the grant.
async fn token(
    State(resources): State<Arc<ServerResources>>,
    basic: BasicAuth,
    Form(form): Form<TokenForm>,
) -> Response {
    if !matches!(
        form.grant_type.as_str(),
        "authorization_code" | "client_credentials" | "refresh_token"
    ) {
        return OAuth2Error::unsupported_grant_type().into_response();
    }

    let Some(client) = authenticate_client(
        &resources,
        basic_credentials(basic),
        form.client_id.as_deref(),
        form.client_secret.as_deref(),
    ) else {
        return OAuth2Error::invalid_client("token").into_response();
    };

    let result = match form.grant_type.as_str() {
        "authorization_code" => exchange_authorization_code(&resources, &client, &form),
        "client_credentials" => client_credentials_grant(&resources, &client, &form),
        _ => refresh_token_grant(&resources, &client, &form),
    };

    match result {
        Ok(response) => {
            info!(client_id = %client.id, grant_type = %form.grant_type, "tokens issued");
            Json(response).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// `POST /oauth2/introspect`, RFC 7662.
async fn introspect(
    State(resources): State<Arc<ServerResources>>,
    basic: BasicAuth,
    Form(form): Form<IntrospectForm>,
) -> Response {
    if resources.config.introspection.require_client_auth {
        let Some(client) = authenticate_client(
            &resources,
            basic_credentials(basic),
            form.client_id.as_deref(),
            form.client_secret.as_deref(),
        ) else {
            return OAuth2Error::invalid_client("introspect").into_response();
        };

        let allowed = &resources.config.introspection.allowed_clients;
        if !allowed.is_empty() && !allowed.contains(&client.id) {
            return OAuth2Error::access_denied("client not allowed to introspect")
                .into_response();
        }
    }

    if form.token.is_empty() {
        return OAuth2Error::invalid_request("token required").into_response();
    }

    Json(introspect_token(&resources, &form.token)).into_response()
}

/// `POST /oauth2/revoke`, RFC 7009. Always 200 on the success path, even
/// for unknown tokens.
async fn revoke(
    State(resources): State<Arc<ServerResources>>,
    basic: BasicAuth,
    Form(form): Form<RevokeForm>,
) -> Response {
    let mut client_id = None;
    if resources.config.revocation.require_client_auth {
        let Some(client) = authenticate_client(
            &resources,
            basic_credentials(basic),
            form.client_id.as_deref(),
            form.client_secret.as_deref(),
        ) else {
            return OAuth2Error::invalid_client("revoke").into_response();
        };
        client_id = Some(client.id);
    }

    if form.token.is_empty() {
        return OAuth2Error::invalid_request("token required").into_response();
    }

    revoke_token(
        &resources,
        &form.token,
        &form.token_type_hint,
        client_id.as_deref(),
    );
    StatusCode::OK.into_response()
}

fn basic_credentials(basic: BasicAuth) -> Option<(String, String)> {
    basic.map(|TypedHeader(Authorization(basic))| {
        (basic.username().to_owned(), basic.password().to_owned())
    })
}

/// Append query pairs to a URI, preserving whatever query it already has
fn append_query(uri: &str, pairs: &[(&str, &str)]) -> Result<String, url::ParseError> {
    let mut url = Url::parse(uri)?;
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in pairs {
            query.append_pair(name, value);
        }
    }
    Ok(url.to_string())
}

fn found_redirect(location: &str) -> Response {
    match header::HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => OAuth2Error::invalid_request("invalid redirect_uri").into_response(),
    }
}

/// Shape an authorize-endpoint failure: a 302 carrying the error pair when
/// the redirect URI is usable, a 400 JSON envelope otherwise.
fn error_redirect(redirect_uri: &str, state: &str, code: &str, description: &str) -> Response {
    let mut error = OAuth2Error::invalid_request(description);
    error.error = code.to_owned();
    if code == "server_error" {
        error.status = StatusCode::INTERNAL_SERVER_ERROR;
    }

    if redirect_uri.is_empty() {
        return error.into_response();
    }
    let mut pairs: Vec<(&str, &str)> = vec![("error", code)];
    if !description.is_empty() {
        pairs.push(("error_description", description));
    }
    if !state.is_empty() {
        pairs.push(("state", state));
    }
    match append_query(redirect_uri, &pairs) {
        Ok(location) => found_redirect(&location),
        Err(_) => error.into_response(),
    }
}
