// ABOUTME: Top-level router assembly plus the root, health, JWKS, discovery, and callback pages
// ABOUTME: Mounts the OAuth endpoints and wraps everything in the request pipeline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::keys::JsonWebKeySet;
use crate::middleware::request_pipeline;
use crate::oauth2::{self, DiscoveryDocument};
use crate::resources::ServerResources;

/// Assemble the complete application router.
pub fn router(resources: Arc<ServerResources>) -> Router {
    let mut router: Router<Arc<ServerResources>> = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/jwks.json", get(jwks))
        .route("/.well-known/openid-configuration", get(discovery))
        .merge(oauth2::routes::routes(&resources.config));

    if resources.config.callback_server.enabled {
        router = router.route(&resources.config.callback_server.path, get(callback));
    }

    router
        // Panics become plain 500s below the pipeline, so they get logged
        // like any other server error.
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&resources),
            request_pipeline,
        ))
        .with_state(resources)
}

async fn root() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), ": ok\n")
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Published key set; cached briefly so polling relying parties behave
async fn jwks(State(resources): State<Arc<ServerResources>>) -> Response {
    (
        [(header::CACHE_CONTROL, "public, max-age=30")],
        Json(JsonWebKeySet {
            keys: vec![resources.key.jwk().clone()],
        }),
    )
        .into_response()
}

async fn discovery(State(resources): State<Arc<ServerResources>>) -> Json<DiscoveryDocument> {
    let issuer = &resources.issuer;
    let config = &resources.config;

    Json(DiscoveryDocument {
        issuer: issuer.clone(),
        jwks_uri: format!("{issuer}/jwks.json"),
        response_types_supported: vec!["code".to_owned()],
        grant_types_supported: config.oauth.allowed_grant_types.clone(),
        subject_types_supported: vec!["public".to_owned()],
        id_token_signing_alg_values_supported: vec![config.tokens.algorithm.clone()],
        scopes_supported: config.oauth.supported_scopes.clone(),
        claims_supported: ["iss", "sub", "aud", "exp", "iat"]
            .map(str::to_owned)
            .to_vec(),
        authorization_endpoint: format!("{issuer}/authorize"),
        token_endpoint: format!("{issuer}/oauth2/token"),
        token_endpoint_auth_methods_supported: vec![
            "client_secret_basic".to_owned(),
            "client_secret_post".to_owned(),
        ],
        code_challenge_methods_supported: vec!["plain".to_owned(), "S256".to_owned()],
        introspection_endpoint: config
            .introspection
            .enabled
            .then(|| format!("{issuer}/oauth2/introspect")),
        revocation_endpoint: config
            .revocation
            .enabled
            .then(|| format!("{issuer}/oauth2/revoke")),
        revocation_endpoint_auth_methods_supported: config.revocation.enabled.then(|| {
            vec![
                "client_secret_basic".to_owned(),
                "client_secret_post".to_owned(),
            ]
        }),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CallbackParams {
    code: String,
    state: String,
    error: String,
    error_description: String,
}

/// Local redirect target that displays the received code or error, so a
/// browser-driven flow has somewhere friendly to land.
async fn callback(Query(params): Query<CallbackParams>) -> Html<String> {
    if !params.error.is_empty() {
        return Html(render_callback_error(&params.error, &params.error_description));
    }
    if params.code.is_empty() {
        return Html(render_callback_error(
            "invalid_request",
            "Missing authorization code",
        ));
    }
    Html(render_callback_success(&params.code, &params.state))
}

fn render_callback_success(code: &str, state: &str) -> String {
    let state = if state.is_empty() { "(none)" } else { state };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Authorization complete</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 4rem auto; max-width: 40rem; }}
    code {{ background: #f4f4f4; padding: 0.2rem 0.4rem; border-radius: 4px; word-break: break-all; }}
    .ok {{ color: #2c7a2c; }}
  </style>
</head>
<body>
  <h1 class="ok">Authorization complete</h1>
  <p>Exchange this code at the token endpoint before it expires.</p>
  <p>code: <code>{code}</code></p>
  <p>state: <code>{state}</code></p>
</body>
</html>
"#
    )
}

fn render_callback_error(error: &str, description: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Authorization failed</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 4rem auto; max-width: 40rem; }}
    code {{ background: #f4f4f4; padding: 0.2rem 0.4rem; border-radius: 4px; }}
    .err {{ color: #b02a2a; }}
  </style>
</head>
<body>
  <h1 class="err">Authorization failed</h1>
  <p>error: <code>{error}</code></p>
  <p>{description}</p>
</body>
</html>
"#
    )
}
