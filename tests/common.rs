// ABOUTME: Shared test utilities: server construction, request helpers, body decoding
// ABOUTME: Reuses one RSA keypair across tests so the suite is not dominated by keygen
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http_body_util::BodyExt as _;
use std::sync::{Arc, Once, OnceLock};
use tower::ServiceExt as _;

use mock_oidc_server::chaos::ChaosFlags;
use mock_oidc_server::config::Config;
use mock_oidc_server::keys::RsaKeyMaterial;
use mock_oidc_server::loghub::LogHub;
use mock_oidc_server::resources::ServerResources;
use mock_oidc_server::routes;
use mock_oidc_server::server::{derive_issuer, seed_store};
use mock_oidc_server::store::Store;
use mock_oidc_server::token::TokenEngine;

static INIT_LOGGER: Once = Once::new();

/// Quiet logging once per test process
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

static SHARED_KEY: OnceLock<Arc<RsaKeyMaterial>> = OnceLock::new();

/// One RSA keypair for the whole test process; the key is immutable and
/// generation is the slow part of server construction.
pub fn shared_key() -> Arc<RsaKeyMaterial> {
    Arc::clone(SHARED_KEY.get_or_init(|| {
        Arc::new(RsaKeyMaterial::generate().expect("generate test RSA key"))
    }))
}

pub struct TestServer {
    pub resources: Arc<ServerResources>,
    pub router: Router,
}

/// Build a complete server (resources plus router) for a configuration.
pub fn test_server(mut config: Config) -> TestServer {
    init_test_logging();
    config.apply_defaults();

    let key = shared_key();
    let issuer = derive_issuer(&config.oauth.issuer, &config.server.host, config.server.port);
    config.oauth.issuer = issuer.clone();

    let store = Arc::new(Store::new());
    seed_store(&store, &config);

    let log_hub = Arc::new(LogHub::new(config.logging.buffer_size));
    let chaos = Arc::new(ChaosFlags::new());
    let token_engine = Arc::new(TokenEngine::new(Arc::clone(&key), issuer.clone()));

    let resources = Arc::new(ServerResources::new(
        config, issuer, store, log_hub, chaos, key, token_engine,
    ));
    TestServer {
        router: routes::router(Arc::clone(&resources)),
        resources,
    }
}

pub fn default_server() -> TestServer {
    test_server(Config::default())
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router never fails")
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(
        router,
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await
}

/// POST a form body, optionally with a Basic Authorization header.
pub async fn post_form(
    router: &Router,
    uri: &str,
    body: &str,
    auth: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    send(router, builder.body(Body::from(body.to_owned())).expect("request")).await
}

pub fn basic_auth(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{client_id}:{client_secret}"))
    )
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

/// Drive `/authorize` and pull the issued code out of the redirect.
pub async fn obtain_code(router: &Router, query: &str) -> (String, Option<String>) {
    let response = get(router, &format!("/authorize?{query}")).await;
    assert_eq!(response.status(), StatusCode::FOUND, "authorize should redirect");
    let location = location_url(&response);
    let code = query_param(&location, "code").expect("code in redirect");
    let state = query_param(&location, "state");
    (code, state)
}

pub fn location_url(response: &Response<Body>) -> url::Url {
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ascii location");
    url::Url::parse(location).expect("parseable location")
}

pub fn query_param(url: &url::Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Decoding key for the advertised JWK, as a relying party would build it
pub fn jwks_decoding_key(jwk: &mock_oidc_server::keys::JsonWebKey) -> jsonwebtoken::DecodingKey {
    jsonwebtoken::DecodingKey::from_rsa_components(&jwk.n, &jwk.e).expect("JWK components")
}
