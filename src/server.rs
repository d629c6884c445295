// ABOUTME: Server bootstrap: key generation, issuer derivation, store seeding, bind and serve
// ABOUTME: Graceful shutdown on SIGINT/SIGTERM with a bounded drain deadline
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use anyhow::{ensure, Context as _, Result};
use std::future::IntoFuture as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::chaos::ChaosFlags;
use crate::config::Config;
use crate::keys::RsaKeyMaterial;
use crate::loghub::LogHub;
use crate::resources::ServerResources;
use crate::routes;
use crate::store::Store;
use crate::token::TokenEngine;

/// In-flight requests get this long after the shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve the issuer URL.
///
/// An explicit issuer wins, minus any trailing slash. Otherwise loopback
/// hosts get plain http with the port; anything else is assumed to sit
/// behind TLS, with the port appended unless it is 443.
#[must_use]
pub fn derive_issuer(explicit: &str, host: &str, port: u16) -> String {
    if !explicit.is_empty() {
        return explicit.trim_end_matches('/').to_owned();
    }
    let lower = host.to_ascii_lowercase();
    if lower == "localhost" || lower == "127.0.0.1" || lower.starts_with("127.") {
        return format!("http://{host}:{port}");
    }
    if port == 443 {
        format!("https://{host}")
    } else {
        format!("https://{host}:{port}")
    }
}

/// Load the configured users and clients into the store, in sorted order so
/// startup logs are deterministic.
pub fn seed_store(store: &Store, config: &Config) {
    let mut users = config.users.clone();
    users.sort_by(|a, b| a.email.cmp(&b.email));
    for user in users {
        info!(email = %user.email, role = %user.role, "loaded user");
        store.add_user(user);
    }

    let mut clients = config.clients.clone();
    clients.sort_by(|a, b| a.id.cmp(&b.id));
    for client in clients {
        info!(client_id = %client.id, "loaded client");
        store.add_client(client);
    }
}

/// Build the shared resources for a configuration.
///
/// # Errors
/// Returns an error if key generation fails or the configured signing
/// algorithm is unsupported.
pub fn build_resources(mut config: Config) -> Result<Arc<ServerResources>> {
    ensure!(
        config.tokens.algorithm == "RS256",
        "unsupported token algorithm {:?} (only RS256 is supported)",
        config.tokens.algorithm
    );

    let key = Arc::new(RsaKeyMaterial::generate().context("generate RSA signing key")?);
    info!(kid = %key.kid(), "signing key generated");

    let issuer = derive_issuer(&config.oauth.issuer, &config.server.host, config.server.port);
    config.oauth.issuer = issuer.clone();

    let store = Arc::new(Store::new());
    seed_store(&store, &config);

    let log_hub = Arc::new(LogHub::new(config.logging.buffer_size));
    let chaos = Arc::new(ChaosFlags::new());
    let token_engine = Arc::new(TokenEngine::new(Arc::clone(&key), issuer.clone()));

    Ok(Arc::new(ServerResources::new(
        config,
        issuer,
        store,
        log_hub,
        chaos,
        key,
        token_engine,
    )))
}

/// Run the server until a shutdown signal arrives.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run(config: Config) -> Result<()> {
    let resources = build_resources(config)?;
    let app = routes::router(Arc::clone(&resources));

    let addr = format!(
        "{}:{}",
        resources.config.server.host, resources.config.server.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(issuer = %resources.issuer, "listening on http://{addr}");
    info!("{}", resources.config.summary());

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let mut drain_rx = shutdown_rx.clone();
    let mut graceful_rx = shutdown_rx;
    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = graceful_rx.changed().await;
    });

    let mut serve_future = std::pin::pin!(serve.into_future());
    tokio::select! {
        result = &mut serve_future => result.context("server error")?,
        _ = drain_rx.changed() => {
            info!("shutdown signal received, draining in-flight requests");
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut serve_future).await {
                Ok(result) => result.context("server error during drain")?,
                Err(_) => warn!("drain deadline exceeded, aborting in-flight requests"),
            }
        }
    }

    // Subscribers see end-of-stream instead of a hung channel.
    resources.log_hub.close();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_prefers_explicit_value_without_trailing_slash() {
        assert_eq!(derive_issuer("https://x/", "ignored", 1), "https://x");
        assert_eq!(
            derive_issuer("https://auth.example.com", "ignored", 1),
            "https://auth.example.com"
        );
    }

    #[test]
    fn issuer_uses_plain_http_for_loopback() {
        assert_eq!(
            derive_issuer("", "127.0.0.1", 8080),
            "http://127.0.0.1:8080"
        );
        assert_eq!(derive_issuer("", "localhost", 9000), "http://localhost:9000");
        assert_eq!(derive_issuer("", "127.0.1.5", 80), "http://127.0.1.5:80");
    }

    #[test]
    fn issuer_assumes_tls_elsewhere() {
        assert_eq!(derive_issuer("", "example.com", 443), "https://example.com");
        assert_eq!(
            derive_issuer("", "example.com", 8443),
            "https://example.com:8443"
        );
    }
}
