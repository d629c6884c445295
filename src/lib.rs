// ABOUTME: Library entry point for the mock OAuth 2.0 / OpenID Connect authorization server
// ABOUTME: Exposes the token engine, state store, protocol routes, and server bootstrap
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

#![deny(unsafe_code)]

//! # Mock OIDC Server
//!
//! An OAuth 2.0 / OpenID Connect authorization server for local development
//! and integration testing. It issues RS256-signed access and ID tokens,
//! exchanges authorization codes (with PKCE), refreshes and rotates
//! refresh tokens, introspects and revokes tokens, and publishes the
//! standard discovery and JWKS documents.
//!
//! Nothing persists: clients, users, codes, and tokens live in memory and
//! die with the process. Authentication is deliberately stubbed (every
//! authorize request resolves to a configured user) because the point is
//! exercising *client* code, not protecting anything.
//!
//! A chaos facility can hand out expired tokens, tokens signed by a key
//! the JWKS has never seen, or blanket 500s, so failure paths in client
//! code can be driven deterministically.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mock_oidc_server::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::defaults();
//!     mock_oidc_server::server::run(config).await
//! }
//! ```

/// Operator-toggled fault injection
pub mod chaos;
/// YAML configuration, defaults, and environment overlay
pub mod config;
/// Application error type
pub mod errors;
/// RSA key material and JWK publication
pub mod keys;
/// Structured logging setup
pub mod logging;
/// Request log ring buffer with fan-out
pub mod loghub;
/// Request pipeline middleware
pub mod middleware;
/// Core data records
pub mod models;
/// OAuth 2.0 / OIDC protocol implementation
pub mod oauth2;
/// Shared singleton aggregate
pub mod resources;
/// Router assembly and standalone pages
pub mod routes;
/// Bootstrap, lifecycle, and issuer derivation
pub mod server;
/// In-memory authorization state
pub mod store;
/// JWT issuance and validation
pub mod token;

pub use chaos::ChaosFlags;
pub use config::Config;
pub use errors::AppError;
pub use keys::{JsonWebKey, JsonWebKeySet, RsaKeyMaterial};
pub use loghub::{LogHub, LogSubscription};
pub use models::{AuthCode, Client, LogEntry, RefreshToken, User};
pub use resources::ServerResources;
pub use store::Store;
pub use token::{IssueRequest, IssuedTokens, TokenEngine};
