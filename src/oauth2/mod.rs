// ABOUTME: OAuth 2.0 / OpenID Connect protocol implementation
// ABOUTME: Wire models, PKCE and scope rules, grant handlers, and the HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Mock OIDC Server Project

/// Grant handlers, client authentication, introspection, and revocation
pub mod endpoints;
/// Request/response wire types and the OAuth error envelope
pub mod models;
/// PKCE challenge verification (RFC 7636)
pub mod pkce;
/// HTTP handlers and route registration
pub mod routes;
/// Space-delimited scope set helpers
pub mod scope;

pub use models::{DiscoveryDocument, OAuth2Error, TokenResponse};
