// ABOUTME: Core data records owned by the in-memory authorization server state
// ABOUTME: Clients, users, authorization codes, refresh tokens, and request log entries
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A registered OAuth client.
///
/// An empty `secret` marks a public client; public clients authenticate
/// with their `client_id` alone and may be forced through PKCE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Stable client identifier, unique within the store
    pub id: String,
    /// Client secret; empty for public clients
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    /// Exact-match redirect URI allowlist
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// Whether this client is a public client (no secret)
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.secret.is_empty()
    }

    /// Whether `redirect_uri` exactly matches one of the registered URIs
    #[must_use]
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }
}

/// A selectable identity.
///
/// Users are never authenticated here; they exist so `login_hint` can pick
/// the subject that issued tokens are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub dept: String,
}

/// Ephemeral authorization-code grant record.
///
/// Created by the authorize endpoint and consumed exactly once by the token
/// endpoint; a code that is used or past `expires_at` is dead.
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    /// PKCE challenge; empty when the client did not use PKCE
    pub code_challenge: String,
    /// `plain` or `S256`; empty iff `code_challenge` is empty
    pub code_challenge_method: String,
}

/// Opaque refresh-token record.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token: String,
    pub client_id: String,
    pub user_id: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    /// A refresh token is usable iff it has not been revoked and has not expired
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now <= self.expires_at
    }
}

/// Membership record of the access-token revocation set, keyed by `jti`.
#[derive(Debug, Clone)]
pub struct RevokedToken {
    pub token: String,
    pub revoked_at: DateTime<Utc>,
}

/// One request as observed by the logging pipeline. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub method: String,
    /// Request path including the query string
    pub path: String,
    pub status: u16,
    pub duration: Duration,
    pub remote_ip: String,
    pub user_agent: String,
    pub bytes: u64,
}
