// ABOUTME: Authoritative in-memory state behind a single coarse mutex
// ABOUTME: Clients, users, single-use auth codes, refresh tokens, and the revocation set
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

//! In-memory authorization state.
//!
//! All five collections live behind one mutex. Lock holding time is bounded
//! by a handful of map operations; nothing does I/O or awaits under the
//! lock. List operations copy into fresh vectors and make no ordering
//! promise; callers sort when they need determinism.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::models::{AuthCode, Client, RefreshToken, RevokedToken, User};

#[derive(Debug, Default)]
struct StoreInner {
    clients: HashMap<String, Client>,
    users: HashMap<String, User>,
    codes: HashMap<String, AuthCode>,
    refresh_tokens: HashMap<String, RefreshToken>,
    revoked_tokens: HashMap<String, RevokedToken>,
}

/// Shared authorization-server state.
#[derive(Debug, Default)]
pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a client (last write wins)
    pub fn add_client(&self, client: Client) {
        self.inner.lock().clients.insert(client.id.clone(), client);
    }

    #[must_use]
    pub fn get_client(&self, id: &str) -> Option<Client> {
        self.inner.lock().clients.get(id).cloned()
    }

    /// All registered clients, in unspecified order
    #[must_use]
    pub fn list_clients(&self) -> Vec<Client> {
        self.inner.lock().clients.values().cloned().collect()
    }

    /// Replace an existing client; returns false if the id is unknown
    pub fn update_client(&self, client: Client) -> bool {
        let mut inner = self.inner.lock();
        if !inner.clients.contains_key(&client.id) {
            return false;
        }
        inner.clients.insert(client.id.clone(), client);
        true
    }

    /// Remove a client; returns false if the id is unknown
    pub fn delete_client(&self, id: &str) -> bool {
        self.inner.lock().clients.remove(id).is_some()
    }

    /// Register or replace a user (last write wins, keyed by email)
    pub fn add_user(&self, user: User) {
        self.inner.lock().users.insert(user.email.clone(), user);
    }

    #[must_use]
    pub fn get_user(&self, email: &str) -> Option<User> {
        self.inner.lock().users.get(email).cloned()
    }

    /// All known users, in unspecified order
    #[must_use]
    pub fn list_users(&self) -> Vec<User> {
        self.inner.lock().users.values().cloned().collect()
    }

    /// Replace an existing user; returns false if the email is unknown
    pub fn update_user(&self, user: User) -> bool {
        let mut inner = self.inner.lock();
        if !inner.users.contains_key(&user.email) {
            return false;
        }
        inner.users.insert(user.email.clone(), user);
        true
    }

    /// Remove a user; returns false if the email is unknown
    pub fn delete_user(&self, email: &str) -> bool {
        self.inner.lock().users.remove(email).is_some()
    }

    /// Persist a freshly minted authorization code
    pub fn save_code(&self, code: AuthCode) {
        self.inner.lock().codes.insert(code.code.clone(), code);
    }

    /// Atomically consume an authorization code.
    ///
    /// Lookup, freshness check, and the `used` write happen inside one
    /// critical section, so at most one caller ever receives a given code.
    /// Returns `None` for unknown, already used, or expired codes.
    #[must_use]
    pub fn consume_code(&self, code: &str) -> Option<AuthCode> {
        let mut inner = self.inner.lock();
        let record = inner.codes.get_mut(code)?;
        if record.used || Utc::now() > record.expires_at {
            return None;
        }
        record.used = true;
        Some(record.clone())
    }

    pub fn save_refresh_token(&self, token: RefreshToken) {
        self.inner
            .lock()
            .refresh_tokens
            .insert(token.token.clone(), token);
    }

    /// Look up a refresh token, returning it only while it is usable
    #[must_use]
    pub fn get_refresh_token(&self, token: &str) -> Option<RefreshToken> {
        let inner = self.inner.lock();
        let record = inner.refresh_tokens.get(token)?;
        if !record.is_valid(Utc::now()) {
            return None;
        }
        Some(record.clone())
    }

    /// Mark a refresh token revoked; returns false if the token is unknown
    pub fn revoke_refresh_token(&self, token: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.refresh_tokens.get_mut(token) {
            Some(record) => {
                record.revoked = true;
                true
            }
            None => false,
        }
    }

    /// Atomically revoke `old` and persist its replacement.
    ///
    /// Both writes share one critical section so no observer can find the
    /// old token valid after the replacement exists, or vice versa, in a
    /// torn state. The old token may already be gone; the replacement is
    /// stored regardless.
    pub fn rotate_refresh_token(&self, old: &str, replacement: RefreshToken) {
        let mut inner = self.inner.lock();
        if let Some(record) = inner.refresh_tokens.get_mut(old) {
            record.revoked = true;
        }
        inner
            .refresh_tokens
            .insert(replacement.token.clone(), replacement);
    }

    /// Revoke every live refresh token for a (user, client) pair, returning
    /// how many were revoked
    pub fn revoke_refresh_tokens_by_user(&self, user_id: &str, client_id: &str) -> usize {
        let mut inner = self.inner.lock();
        let mut count = 0;
        for record in inner.refresh_tokens.values_mut() {
            if record.user_id == user_id && record.client_id == client_id && !record.revoked {
                record.revoked = true;
                count += 1;
            }
        }
        count
    }

    /// Add an access-token id (`jti`) to the revocation set
    pub fn revoke_access_token(&self, token_id: &str) {
        self.inner.lock().revoked_tokens.insert(
            token_id.to_owned(),
            RevokedToken {
                token: token_id.to_owned(),
                revoked_at: Utc::now(),
            },
        );
    }

    #[must_use]
    pub fn is_access_token_revoked(&self, token_id: &str) -> bool {
        self.inner.lock().revoked_tokens.contains_key(token_id)
    }
}
