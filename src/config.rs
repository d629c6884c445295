// ABOUTME: Typed YAML configuration with defaults and environment-variable overlay
// ABOUTME: Owns the knobs the protocol honors: TTLs, PKCE policy, endpoint mounting, seeding
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

//! Server configuration.
//!
//! Precedence, lowest to highest: built-in defaults, the YAML file,
//! `MOCKOIDC_*` environment variables, then CLI flags (applied by the
//! binary). Durations use humantime strings (`5m`, `24h`, `90s`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::{Client, User};
use crate::store::Store;

/// Fallback subject when no users are configured at all
pub const FALLBACK_USER_ID: &str = "user@example.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub oauth: OAuthSection,
    pub tokens: TokenSection,
    pub introspection: IntrospectionSection,
    pub revocation: RevocationSection,
    pub users: Vec<User>,
    pub clients: Vec<Client>,
    pub callback_server: CallbackSection,
    pub external_callbacks: Vec<String>,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSection {
    /// Explicit issuer URL; empty means derive from host and port
    pub issuer: String,
    #[serde(with = "humantime_serde")]
    pub auth_code_expiry: Duration,
    /// Fallback scope set for the client_credentials grant
    pub default_scopes: Vec<String>,
    /// Advertised in discovery; `offline_access` is appended if missing
    pub supported_scopes: Vec<String>,
    /// Advertised in discovery only; token dispatch is unconditional
    pub allowed_grant_types: Vec<String>,
    pub pkce_required: bool,
    pub pkce_required_for_public: bool,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            auth_code_expiry: Duration::from_secs(10 * 60),
            default_scopes: vec!["openid".to_owned()],
            supported_scopes: vec![
                "openid".to_owned(),
                "profile".to_owned(),
                "email".to_owned(),
            ],
            allowed_grant_types: vec![
                "authorization_code".to_owned(),
                "client_credentials".to_owned(),
                "refresh_token".to_owned(),
            ],
            pkce_required: false,
            pkce_required_for_public: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSection {
    #[serde(with = "humantime_serde")]
    pub access_token_expiry: Duration,
    #[serde(with = "humantime_serde")]
    pub id_token_expiry: Duration,
    #[serde(with = "humantime_serde")]
    pub refresh_token_expiry: Duration,
    /// Signing algorithm; only RS256 is supported in this version
    pub algorithm: String,
    /// Issue a refresh token on every code exchange, regardless of scope
    pub issue_refresh_token: bool,
    /// Rotate refresh tokens on the refresh grant
    pub refresh_token_rotation: bool,
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::from_secs(5 * 60),
            id_token_expiry: Duration::from_secs(5 * 60),
            refresh_token_expiry: Duration::from_secs(24 * 60 * 60),
            algorithm: "RS256".to_owned(),
            issue_refresh_token: false,
            refresh_token_rotation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrospectionSection {
    pub enabled: bool,
    pub require_client_auth: bool,
    /// Non-empty list restricts which authenticated clients may introspect
    pub allowed_clients: Vec<String>,
}

impl Default for IntrospectionSection {
    fn default() -> Self {
        Self {
            enabled: true,
            require_client_auth: true,
            allowed_clients: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevocationSection {
    pub enabled: bool,
    pub require_client_auth: bool,
}

impl Default for RevocationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            require_client_auth: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackSection {
    pub enabled: bool,
    pub path: String,
    pub client_id: String,
}

impl Default for CallbackSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/callback".to_owned(),
            client_id: "demo-client".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// `json`, `pretty`, or `compact`
    pub format: String,
    /// LogHub ring capacity
    pub buffer_size: usize,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "json".to_owned(),
            buffer_size: 500,
        }
    }
}

impl Config {
    /// Built-in configuration: defaults plus the demo seed data
    #[must_use]
    pub fn defaults() -> Self {
        let mut config = Self::default();
        config.apply_defaults();
        config
    }

    /// Load a YAML file, then apply defaults and the environment overlay.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&raw)?;
        config.apply_defaults();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Fill in the cross-field defaults serde cannot express per-field.
    pub fn apply_defaults(&mut self) {
        if !self
            .oauth
            .supported_scopes
            .iter()
            .any(|s| s == "offline_access")
        {
            self.oauth.supported_scopes.push("offline_access".to_owned());
        }

        if self.users.is_empty() {
            self.users = vec![
                User {
                    email: "alice@test.com".to_owned(),
                    role: "user".to_owned(),
                    dept: "engineering".to_owned(),
                },
                User {
                    email: "bob@test.com".to_owned(),
                    role: "user".to_owned(),
                    dept: "sales".to_owned(),
                },
                User {
                    email: "admin@test.com".to_owned(),
                    role: "admin".to_owned(),
                    dept: String::new(),
                },
            ];
        }

        if self.external_callbacks.is_empty() {
            self.external_callbacks = vec!["https://oauth.pstmn.io/v1/callback".to_owned()];
        }

        if self.clients.is_empty() {
            let mut redirect_uris = Vec::new();
            if self.callback_server.enabled {
                redirect_uris.push(format!(
                    "http://{}:{}{}",
                    self.server.host, self.server.port, self.callback_server.path
                ));
            }
            redirect_uris.extend(self.external_callbacks.iter().cloned());

            self.clients = vec![Client {
                id: "demo-client".to_owned(),
                secret: "demo-secret".to_owned(),
                redirect_uris,
            }];
        }
    }

    /// Overlay `MOCKOIDC_*` environment variables onto the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = env_var("MOCKOIDC_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("MOCKOIDC_SERVER_PORT") {
            self.server.port = port;
        }

        if let Some(issuer) = env_var("MOCKOIDC_OAUTH_ISSUER") {
            self.oauth.issuer = issuer;
        }
        if let Some(expiry) = env_duration("MOCKOIDC_OAUTH_AUTH_CODE_EXPIRY") {
            self.oauth.auth_code_expiry = expiry;
        }
        if let Some(scopes) = env_list("MOCKOIDC_OAUTH_DEFAULT_SCOPES") {
            self.oauth.default_scopes = scopes;
        }
        if let Some(scopes) = env_list("MOCKOIDC_OAUTH_SUPPORTED_SCOPES") {
            self.oauth.supported_scopes = scopes;
        }

        if let Some(expiry) = env_duration("MOCKOIDC_TOKENS_ACCESS_TOKEN_EXPIRY") {
            self.tokens.access_token_expiry = expiry;
        }
        if let Some(expiry) = env_duration("MOCKOIDC_TOKENS_ID_TOKEN_EXPIRY") {
            self.tokens.id_token_expiry = expiry;
        }
        if let Some(expiry) = env_duration("MOCKOIDC_TOKENS_REFRESH_TOKEN_EXPIRY") {
            self.tokens.refresh_token_expiry = expiry;
        }
        if let Some(algorithm) = env_var("MOCKOIDC_TOKENS_ALGORITHM") {
            self.tokens.algorithm = algorithm;
        }

        if let Some(enabled) = env_var("MOCKOIDC_CALLBACK_SERVER_ENABLED") {
            self.callback_server.enabled = enabled == "true" || enabled == "1";
        }
        if let Some(path) = env_var("MOCKOIDC_CALLBACK_SERVER_PATH") {
            self.callback_server.path = path;
        }
        if let Some(client_id) = env_var("MOCKOIDC_CALLBACK_SERVER_CLIENT_ID") {
            self.callback_server.client_id = client_id;
        }

        if let Some(level) = env_var("MOCKOIDC_LOGGING_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_var("MOCKOIDC_LOGGING_FORMAT") {
            self.logging.format = format;
        }
        if let Some(size) = env_parse("MOCKOIDC_LOGGING_BUFFER_SIZE") {
            self.logging.buffer_size = size;
        }
    }

    /// Atomically write the configuration as YAML (temp file plus rename).
    ///
    /// # Errors
    /// Returns an error if serialization or the filesystem operations fail.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let data = serde_yaml::to_string(self)?;

        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, data)?;
        if let Err(err) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    /// Replace the configured users and clients with a sorted snapshot of
    /// the live store, for operator tooling that persists edits.
    pub fn sync_from_store(&mut self, store: &Store) {
        let mut users = store.list_users();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        self.users = users;

        let mut clients = store.list_clients();
        clients.sort_by(|a, b| a.id.cmp(&b.id));
        self.clients = clients;
    }

    /// One-line startup summary for the log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "host={} port={} clients={} users={} introspection={} revocation={}",
            self.server.host,
            self.server.port,
            self.clients.len(),
            self.users.len(),
            self.introspection.enabled,
            self.revocation.enabled,
        )
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name)?.parse().ok()
}

fn env_duration(name: &str) -> Option<Duration> {
    humantime::parse_duration(&env_var(name)?).ok()
}

fn env_list(name: &str) -> Option<Vec<String>> {
    Some(
        env_var(name)?
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}
