// ABOUTME: Aggregate of the long-lived server singletons shared with every handler
// ABOUTME: Constructed once at startup and passed by Arc into the router state
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use std::sync::Arc;

use crate::chaos::ChaosFlags;
use crate::config::Config;
use crate::keys::RsaKeyMaterial;
use crate::loghub::LogHub;
use crate::store::Store;
use crate::token::TokenEngine;

/// Everything a request handler needs, created once at startup.
///
/// Each component synchronises internally; handlers never reach into
/// another component's private state.
pub struct ServerResources {
    pub config: Config,
    /// Fully derived issuer URL (no trailing slash)
    pub issuer: String,
    pub store: Arc<Store>,
    pub log_hub: Arc<LogHub>,
    pub chaos: Arc<ChaosFlags>,
    pub key: Arc<RsaKeyMaterial>,
    pub token_engine: Arc<TokenEngine>,
}

impl ServerResources {
    #[must_use]
    pub fn new(
        config: Config,
        issuer: String,
        store: Arc<Store>,
        log_hub: Arc<LogHub>,
        chaos: Arc<ChaosFlags>,
        key: Arc<RsaKeyMaterial>,
        token_engine: Arc<TokenEngine>,
    ) -> Self {
        Self {
            config,
            issuer,
            store,
            log_hub,
            chaos,
            key,
            token_engine,
        }
    }
}
