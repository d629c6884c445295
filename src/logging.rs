// ABOUTME: Structured logging setup built on tracing-subscriber
// ABOUTME: Level from config with RUST_LOG override; json, pretty, or compact output
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Initialise the global subscriber once at startup.
///
/// `RUST_LOG` wins over the configured level so operators can crank
/// verbosity without touching the config file.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(section: &LoggingSection) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(section.level.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match section.format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    }
    .map_err(|e| anyhow!("install tracing subscriber: {e}"))
}
