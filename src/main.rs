// ABOUTME: CLI binary: serve subcommand with flag overrides, plus version
// ABOUTME: Loads YAML config when given, applies flags, and runs the server
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use mock_oidc_server::config::Config;
use mock_oidc_server::{logging, server};

#[derive(Parser)]
#[command(name = "mock-oidc-server")]
#[command(about = "Mock OAuth2/OIDC authorization server for development and testing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the authorization server
    Serve(ServeArgs),
    /// Print the version and exit
    Version,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Explicit issuer URL; derived from host and port when omitted
    #[arg(long)]
    issuer: Option<String>,

    /// Path to a YAML config file for pre-loading clients and users
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of recent request log entries to keep
    #[arg(long)]
    log_buffer: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => Config::defaults(),
    };

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(issuer) = args.issuer {
        config.oauth.issuer = issuer;
    }
    if let Some(log_buffer) = args.log_buffer {
        config.logging.buffer_size = log_buffer;
    }

    logging::init(&config.logging)?;
    if let Some(path) = &args.config {
        info!(path = %path.display(), "configuration loaded");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting mock-oidc-server"
    );

    server::run(config).await
}
